//! Todo Audit Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the todo audit workspace members:
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//!
//! # Example
//!
//! ```no_run
//! use todo_audit_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> todo_audit_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
