//! Todo CRUD service with an automatic, append-only audit trail
//!
//! Mutations go through a [`features::todos::TodoRepository`], which notifies the
//! [`hooks::MutationHooks`] after each commit. The [`audit::AuditSubscriber`] registered on
//! those hooks records one [`audit::AuditLogEntry`] per mutation in a separate store,
//! attributed to the identity carried by the [`context::RequestContext`].

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod app;
pub mod audit;
pub mod config;
pub mod context;
pub mod db;
pub mod features;
pub mod hooks;
pub mod middleware;

pub use app::{build_router, build_router_with_identity, AppState};
pub use config::Config;
pub use context::{RequestContext, RequestIdentity};
