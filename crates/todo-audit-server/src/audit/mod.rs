//! Audit trail
//!
//! Every committed mutation of a tracked entity reaches [`AuditSubscriber`] through the
//! mutation hooks, which hands it to [`AuditRecorder`]. The recorder resolves the acting
//! user from the [`RequestContext`](crate::context::RequestContext), stamps the time and
//! writes one [`AuditLogEntry`] to the [`AuditStore`]. The store is separate from the one
//! holding Todos and is append-only.
//!
//! Audit write failures stop at the subscriber: they are logged, never returned to the
//! operation that triggered them.

pub mod models;
pub mod queries;
pub mod recorder;
pub mod routes;
pub mod store;
pub mod subscriber;

pub use models::{AuditAction, AuditFilter, AuditLogEntry, NewAuditEntry};
pub use queries::AuditQueryService;
pub use recorder::{AuditError, AuditRecorder};
pub use store::{AuditStore, AuditStoreError, MemoryAuditStore, PgAuditStore};
pub use subscriber::AuditSubscriber;
