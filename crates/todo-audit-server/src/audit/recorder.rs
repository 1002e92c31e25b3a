//! Audit recorder
//!
//! Turns a [`NewAuditEntry`] into a persisted [`AuditLogEntry`]: resolves the acting user,
//! stamps the time, inserts once. Failures are returned to the caller; deciding whether
//! they matter is the caller's job.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::models::{AuditAction, AuditLogEntry, NewAuditEntry};
use super::store::{AuditStore, AuditStoreError};
use crate::context::RequestContext;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to write audit entry: {0}")]
    WriteFailure(#[source] AuditStoreError),

    #[error("Failed to read audit entries: {0}")]
    QueryFailure(#[source] AuditStoreError),
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Persist one audit entry for `ctx`.
    ///
    /// The acting user is the explicit `user_id` on the entry if present, otherwise the
    /// identity bound to `ctx`, otherwise none.
    #[tracing::instrument(
        skip(self, ctx, entry),
        fields(
            action = %entry.action,
            entity = %entry.entity_type,
            entity_id = ?entry.entity_id,
            request_id = %ctx.request_id()
        )
    )]
    pub async fn record(
        &self,
        ctx: &RequestContext,
        entry: NewAuditEntry,
    ) -> Result<AuditLogEntry, AuditError> {
        let acting_user_id = entry
            .user_id
            .or_else(|| ctx.current().map(|identity| identity.id.clone()));

        let log = AuditLogEntry {
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            before_state: entry.before,
            after_state: entry.after,
            acting_user_id,
            timestamp: Utc::now(),
            metadata: entry.metadata,
        };

        debug!(user_id = ?log.acting_user_id, "Recording audit entry");

        self.store
            .insert_one(log.clone())
            .await
            .map_err(AuditError::WriteFailure)?;

        info!(
            action = %log.action,
            entity = %log.entity_type,
            entity_id = ?log.entity_id,
            user_id = ?log.acting_user_id,
            "Audit entry recorded"
        );

        Ok(log)
    }

    pub async fn record_create(
        &self,
        ctx: &RequestContext,
        entity_type: &str,
        entity_id: Option<String>,
        after: Option<JsonValue>,
    ) -> Result<AuditLogEntry, AuditError> {
        self.record(ctx, observation(AuditAction::Create, entity_type, entity_id, None, after))
            .await
    }

    pub async fn record_update(
        &self,
        ctx: &RequestContext,
        entity_type: &str,
        entity_id: Option<String>,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
    ) -> Result<AuditLogEntry, AuditError> {
        self.record(ctx, observation(AuditAction::Update, entity_type, entity_id, before, after))
            .await
    }

    pub async fn record_remove(
        &self,
        ctx: &RequestContext,
        entity_type: &str,
        entity_id: Option<String>,
        before: Option<JsonValue>,
    ) -> Result<AuditLogEntry, AuditError> {
        self.record(ctx, observation(AuditAction::Remove, entity_type, entity_id, before, None))
            .await
    }
}

fn observation(
    action: AuditAction,
    entity_type: &str,
    entity_id: Option<String>,
    before: Option<JsonValue>,
    after: Option<JsonValue>,
) -> NewAuditEntry {
    NewAuditEntry {
        action,
        entity_type: entity_type.to_string(),
        entity_id,
        before,
        after,
        user_id: None,
        metadata: None,
    }
}
