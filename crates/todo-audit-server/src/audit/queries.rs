//! Read side of the audit trail

use std::sync::Arc;

use tracing::debug;

use super::models::{clamp_limit, AuditFilter, AuditLogEntry};
use super::recorder::AuditError;
use super::store::AuditStore;

/// Recency and per-entity lookups over the audit store
#[derive(Clone)]
pub struct AuditQueryService {
    store: Arc<dyn AuditStore>,
}

impl AuditQueryService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Most recent entries first. `None` or a non-positive limit means the default of 100.
    pub async fn get_all(&self, limit: Option<i64>) -> Result<Vec<AuditLogEntry>, AuditError> {
        let limit = clamp_limit(limit);
        let entries = self
            .store
            .find(AuditFilter::all(), limit)
            .await
            .map_err(AuditError::QueryFailure)?;

        debug!(limit, count = entries.len(), "Queried audit log");
        Ok(entries)
    }

    /// Most recent entries for one entity type.
    pub async fn get_by_entity(
        &self,
        entity_type: &str,
        limit: Option<i64>,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let limit = clamp_limit(limit);
        let entries = self
            .store
            .find(AuditFilter::entity(entity_type), limit)
            .await
            .map_err(AuditError::QueryFailure)?;

        debug!(
            entity = entity_type,
            limit,
            count = entries.len(),
            "Queried audit log by entity"
        );
        Ok(entries)
    }
}
