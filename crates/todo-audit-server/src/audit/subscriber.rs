//! Mutation subscriber that feeds the audit recorder
//!
//! Registered once at startup; listens to every tracked entity type.

use async_trait::async_trait;
use tracing::error;

use super::recorder::{AuditError, AuditRecorder};
use crate::context::RequestContext;
use crate::hooks::{MutationEvent, MutationKind, MutationSubscriber};

pub struct AuditSubscriber {
    recorder: AuditRecorder,
}

impl AuditSubscriber {
    pub fn new(recorder: AuditRecorder) -> Self {
        Self { recorder }
    }

    async fn forward(&self, ctx: &RequestContext, event: &MutationEvent) -> Result<(), AuditError> {
        let entity = event.entity_name();
        let entity_id = event.entity_id();

        match event.kind {
            MutationKind::Insert => {
                self.recorder
                    .record_create(ctx, entity, entity_id, event.entity.clone())
                    .await?;
            },
            MutationKind::Update => {
                self.recorder
                    .record_update(
                        ctx,
                        entity,
                        entity_id,
                        event.database_entity.clone(),
                        event.entity.clone(),
                    )
                    .await?;
            },
            MutationKind::Remove => {
                self.recorder
                    .record_remove(ctx, entity, entity_id, event.database_entity.clone())
                    .await?;
            },
        }
        Ok(())
    }

    /// The mutation is already committed: an audit failure is logged and dropped here.
    async fn forward_or_log(&self, ctx: &RequestContext, event: &MutationEvent) {
        if let Err(e) = self.forward(ctx, event).await {
            error!(
                error = %e,
                entity = event.entity_name(),
                kind = ?event.kind,
                request_id = %ctx.request_id(),
                "Audit write failed; mutation left in place"
            );
        }
    }
}

#[async_trait]
impl MutationSubscriber for AuditSubscriber {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn after_insert(&self, ctx: &RequestContext, event: &MutationEvent) {
        self.forward_or_log(ctx, event).await;
    }

    async fn after_update(&self, ctx: &RequestContext, event: &MutationEvent) {
        self.forward_or_log(ctx, event).await;
    }

    async fn after_remove(&self, ctx: &RequestContext, event: &MutationEvent) {
        self.forward_or_log(ctx, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::{AuditAction, AuditFilter, AuditLogEntry};
    use crate::audit::store::{AuditStore, AuditStoreError, MemoryAuditStore};
    use crate::hooks::EntityMetadata;
    use serde_json::json;
    use std::sync::Arc;

    const NOTE: EntityMetadata = EntityMetadata {
        name: "Note",
        primary_columns: &["id"],
    };

    fn subscriber(store: Arc<dyn AuditStore>) -> AuditSubscriber {
        AuditSubscriber::new(AuditRecorder::new(store))
    }

    #[tokio::test]
    async fn test_update_event_maps_before_and_after() {
        let store = MemoryAuditStore::new();
        let sub = subscriber(Arc::new(store.clone()));
        let event = MutationEvent {
            kind: MutationKind::Update,
            metadata: NOTE,
            entity: Some(json!({"id": "n1", "body": "new"})),
            database_entity: Some(json!({"id": "n1", "body": "old"})),
        };

        sub.after_update(&RequestContext::anonymous(), &event).await;

        let entries = store.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[0].entity_type, "Note");
        assert_eq!(entries[0].entity_id.as_deref(), Some("n1"));
        assert_eq!(entries[0].before_state, Some(json!({"id": "n1", "body": "old"})));
        assert_eq!(entries[0].after_state, Some(json!({"id": "n1", "body": "new"})));
    }

    #[tokio::test]
    async fn test_remove_event_has_no_after_state() {
        let store = MemoryAuditStore::new();
        let sub = subscriber(Arc::new(store.clone()));
        let event = MutationEvent {
            kind: MutationKind::Remove,
            metadata: NOTE,
            entity: None,
            database_entity: Some(json!({"id": "n2"})),
        };

        sub.after_remove(&RequestContext::anonymous(), &event).await;

        let entries = store.snapshot().await;
        assert_eq!(entries[0].action, AuditAction::Remove);
        assert!(entries[0].after_state.is_none());
        assert_eq!(entries[0].entity_id.as_deref(), Some("n2"));
    }

    struct Rejecting;

    #[async_trait]
    impl AuditStore for Rejecting {
        async fn insert_one(&self, _entry: AuditLogEntry) -> Result<(), AuditStoreError> {
            Err(AuditStoreError::Unavailable("rejected".into()))
        }

        async fn find(
            &self,
            _filter: AuditFilter,
            _limit: i64,
        ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let sub = subscriber(Arc::new(Rejecting));
        let event = MutationEvent {
            kind: MutationKind::Insert,
            metadata: NOTE,
            entity: Some(json!({"id": "n3"})),
            database_entity: None,
        };

        sub.after_insert(&RequestContext::anonymous(), &event).await;
        assert!(sub.forward(&RequestContext::anonymous(), &event).await.is_err());
    }
}
