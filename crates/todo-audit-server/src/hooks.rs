//! Post-commit mutation hooks
//!
//! Repositories for the primary store call into [`MutationHooks`] after an insert, update
//! or remove has been committed. Subscribers registered at startup receive a
//! [`MutationEvent`] carrying the entity type name and JSON snapshots of the entity
//! before and after the change. Business code never calls subscribers directly.
//!
//! Subscribers own their failures: the trait methods return `()`, and a hook that fails
//! must log and move on, because the triggering write is already durable.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, trace};

use crate::context::RequestContext;

/// Separator between primary key values in a composite entity id.
pub const ENTITY_ID_SEPARATOR: &str = ":";

/// Static description of a tracked entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Type name recorded in audit entries, e.g. `"Todo"`.
    pub name: &'static str,
    /// Snapshot keys that together form the primary key, in order.
    pub primary_columns: &'static [&'static str],
}

impl EntityMetadata {
    /// Composite id read from a snapshot, `None` if any key column is missing or null.
    pub fn entity_id(&self, snapshot: &JsonValue) -> Option<String> {
        if self.primary_columns.is_empty() {
            return None;
        }

        let object = snapshot.as_object()?;
        let parts = self
            .primary_columns
            .iter()
            .map(|column| match object.get(*column)? {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect::<Option<Vec<_>>>()?;

        Some(parts.join(ENTITY_ID_SEPARATOR))
    }
}

/// An entity whose mutations are observed by [`MutationHooks`]
pub trait TrackedEntity: Serialize + Send + Sync {
    const METADATA: EntityMetadata;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Remove,
}

/// One committed mutation, type-erased to JSON snapshots
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub kind: MutationKind,
    pub metadata: EntityMetadata,
    /// State after the mutation (insert, update).
    pub entity: Option<JsonValue>,
    /// Persisted state before the mutation (update, remove).
    pub database_entity: Option<JsonValue>,
}

impl MutationEvent {
    pub fn entity_name(&self) -> &'static str {
        self.metadata.name
    }

    /// Composite id of the mutated entity.
    ///
    /// Updates prefer the post-update image and fall back to the prior image only when
    /// the post-update image is unavailable.
    pub fn entity_id(&self) -> Option<String> {
        let source = match self.kind {
            MutationKind::Insert => self.entity.as_ref(),
            MutationKind::Update => self.entity.as_ref().or(self.database_entity.as_ref()),
            MutationKind::Remove => self.database_entity.as_ref(),
        }?;
        self.metadata.entity_id(source)
    }
}

/// Observer of committed mutations
#[async_trait]
pub trait MutationSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// Entity types this subscriber wants. Defaults to every type.
    fn listens_to(&self, _metadata: &EntityMetadata) -> bool {
        true
    }

    async fn after_insert(&self, ctx: &RequestContext, event: &MutationEvent);

    async fn after_update(&self, ctx: &RequestContext, event: &MutationEvent);

    async fn after_remove(&self, ctx: &RequestContext, event: &MutationEvent);
}

/// Subscriber registry shared by the primary store repositories
#[derive(Clone, Default)]
pub struct MutationHooks {
    subscribers: Vec<Arc<dyn MutationSubscriber>>,
}

impl std::fmt::Debug for MutationHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.subscribers.iter().map(|s| s.name()))
            .finish()
    }
}

impl MutationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Call during startup, before handing the hooks to repositories.
    pub fn subscribe(&mut self, subscriber: Arc<dyn MutationSubscriber>) -> &mut Self {
        tracing::info!(subscriber = subscriber.name(), "Registered mutation subscriber");
        self.subscribers.push(subscriber);
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn MutationSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub async fn after_insert<E: TrackedEntity>(&self, ctx: &RequestContext, entity: &E) {
        if self.is_empty() {
            return;
        }
        match snapshot(entity) {
            Ok(after) => {
                let event = MutationEvent {
                    kind: MutationKind::Insert,
                    metadata: E::METADATA,
                    entity: Some(after),
                    database_entity: None,
                };
                self.dispatch(ctx, &event).await;
            },
            Err(e) => snapshot_failed(E::METADATA, MutationKind::Insert, &e),
        }
    }

    pub async fn after_update<E: TrackedEntity>(
        &self,
        ctx: &RequestContext,
        entity: Option<&E>,
        database_entity: Option<&E>,
    ) {
        if self.is_empty() {
            return;
        }
        let snapshots = entity
            .map(snapshot)
            .transpose()
            .and_then(|after| Ok((after, database_entity.map(snapshot).transpose()?)));

        match snapshots {
            Ok((after, before)) => {
                let event = MutationEvent {
                    kind: MutationKind::Update,
                    metadata: E::METADATA,
                    entity: after,
                    database_entity: before,
                };
                self.dispatch(ctx, &event).await;
            },
            Err(e) => snapshot_failed(E::METADATA, MutationKind::Update, &e),
        }
    }

    pub async fn after_remove<E: TrackedEntity>(
        &self,
        ctx: &RequestContext,
        database_entity: Option<&E>,
    ) {
        if self.is_empty() {
            return;
        }
        match database_entity.map(snapshot).transpose() {
            Ok(before) => {
                let event = MutationEvent {
                    kind: MutationKind::Remove,
                    metadata: E::METADATA,
                    entity: None,
                    database_entity: before,
                };
                self.dispatch(ctx, &event).await;
            },
            Err(e) => snapshot_failed(E::METADATA, MutationKind::Remove, &e),
        }
    }

    async fn dispatch(&self, ctx: &RequestContext, event: &MutationEvent) {
        for subscriber in self
            .subscribers
            .iter()
            .filter(|s| s.listens_to(&event.metadata))
        {
            trace!(
                subscriber = subscriber.name(),
                entity = event.entity_name(),
                kind = ?event.kind,
                "Dispatching mutation event"
            );
            match event.kind {
                MutationKind::Insert => subscriber.after_insert(ctx, event).await,
                MutationKind::Update => subscriber.after_update(ctx, event).await,
                MutationKind::Remove => subscriber.after_remove(ctx, event).await,
            }
        }
    }
}

fn snapshot<E: Serialize>(entity: &E) -> Result<JsonValue, serde_json::Error> {
    serde_json::to_value(entity)
}

fn snapshot_failed(metadata: EntityMetadata, kind: MutationKind, err: &serde_json::Error) {
    error!(
        entity = metadata.name,
        kind = ?kind,
        error = %err,
        "Failed to snapshot entity for mutation hooks; event dropped"
    );
}
