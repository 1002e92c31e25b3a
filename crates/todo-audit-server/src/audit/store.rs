//! Audit store backends
//!
//! The audit trail lives apart from the primary store. [`AuditStore`] is append-only:
//! it can insert and find, never update or delete.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{AuditAction, AuditFilter, AuditLogEntry};

#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored audit row is malformed: {0}")]
    Malformed(String),

    #[error("Audit store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only storage for audit entries
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist one entry as a single insert.
    async fn insert_one(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError>;

    /// Entries matching `filter`, newest first, at most `limit`.
    async fn find(
        &self,
        filter: AuditFilter,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// Audit store on its own PostgreSQL database, snapshots kept as JSONB
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    before_state: Option<JsonValue>,
    after_state: Option<JsonValue>,
    acting_user_id: Option<String>,
    timestamp: DateTime<Utc>,
    metadata: Option<JsonValue>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = AuditStoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action: AuditAction = row.action.parse().map_err(AuditStoreError::Malformed)?;
        Ok(AuditLogEntry {
            action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            before_state: row.before_state,
            after_state: row.after_state,
            acting_user_id: row.acting_user_id,
            timestamp: row.timestamp,
            metadata: row.metadata,
        })
    }
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `audit_logs` table and its indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), AuditStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id BIGSERIAL PRIMARY KEY,
                action TEXT NOT NULL CHECK (action IN ('create', 'update', 'remove')),
                entity_type TEXT NOT NULL,
                entity_id TEXT,
                before_state JSONB,
                after_state JSONB,
                acting_user_id TEXT,
                timestamp TIMESTAMPTZ NOT NULL,
                metadata JSONB
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS audit_logs_timestamp_idx ON audit_logs (timestamp DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS audit_logs_entity_type_idx
            ON audit_logs (entity_type, timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Audit schema ready");
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert_one(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                action, entity_type, entity_id, before_state, after_state,
                acting_user_id, timestamp, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.action.as_str())
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.before_state)
        .bind(&entry.after_state)
        .bind(&entry.acting_user_id)
        .bind(entry.timestamp)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(
        &self,
        filter: AuditFilter,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT action, entity_type, entity_id, before_state, after_state,
                   acting_user_id, timestamp, metadata
            FROM audit_logs
            WHERE ($1::TEXT IS NULL OR entity_type = $1)
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(filter.entity_type.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local audit store
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditStore {
    entries: Arc<RwLock<Vec<AuditLogEntry>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Every entry in insertion order.
    pub async fn snapshot(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert_one(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn find(
        &self,
        filter: AuditFilter,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        let entries = self.entries.read().await;
        let mut matched: Vec<(usize, &AuditLogEntry)> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| filter.matches(entry))
            .collect();

        // Newest first; later inserts win timestamp ties.
        matched.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));

        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
