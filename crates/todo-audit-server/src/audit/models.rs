//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned per query
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;

/// Maximum number of audit entries that can be returned in a single query.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// Normalize a caller-supplied limit: non-positive becomes the default, large values are capped.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(n) if n > 0 => n.min(MAX_AUDIT_QUERY_LIMIT),
        _ => DEFAULT_AUDIT_QUERY_LIMIT,
    }
}

/// Kind of mutation an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Remove,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            other => Err(format!("unknown audit action '{}'", other)),
        }
    }
}

/// One immutable row of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub action: AuditAction,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_state: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_state: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

/// Store-side filter for audit lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
}

impl AuditFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn entity(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
        }
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.entity_type
            .as_deref()
            .map_or(true, |wanted| entry.entity_type == wanted)
    }
}

/// A mutation observation before the recorder stamps user and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
    /// Overrides the identity bound to the request context when set.
    pub user_id: Option<String>,
    pub metadata: Option<JsonValue>,
}

impl NewAuditEntry {
    pub fn builder() -> NewAuditEntryBuilder {
        NewAuditEntryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewAuditEntryBuilder {
    action: Option<AuditAction>,
    entity_type: Option<String>,
    entity_id: Option<String>,
    before: Option<JsonValue>,
    after: Option<JsonValue>,
    user_id: Option<String>,
    metadata: Option<JsonValue>,
}

impl NewAuditEntryBuilder {
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn entity_id(mut self, entity_id: Option<String>) -> Self {
        self.entity_id = entity_id;
        self
    }

    pub fn before(mut self, before: Option<JsonValue>) -> Self {
        self.before = before;
        self
    }

    pub fn after(mut self, after: Option<JsonValue>) -> Self {
        self.after = after;
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Fails if action or entity type were not set.
    pub fn try_build(self) -> Result<NewAuditEntry, &'static str> {
        let action = self.action.ok_or("action is required")?;
        let entity_type = self.entity_type.ok_or("entity_type is required")?;

        Ok(NewAuditEntry {
            action,
            entity_type,
            entity_id: self.entity_id,
            before: self.before,
            after: self.after,
            user_id: self.user_id,
            metadata: self.metadata,
        })
    }
}
