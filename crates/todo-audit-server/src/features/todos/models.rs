//! Todo entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hooks::{EntityMetadata, TrackedEntity};

/// A single Todo as stored in the primary database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl TrackedEntity for Todo {
    const METADATA: EntityMetadata = EntityMetadata {
        name: "Todo",
        primary_columns: &["id"],
    };
}

/// Fields supplied when creating a Todo. New Todos always start incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Merge onto `current`, returning the new image.
    pub fn apply(&self, current: &Todo) -> Todo {
        Todo {
            id: current.id,
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            completed: self.completed.unwrap_or(current.completed),
            created_at: current.created_at,
        }
    }
}
