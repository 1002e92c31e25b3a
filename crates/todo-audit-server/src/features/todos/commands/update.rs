//! Update todo command
//!
//! Partially updates an existing Todo. Only the fields that are provided are changed.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::features::shared::validation::{
    validate_description, validate_title, DescriptionValidationError, TitleValidationError,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use crate::features::todos::models::{Todo, TodoChanges};
use crate::features::todos::repository::{TodoRepository, TodoStoreError};

/// Absent field -> `None`, explicit `null` -> `Some(None)`, value -> `Some(Some(v))`
fn deserialize_optional_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Command to update an existing Todo
///
/// `id` comes from the request path, never from the body. A `null`
/// description clears the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoCommand {
    #[serde(skip)]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateTodoError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error(transparent)]
    Title(#[from] TitleValidationError),
    #[error(transparent)]
    Description(#[from] DescriptionValidationError),
    #[error("Todo '{0}' not found")]
    NotFound(Uuid),
    #[error("Storage error: {0}")]
    Store(#[from] TodoStoreError),
}

impl UpdateTodoCommand {
    pub fn validate(&self) -> Result<(), UpdateTodoError> {
        if self.title.is_none() && self.description.is_none() && self.completed.is_none() {
            return Err(UpdateTodoError::NoFieldsToUpdate);
        }
        if let Some(ref title) = self.title {
            validate_title(title, MAX_TITLE_LENGTH)?;
        }
        if let Some(Some(ref description)) = self.description {
            validate_description(description, MAX_DESCRIPTION_LENGTH)?;
        }
        Ok(())
    }

    fn into_changes(self) -> TodoChanges {
        TodoChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            completed: self.completed,
        }
    }
}

/// # Errors
///
/// - Validation errors if the command is invalid
/// - `NotFound` - No Todo with this id; no mutation happens and nothing is audited
#[tracing::instrument(skip(repo, ctx), fields(request_id = %ctx.request_id()))]
pub async fn handle(
    repo: &dyn TodoRepository,
    ctx: &RequestContext,
    command: UpdateTodoCommand,
) -> Result<Todo, UpdateTodoError> {
    command.validate()?;

    let id = command.id;
    let updated = repo
        .update(ctx, id, command.into_changes())
        .await?
        .ok_or(UpdateTodoError::NotFound(id))?;

    tracing::debug!(todo_id = %updated.id, "Todo updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::todos::models::NewTodo;
    use crate::features::todos::repository::MemoryTodoRepository;

    #[test]
    fn test_validation_requires_a_field() {
        let cmd = UpdateTodoCommand::default();
        assert!(matches!(cmd.validate(), Err(UpdateTodoError::NoFieldsToUpdate)));
    }

    #[test]
    fn test_validation_checks_title() {
        let cmd = UpdateTodoCommand {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            cmd.validate(),
            Err(UpdateTodoError::Title(TitleValidationError::Required))
        ));
    }

    #[test]
    fn test_completed_alone_is_valid() {
        let cmd = UpdateTodoCommand {
            completed: Some(true),
            ..Default::default()
        };
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_body_cannot_set_id() {
        let cmd: UpdateTodoCommand =
            serde_json::from_str(r#"{"id":"7d3f0c9e-0000-0000-0000-000000000000","completed":true}"#)
                .unwrap();
        assert!(cmd.id.is_nil());
    }

    #[test]
    fn test_null_description_is_a_change() {
        let cmd: UpdateTodoCommand = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cmd.description, Some(None));
        assert!(cmd.validate().is_ok());

        let cmd: UpdateTodoCommand = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(cmd.description, None);
    }

    #[tokio::test]
    async fn test_handle_not_found() {
        let repo = MemoryTodoRepository::default();
        let id = Uuid::new_v4();
        let cmd = UpdateTodoCommand {
            id,
            completed: Some(true),
            ..Default::default()
        };
        let result = handle(&repo, &RequestContext::anonymous(), cmd).await;
        assert!(matches!(result, Err(UpdateTodoError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_handle_merges_fields() {
        let repo = MemoryTodoRepository::default();
        let ctx = RequestContext::anonymous();
        let created = repo
            .create(
                &ctx,
                NewTodo {
                    title: "old".to_string(),
                    description: Some("keep".to_string()),
                },
            )
            .await
            .unwrap();

        let cmd = UpdateTodoCommand {
            id: created.id,
            title: Some(" new ".to_string()),
            ..Default::default()
        };
        let updated = handle(&repo, &ctx, cmd).await.unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description.as_deref(), Some("keep"));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_handle_clears_description() {
        let repo = MemoryTodoRepository::default();
        let ctx = RequestContext::anonymous();
        let created = repo
            .create(
                &ctx,
                NewTodo {
                    title: "report".to_string(),
                    description: Some("old".to_string()),
                },
            )
            .await
            .unwrap();

        let mut cmd: UpdateTodoCommand = serde_json::from_str(r#"{"description":null}"#).unwrap();
        cmd.id = created.id;
        let updated = handle(&repo, &ctx, cmd).await.unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.title, "report");
    }
}
