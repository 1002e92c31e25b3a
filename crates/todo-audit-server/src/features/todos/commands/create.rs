//! Create todo command

use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::features::shared::validation::{
    validate_description, validate_title, DescriptionValidationError, TitleValidationError,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use crate::features::todos::models::{NewTodo, Todo};
use crate::features::todos::repository::{TodoRepository, TodoStoreError};

/// Command to create a Todo
///
/// ```json
/// { "title": "Buy milk", "description": "2 litres" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoCommand {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateTodoError {
    #[error(transparent)]
    Title(#[from] TitleValidationError),
    #[error(transparent)]
    Description(#[from] DescriptionValidationError),
    #[error("Storage error: {0}")]
    Store(#[from] TodoStoreError),
}

impl CreateTodoCommand {
    pub fn validate(&self) -> Result<(), CreateTodoError> {
        validate_title(&self.title, MAX_TITLE_LENGTH)?;
        if let Some(ref description) = self.description {
            validate_description(description, MAX_DESCRIPTION_LENGTH)?;
        }
        Ok(())
    }
}

/// Validates and inserts a new Todo. The title is stored trimmed; new Todos start incomplete.
#[tracing::instrument(skip(repo, ctx), fields(request_id = %ctx.request_id()))]
pub async fn handle(
    repo: &dyn TodoRepository,
    ctx: &RequestContext,
    command: CreateTodoCommand,
) -> Result<Todo, CreateTodoError> {
    command.validate()?;

    let todo = repo
        .create(
            ctx,
            NewTodo {
                title: command.title.trim().to_string(),
                description: command.description,
            },
        )
        .await?;

    tracing::debug!(todo_id = %todo.id, "Todo created");
    Ok(todo)
}
