//! Delete todo command

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::features::todos::models::Todo;
use crate::features::todos::repository::{TodoRepository, TodoStoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTodoCommand {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteTodoError {
    #[error("Todo '{0}' not found")]
    NotFound(Uuid),
    #[error("Storage error: {0}")]
    Store(#[from] TodoStoreError),
}

/// Removes the Todo and returns its last persisted state.
#[tracing::instrument(skip(repo, ctx), fields(request_id = %ctx.request_id()))]
pub async fn handle(
    repo: &dyn TodoRepository,
    ctx: &RequestContext,
    command: DeleteTodoCommand,
) -> Result<Todo, DeleteTodoError> {
    let removed = repo
        .remove(ctx, command.id)
        .await?
        .ok_or(DeleteTodoError::NotFound(command.id))?;

    tracing::debug!(todo_id = %removed.id, "Todo deleted");
    Ok(removed)
}
