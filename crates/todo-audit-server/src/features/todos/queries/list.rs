use serde::{Deserialize, Serialize};

use crate::features::todos::models::Todo;
use crate::features::todos::repository::{TodoRepository, TodoStoreError};

/// List every Todo, newest first. No filters or paging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTodosQuery {}

#[derive(Debug, thiserror::Error)]
pub enum ListTodosError {
    #[error("Storage error: {0}")]
    Store(#[from] TodoStoreError),
}

#[tracing::instrument(skip(repo))]
pub async fn handle(
    repo: &dyn TodoRepository,
    _query: ListTodosQuery,
) -> Result<Vec<Todo>, ListTodosError> {
    let todos = repo.find_all().await?;
    tracing::debug!(count = todos.len(), "Listed todos");
    Ok(todos)
}
