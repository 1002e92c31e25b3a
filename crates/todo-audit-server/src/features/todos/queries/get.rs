use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::todos::models::Todo;
use crate::features::todos::repository::{TodoRepository, TodoStoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTodoQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetTodoError {
    #[error("Todo '{0}' not found")]
    NotFound(Uuid),
    #[error("Storage error: {0}")]
    Store(#[from] TodoStoreError),
}

#[tracing::instrument(skip(repo))]
pub async fn handle(repo: &dyn TodoRepository, query: GetTodoQuery) -> Result<Todo, GetTodoError> {
    repo.find_by_id(query.id)
        .await?
        .ok_or(GetTodoError::NotFound(query.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::todos::repository::MemoryTodoRepository;

    #[tokio::test]
    async fn test_missing_todo_is_not_found() {
        let repo = MemoryTodoRepository::default();
        let id = Uuid::new_v4();
        let result = handle(&repo, GetTodoQuery { id }).await;
        assert!(matches!(result, Err(GetTodoError::NotFound(missing)) if missing == id));
    }
}
