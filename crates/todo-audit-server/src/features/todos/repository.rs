//! Todo persistence
//!
//! Both backends fire [`MutationHooks`] only after the mutation is durable: after the
//! transaction commits for PostgreSQL, after the write lock is released in memory. Hook
//! dispatch is awaited before the method returns, so subscribers observe the mutation
//! before the caller sees the result.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::models::{NewTodo, Todo, TodoChanges};
use crate::context::RequestContext;
use crate::hooks::MutationHooks;

#[derive(Debug, thiserror::Error)]
pub enum TodoStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Primary store for Todos
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Every Todo, newest first.
    async fn find_all(&self) -> Result<Vec<Todo>, TodoStoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, TodoStoreError>;

    async fn create(&self, ctx: &RequestContext, todo: NewTodo) -> Result<Todo, TodoStoreError>;

    /// Merge `changes` into the stored Todo. `None` if no Todo has this id.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, TodoStoreError>;

    /// Delete and return the removed Todo. `None` if no Todo has this id.
    async fn remove(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<Todo>, TodoStoreError>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

const TODO_COLUMNS: &str = "id, title, description, completed, created_at";

#[derive(Debug, Clone)]
pub struct PgTodoRepository {
    pool: PgPool,
    hooks: MutationHooks,
}

impl PgTodoRepository {
    pub fn new(pool: PgPool, hooks: MutationHooks) -> Self {
        Self { pool, hooks }
    }

    /// Create the `todos` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), TodoStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id UUID PRIMARY KEY,
                title VARCHAR(256) NOT NULL,
                description TEXT,
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Todo schema ready");
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn find_all(&self) -> Result<Vec<Todo>, TodoStoreError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, TodoStoreError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn create(&self, ctx: &RequestContext, todo: NewTodo) -> Result<Todo, TodoStoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos (id, title, description, completed, created_at)
            VALUES ($1, $2, $3, FALSE, NOW())
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&todo.title)
        .bind(&todo.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.hooks.after_insert(ctx, &created).await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, TodoStoreError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let merged = changes.apply(&existing);
        let updated = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET title = $2, description = $3, completed = $4
            WHERE id = $1
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(merged.completed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.hooks
            .after_update(ctx, Some(&updated), Some(&existing))
            .await;
        Ok(Some(updated))
    }

    async fn remove(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<Todo>, TodoStoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(ref removed) = removed {
            self.hooks.after_remove(ctx, Some(removed)).await;
        }
        Ok(removed)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local Todo store
#[derive(Debug, Clone, Default)]
pub struct MemoryTodoRepository {
    todos: Arc<RwLock<HashMap<Uuid, Todo>>>,
    hooks: MutationHooks,
}

impl MemoryTodoRepository {
    pub fn new(hooks: MutationHooks) -> Self {
        Self {
            todos: Arc::default(),
            hooks,
        }
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn find_all(&self) -> Result<Vec<Todo>, TodoStoreError> {
        let mut todos: Vec<Todo> = self.todos.read().await.values().cloned().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, TodoStoreError> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn create(&self, ctx: &RequestContext, todo: NewTodo) -> Result<Todo, TodoStoreError> {
        let created = Todo {
            id: Uuid::new_v4(),
            title: todo.title,
            description: todo.description,
            completed: false,
            created_at: Utc::now(),
        };
        self.todos.write().await.insert(created.id, created.clone());

        self.hooks.after_insert(ctx, &created).await;
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, TodoStoreError> {
        let (existing, updated) = {
            let mut todos = self.todos.write().await;
            let Some(slot) = todos.get_mut(&id) else {
                return Ok(None);
            };
            let updated = changes.apply(slot);
            (std::mem::replace(slot, updated.clone()), updated)
        };

        self.hooks
            .after_update(ctx, Some(&updated), Some(&existing))
            .await;
        Ok(Some(updated))
    }

    async fn remove(&self, ctx: &RequestContext, id: Uuid) -> Result<Option<Todo>, TodoStoreError> {
        let removed = self.todos.write().await.remove(&id);

        if let Some(ref removed) = removed {
            self.hooks.after_remove(ctx, Some(removed)).await;
        }
        Ok(removed)
    }
}
