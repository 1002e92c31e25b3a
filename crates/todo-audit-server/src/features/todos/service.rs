//! Todo service
//!
//! Thin composition of the Todo commands and queries over one repository. Mutating
//! operations take the caller's [`RequestContext`] so the mutation hooks can attribute
//! the change.

use std::sync::Arc;

use uuid::Uuid;

use super::commands::{
    self, CreateTodoCommand, CreateTodoError, DeleteTodoCommand, DeleteTodoError,
    UpdateTodoCommand, UpdateTodoError,
};
use super::models::Todo;
use super::queries::{self, GetTodoError, GetTodoQuery, ListTodosError, ListTodosQuery};
use super::repository::TodoRepository;
use crate::context::RequestContext;

#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> Result<Vec<Todo>, ListTodosError> {
        queries::list::handle(self.repo.as_ref(), ListTodosQuery::default()).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Todo, GetTodoError> {
        queries::get::handle(self.repo.as_ref(), GetTodoQuery { id }).await
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        command: CreateTodoCommand,
    ) -> Result<Todo, CreateTodoError> {
        commands::create::handle(self.repo.as_ref(), ctx, command).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        mut command: UpdateTodoCommand,
    ) -> Result<Todo, UpdateTodoError> {
        command.id = id;
        commands::update::handle(self.repo.as_ref(), ctx, command).await
    }

    pub async fn remove(&self, ctx: &RequestContext, id: Uuid) -> Result<(), DeleteTodoError> {
        commands::delete::handle(self.repo.as_ref(), ctx, DeleteTodoCommand { id }).await?;
        Ok(())
    }
}
