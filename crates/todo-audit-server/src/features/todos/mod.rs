//! Todo feature slice
//!
//! - `commands/` - create, update, delete
//! - `queries/` - get, list
//! - `repository.rs` - PostgreSQL and in-memory stores, both wired to the mutation hooks
//! - `service.rs` - [`TodoService`], used by the routes
//! - `routes.rs` - HTTP handlers

pub mod commands;
pub mod models;
pub mod queries;
pub mod repository;
pub mod routes;
pub mod service;

pub use commands::{
    CreateTodoCommand, CreateTodoError, DeleteTodoCommand, DeleteTodoError, UpdateTodoCommand,
    UpdateTodoError,
};
pub use models::{NewTodo, Todo, TodoChanges};
pub use queries::{GetTodoError, GetTodoQuery, ListTodosError, ListTodosQuery};
pub use repository::{MemoryTodoRepository, PgTodoRepository, TodoRepository, TodoStoreError};
pub use routes::todos_routes;
pub use service::TodoService;
