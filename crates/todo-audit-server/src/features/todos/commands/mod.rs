pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateTodoCommand, CreateTodoError};
pub use delete::{DeleteTodoCommand, DeleteTodoError};
pub use update::{UpdateTodoCommand, UpdateTodoError};
