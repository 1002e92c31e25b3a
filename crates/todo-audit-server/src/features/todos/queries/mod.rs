pub mod get;
pub mod list;

pub use get::{GetTodoError, GetTodoQuery};
pub use list::{ListTodosError, ListTodosQuery};
