//! Todo API routes
//!
//! - `GET /todos` - List every Todo, newest first
//! - `GET /todos/:id` - Get one Todo
//! - `POST /todos` - Create a Todo
//! - `PATCH /todos/:id` - Partially update a Todo
//! - `DELETE /todos/:id` - Delete a Todo
//!
//! An `:id` that is not a UUID cannot name an existing Todo and is answered with 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::{
    commands::{CreateTodoCommand, CreateTodoError, DeleteTodoError, UpdateTodoCommand, UpdateTodoError},
    queries::{GetTodoError, ListTodosError},
    service::TodoService,
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::context::RequestContext;

pub fn todos_routes() -> Router<TodoService> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/:id", get(get_todo).patch(update_todo).delete(delete_todo))
}

fn parse_id(raw: &str) -> Result<Uuid, TodoApiError> {
    Uuid::parse_str(raw).map_err(|_| TodoApiError::UnknownId(raw.to_string()))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// `POST /todos` - `201 Created` with the new Todo
#[tracing::instrument(skip(service, ctx, command), fields(request_id = %ctx.request_id()))]
async fn create_todo(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Json(command): Json<CreateTodoCommand>,
) -> Result<Response, TodoApiError> {
    let todo = service.create(&ctx, command).await?;

    tracing::info!(todo_id = %todo.id, "Todo created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(todo))).into_response())
}

/// `PATCH /todos/:id` - `200 OK` with the updated Todo
#[tracing::instrument(skip(service, ctx, command), fields(id = %id, request_id = %ctx.request_id()))]
async fn update_todo(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(command): Json<UpdateTodoCommand>,
) -> Result<Response, TodoApiError> {
    let id = parse_id(&id)?;
    let todo = service.update(&ctx, id, command).await?;

    tracing::info!(todo_id = %todo.id, "Todo updated via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(todo))).into_response())
}

/// `DELETE /todos/:id` - `204 No Content`
#[tracing::instrument(skip(service, ctx), fields(id = %id, request_id = %ctx.request_id()))]
async fn delete_todo(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, TodoApiError> {
    let id = parse_id(&id)?;
    service.remove(&ctx, id).await?;

    tracing::info!(todo_id = %id, "Todo deleted via API");

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(service))]
async fn list_todos(State(service): State<TodoService>) -> Result<Response, TodoApiError> {
    let todos = service.get_all().await?;
    let meta = json!({ "count": todos.len() });

    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(todos, meta))).into_response())
}

#[tracing::instrument(skip(service), fields(id = %id))]
async fn get_todo(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Response, TodoApiError> {
    let id = parse_id(&id)?;
    let todo = service.get_by_id(id).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(todo))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for Todo API endpoints
#[derive(Debug, thiserror::Error)]
enum TodoApiError {
    #[error("Todo '{0}' not found")]
    UnknownId(String),
    #[error(transparent)]
    Create(#[from] CreateTodoError),
    #[error(transparent)]
    Update(#[from] UpdateTodoError),
    #[error(transparent)]
    Delete(#[from] DeleteTodoError),
    #[error(transparent)]
    Get(#[from] GetTodoError),
    #[error(transparent)]
    List(#[from] ListTodosError),
}

impl TodoApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            TodoApiError::UnknownId(_)
            | TodoApiError::Update(UpdateTodoError::NotFound(_))
            | TodoApiError::Delete(DeleteTodoError::NotFound(_))
            | TodoApiError::Get(GetTodoError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),

            TodoApiError::Create(CreateTodoError::Title(_))
            | TodoApiError::Create(CreateTodoError::Description(_))
            | TodoApiError::Update(UpdateTodoError::NoFieldsToUpdate)
            | TodoApiError::Update(UpdateTodoError::Title(_))
            | TodoApiError::Update(UpdateTodoError::Description(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },

            TodoApiError::Create(CreateTodoError::Store(_))
            | TodoApiError::Update(UpdateTodoError::Store(_))
            | TodoApiError::Delete(DeleteTodoError::Store(_))
            | TodoApiError::Get(GetTodoError::Store(_))
            | TodoApiError::List(ListTodosError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            },
        }
    }
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Storage error while handling todo request");
            "A database error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
