//! Router assembly

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use crate::audit::{routes::audit_routes, AuditQueryService};
use crate::config::Config;
use crate::context::IdentityLayer;
use crate::db;
use crate::features::todos::{todos_routes, TodoService};
use crate::middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub audit: AuditQueryService,
    /// Primary database, probed by `/health`. `None` when running on in-memory stores.
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(todos: TodoService, audit: AuditQueryService) -> Self {
        Self {
            todos,
            audit,
            db: None,
        }
    }

    pub fn with_db(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}

/// Full router with every request bound to the mock identity.
pub fn build_router(state: AppState, config: &Config) -> Router {
    build_router_with_identity(state, config, IdentityLayer::mock())
}

/// Full router with a caller-chosen identity source.
pub fn build_router_with_identity(
    state: AppState,
    config: &Config,
    identity: IdentityLayer,
) -> Router {
    let todos = state.todos.clone();
    let audit = state.audit.clone();

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/todos", todos_routes().with_state(todos))
        .nest("/audit-logs", audit_routes().with_state(audit))
        // Innermost first
        .layer(identity)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let Some(ref pool) = state.db else {
        return Ok((
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "in-memory" })),
        )
            .into_response());
    };

    match db::health_check(pool).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
