//! Audit log API routes
//!
//! - `GET /audit-logs?limit=` - Most recent entries
//! - `GET /audit-logs/entity/:entity?limit=` - Most recent entries for one entity type

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{models::clamp_limit, queries::AuditQueryService, recorder::AuditError};
use crate::api::response::{ApiResponse, ErrorResponse};

pub fn audit_routes() -> Router<AuditQueryService> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/entity/:entity", get(list_audit_logs_by_entity))
}

/// `limit` is kept as raw text: an absent or non-numeric value falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLimitParams {
    pub limit: Option<String>,
}

impl AuditLimitParams {
    fn parsed(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

#[tracing::instrument(skip(service, params), fields(limit = ?params.limit))]
async fn list_audit_logs(
    State(service): State<AuditQueryService>,
    Query(params): Query<AuditLimitParams>,
) -> Result<Response, AuditApiError> {
    let limit = params.parsed();
    let entries = service.get_all(limit).await?;
    let meta = json!({ "limit": clamp_limit(limit), "count": entries.len() });

    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(entries, meta))).into_response())
}

#[tracing::instrument(skip(service, params), fields(entity = %entity, limit = ?params.limit))]
async fn list_audit_logs_by_entity(
    State(service): State<AuditQueryService>,
    Path(entity): Path<String>,
    Query(params): Query<AuditLimitParams>,
) -> Result<Response, AuditApiError> {
    let limit = params.parsed();
    let entries = service.get_by_entity(&entity, limit).await?;
    let meta = json!({
        "entity": entity,
        "limit": clamp_limit(limit),
        "count": entries.len()
    });

    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(entries, meta))).into_response())
}

#[derive(Debug)]
struct AuditApiError(AuditError);

impl From<AuditError> for AuditApiError {
    fn from(err: AuditError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuditApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Audit query failed");
        let error = ErrorResponse::new("INTERNAL_ERROR", "The audit store is unavailable");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
    }
}
