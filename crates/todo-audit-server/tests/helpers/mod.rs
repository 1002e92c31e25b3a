//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use serde_json::Value;
use todo_audit_server::{
    app::{build_router_with_identity, AppState},
    audit::{
        AuditFilter, AuditLogEntry, AuditQueryService, AuditRecorder, AuditStore,
        AuditStoreError, AuditSubscriber, MemoryAuditStore,
    },
    config::Config,
    context::IdentityLayer,
    features::todos::{MemoryTodoRepository, TodoService},
    hooks::MutationHooks,
};

/// Audit store that rejects every call, counting insert attempts.
#[derive(Debug, Default)]
pub struct FailingAuditStore {
    pub attempts: AtomicUsize,
}

impl FailingAuditStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn insert_one(&self, _entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditStoreError::Unavailable("audit database is down".to_string()))
    }

    async fn find(
        &self,
        _filter: AuditFilter,
        _limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AuditStoreError> {
        Err(AuditStoreError::Unavailable("audit database is down".to_string()))
    }
}

/// Todo service and audit query service sharing one audit store, all in memory.
pub fn stack_with(store: Arc<dyn AuditStore>) -> (TodoService, AuditQueryService) {
    let hooks = MutationHooks::new().with_subscriber(Arc::new(AuditSubscriber::new(
        AuditRecorder::new(Arc::clone(&store)),
    )));
    let repo = MemoryTodoRepository::new(hooks);
    (TodoService::new(Arc::new(repo)), AuditQueryService::new(store))
}

pub fn memory_stack() -> (TodoService, AuditQueryService, MemoryAuditStore) {
    let store = MemoryAuditStore::new();
    let (todos, audit) = stack_with(Arc::new(store.clone()));
    (todos, audit, store)
}

pub fn setup_test_app_with(store: Arc<dyn AuditStore>, identity: IdentityLayer) -> Router {
    let (todos, audit) = stack_with(store);
    build_router_with_identity(AppState::new(todos, audit), &Config::default(), identity)
}

/// Router on in-memory stores, every request acting as the mock identity.
pub fn setup_test_app() -> (Router, MemoryAuditStore) {
    let store = MemoryAuditStore::new();
    let app = setup_test_app_with(Arc::new(store.clone()), IdentityLayer::mock());
    (app, store)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
