//! End-to-end audit capture through the Todo service on in-memory stores

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use todo_audit_server::{
    audit::AuditAction,
    context::{mock_identity, RequestContext, RequestIdentity},
    features::todos::{
        CreateTodoCommand, DeleteTodoError, GetTodoError, UpdateTodoCommand, UpdateTodoError,
    },
};
use uuid::Uuid;

mod helpers;
use helpers::{memory_stack, stack_with, FailingAuditStore};

fn create(title: &str) -> CreateTodoCommand {
    CreateTodoCommand {
        title: title.to_string(),
        description: Some("details".to_string()),
    }
}

#[tokio::test]
async fn test_create_records_one_entry() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());

    let todo = todos.create(&ctx, create("Write tests")).await.unwrap();

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.entity_type, "Todo");
    assert_eq!(entry.entity_id, Some(todo.id.to_string()));
    assert_eq!(entry.after_state, Some(serde_json::to_value(&todo).unwrap()));
    assert!(entry.before_state.is_none());
    assert_eq!(entry.acting_user_id.as_deref(), Some("user-123"));
    assert!(entry.timestamp > todo.created_at);
}

#[tokio::test]
async fn test_update_records_before_and_after() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());
    let created = todos.create(&ctx, create("Draft")).await.unwrap();

    let command = UpdateTodoCommand {
        title: Some("Final".to_string()),
        completed: Some(true),
        ..Default::default()
    };
    let updated = todos.update(&ctx, created.id, command).await.unwrap();

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), 2);
    let entry = &entries[1];
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.entity_id, Some(created.id.to_string()));
    assert_eq!(entry.before_state, Some(serde_json::to_value(&created).unwrap()));
    assert_eq!(entry.after_state, Some(serde_json::to_value(&updated).unwrap()));
}

#[tokio::test]
async fn test_update_can_clear_description() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());
    let created = todos.create(&ctx, create("Report")).await.unwrap();

    let command: UpdateTodoCommand = serde_json::from_value(json!({ "description": null })).unwrap();
    let updated = todos.update(&ctx, created.id, command).await.unwrap();
    assert_eq!(updated.description, None);

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), 2);
    let entry = &entries[1];
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.before_state.as_ref().unwrap()["description"], json!("details"));
    assert_eq!(entry.after_state.as_ref().unwrap()["description"], json!(null));
    assert!(entry.timestamp > updated.created_at);
}

#[tokio::test]
async fn test_remove_records_before_only() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());
    let created = todos.create(&ctx, create("Disposable")).await.unwrap();

    todos.remove(&ctx, created.id).await.unwrap();

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), 2);
    let entry = &entries[1];
    assert_eq!(entry.action, AuditAction::Remove);
    assert_eq!(entry.entity_id, Some(created.id.to_string()));
    assert_eq!(entry.before_state, Some(serde_json::to_value(&created).unwrap()));
    assert!(entry.after_state.is_none());
}

#[tokio::test]
async fn test_unbound_context_records_no_user() {
    let (todos, _, store) = memory_stack();
    todos
        .create(&RequestContext::anonymous(), create("System job"))
        .await
        .unwrap();

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].acting_user_id.is_none());
}

#[tokio::test]
async fn test_missing_ids_fail_without_audit() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());
    let missing = Uuid::new_v4();

    assert!(matches!(
        todos.get_by_id(missing).await,
        Err(GetTodoError::NotFound(id)) if id == missing
    ));

    let command = UpdateTodoCommand {
        completed: Some(true),
        ..Default::default()
    };
    assert!(matches!(
        todos.update(&ctx, missing, command).await,
        Err(UpdateTodoError::NotFound(_))
    ));
    assert!(matches!(
        todos.remove(&ctx, missing).await,
        Err(DeleteTodoError::NotFound(_))
    ));

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_validation_failure_records_nothing() {
    let (todos, _, store) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());

    assert!(todos.create(&ctx, create("   ")).await.is_err());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_audit_store_outage_does_not_fail_mutations() {
    let failing = Arc::new(FailingAuditStore::default());
    let (todos, audit) = stack_with(failing.clone());
    let ctx = RequestContext::bind(mock_identity());

    let created = todos.create(&ctx, create("Still works")).await.unwrap();
    assert_eq!(created.title, "Still works");
    assert_eq!(todos.get_by_id(created.id).await.unwrap(), created);

    let command = UpdateTodoCommand {
        completed: Some(true),
        ..Default::default()
    };
    assert!(todos.update(&ctx, created.id, command).await.unwrap().completed);
    todos.remove(&ctx, created.id).await.unwrap();

    // One attempt per mutation, each rejected and swallowed.
    assert_eq!(failing.attempts(), 3);

    // Reads against the audit store itself still surface the outage.
    assert!(audit.get_all(None).await.is_err());
}

#[tokio::test]
async fn test_query_service_sees_recorded_entries() {
    let (todos, audit, _) = memory_stack();
    let ctx = RequestContext::bind(mock_identity());

    for title in ["one", "two", "three"] {
        todos.create(&ctx, create(title)).await.unwrap();
    }

    let latest = audit.get_all(Some(2)).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert!(latest[0].timestamp >= latest[1].timestamp);
    assert_eq!(latest[0].after_state.as_ref().unwrap()["title"], json!("three"));
    assert_eq!(latest[1].after_state.as_ref().unwrap()["title"], json!("two"));

    let by_entity = audit.get_by_entity("Todo", None).await.unwrap();
    assert_eq!(by_entity.len(), 3);
    assert!(audit.get_by_entity("Project", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_attribute_their_own_user() {
    let (todos, _, store) = memory_stack();

    let tasks = (0..20).map(|i| {
        let todos = todos.clone();
        tokio::spawn(async move {
            let ctx = RequestContext::bind(RequestIdentity::new(format!("user-{i}")));
            tokio::task::yield_now().await;
            let todo = todos.create(&ctx, create(&format!("task {i}"))).await.unwrap();
            (todo.id, format!("user-{i}"))
        })
    });

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let entries = store.snapshot().await;
    assert_eq!(entries.len(), results.len());
    for (id, user) in results {
        let entry = entries
            .iter()
            .find(|e| e.entity_id == Some(id.to_string()))
            .unwrap();
        assert_eq!(entry.acting_user_id.as_deref(), Some(user.as_str()));
    }
}
