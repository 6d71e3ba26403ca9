use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection};
use tasklist_server::entities::task;
use tasklist_server::task::{DbTaskStore, NewTask, Task, TaskPatch, TaskStore, TaskStoreError};
use testcontainers_modules::{postgres, testcontainers};

mod common;

// 1. Define TestContext struct locally
pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

// 2. Define setup() function locally, using public functions from common module
async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    Ok(TestContext { db, container })
}

/// Test helper to create a batch of sequentially titled tasks.
async fn create_test_tasks(db: &DatabaseConnection, count: usize) {
    for i in 1..=count {
        let task = task::ActiveModel {
            title: ActiveValue::Set(format!("Task {i}")),
            color: ActiveValue::Set("#fff".to_string()),
            completed_status: ActiveValue::Set(false),
            ..Default::default()
        };
        task.insert(db).await.expect("Failed to insert task");
    }
}

#[tokio::test]
async fn can_create_task() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());

    let created = store
        .create_task(NewTask {
            title: "Buy milk".to_string(),
            color: "#fff".to_string(),
        })
        .await
        .expect("Failed to create task");

    assert_eq!(created.title(), "Buy milk");
    assert_eq!(created.color(), "#fff");
    assert!(!created.completed_status());

    let fetched = store
        .get_task_by_id(created.id())
        .await
        .expect("Failed to fetch task");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn can_update_task_with_partial_patch() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());
    let created = store
        .create_task(NewTask {
            title: "Buy milk".to_string(),
            color: "#abc123".to_string(),
        })
        .await
        .expect("Failed to create task");

    let updated = store
        .update_task_by_id(
            created.id(),
            TaskPatch {
                title: "Buy oat milk".to_string(),
                color: None,
                completed_status: None,
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.title(), "Buy oat milk");
    assert_eq!(updated.color(), "#abc123");
    assert!(!updated.completed_status());
    assert_eq!(updated.created_at(), created.created_at());
}

#[tokio::test]
async fn can_complete_task_through_patch() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());
    let created = store
        .create_task(NewTask {
            title: "Water plants".to_string(),
            color: "#fff".to_string(),
        })
        .await
        .expect("Failed to create task");

    let updated = store
        .update_task_by_id(
            created.id(),
            TaskPatch {
                title: "Water plants".to_string(),
                color: Some("#000000".to_string()),
                completed_status: Some(true),
            },
        )
        .await
        .expect("Failed to update task");

    assert_eq!(updated.color(), "#000000");
    assert!(updated.completed_status());

    let fetched = store
        .get_task_by_id(created.id())
        .await
        .expect("Failed to fetch task");
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn fetching_missing_task_reports_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());

    let result = store.get_task_by_id(9999).await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(9999))));
}

#[tokio::test]
async fn updating_missing_task_reports_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());

    let result = store
        .update_task_by_id(
            9999,
            TaskPatch {
                title: "Anything".to_string(),
                color: None,
                completed_status: None,
            },
        )
        .await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(9999))));
}

#[tokio::test]
async fn deleting_missing_task_reports_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());

    let result = store.delete_task_by_id(9999).await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(9999))));
}

#[tokio::test]
async fn can_delete_task() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());
    let created = store
        .create_task(NewTask {
            title: "Take out trash".to_string(),
            color: "#fff".to_string(),
        })
        .await
        .expect("Failed to create task");

    store
        .delete_task_by_id(created.id())
        .await
        .expect("Failed to delete task");

    let result = store.get_task_by_id(created.id()).await;
    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(_))));
}

#[tokio::test]
async fn can_paginate_tasks_in_id_order() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());
    create_test_tasks(&state.db, 15).await;

    let first_page = store.list_tasks(1, 10).await.expect("Failed to list tasks");
    let second_page = store.list_tasks(2, 10).await.expect("Failed to list tasks");

    let first_ids: Vec<i32> = first_page.iter().map(Task::id).collect();
    let second_ids: Vec<i32> = second_page.iter().map(Task::id).collect();
    assert_eq!(first_ids, (1..=10).collect::<Vec<_>>());
    assert_eq!(second_ids, (11..=15).collect::<Vec<_>>());
}

#[tokio::test]
async fn listing_past_the_last_page_returns_empty() {
    let state = setup().await.expect("Failed to setup test context");
    let store = DbTaskStore::new(state.db.clone());
    create_test_tasks(&state.db, 3).await;

    let page = store.list_tasks(2, 10).await.expect("Failed to list tasks");

    assert!(page.is_empty());
}
