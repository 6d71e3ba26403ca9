use crate::entities::*;
use sea_orm::*;
use std::sync::Arc;

pub mod api;
pub mod memory;

/// A to-do item: titled, colored and completable.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: String,
    color: String,
    completed_status: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub fn new(
        id: i32,
        title: String,
        color: String,
        completed_status: bool,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id,
            title,
            color,
            completed_status,
            created_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title of the task.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the display color of the task.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns whether the task has been completed.
    pub fn completed_status(&self) -> bool {
        self.completed_status
    }

    /// Returns the creation timestamp of the task.
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.title,
            model.color,
            model.completed_status,
            model.created_at,
        )
    }
}

/// Input for creating a task. The caller has already validated the fields
/// and resolved the color default.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub title: String,
    pub color: String,
}

/// Partial update for a task: `title` is always written, the optional
/// fields only when present.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TaskPatch {
    pub title: String,
    pub color: Option<String>,
    pub completed_status: Option<bool>,
}

/// Checks whether `value` is a hex color: `#` followed by 3, 4, 6 or 8
/// hexadecimal digits.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 4 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Error type for task store operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Storage interface for tasks. [`DbTaskStore`] is the authoritative
/// implementation; [`memory::InMemoryTaskStore`] stands in for it in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns one page of tasks in ascending ID order. `page` is 1-based.
    async fn list_tasks(&self, page: u64, per_page: u64) -> Result<Vec<Task>, TaskStoreError>;

    /// Retrieves a task by its ID.
    async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskStoreError>;

    /// Creates a new, not yet completed task.
    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskStoreError>;

    /// Applies a patch to the task with the given ID.
    async fn update_task_by_id(&self, id: i32, patch: TaskPatch) -> Result<Task, TaskStoreError>;

    /// Deletes the task with the given ID.
    async fn delete_task_by_id(&self, id: i32) -> Result<(), TaskStoreError>;
}

/// Shared router state holding the storage backend.
#[derive(Clone)]
pub struct TaskState {
    pub store: Arc<dyn TaskStore>,
}

/// Database-backed task store.
pub struct DbTaskStore {
    db: DatabaseConnection,
}

impl DbTaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl TaskStore for DbTaskStore {
    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self, page: u64, per_page: u64) -> Result<Vec<Task>, TaskStoreError> {
        let offset = page
            .saturating_sub(1)
            .saturating_mul(per_page)
            .min(i64::MAX as u64);
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Id)
            .offset(offset)
            .limit(per_page)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskStoreError> {
        let task_model = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TaskStoreError::TaskNotFound(id))?;
        Ok(Task::from(task_model))
    }

    #[tracing::instrument(skip(self))]
    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskStoreError> {
        // `created_at` stays unset so the column default assigns it.
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(new_task.title),
            color: ActiveValue::Set(new_task.color),
            completed_status: ActiveValue::Set(false),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update_task_by_id(&self, id: i32, patch: TaskPatch) -> Result<Task, TaskStoreError> {
        let task_to_update = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TaskStoreError::TaskNotFound(id))?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.title = ActiveValue::Set(patch.title);
        if let Some(color) = patch.color {
            active_model.color = ActiveValue::Set(color);
        }
        if let Some(completed_status) = patch.completed_status {
            active_model.completed_status = ActiveValue::Set(completed_status);
        }
        let updated_model = active_model.update(&self.db).await?;

        Ok(Task::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task_by_id(&self, id: i32) -> Result<(), TaskStoreError> {
        task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TaskStoreError::TaskNotFound(id))?;
        task::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
