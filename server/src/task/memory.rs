use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::task::{NewTask, Task, TaskPatch, TaskStore, TaskStoreError};

/// In-memory [`TaskStore`] used as a stand-in for the database-backed store
/// in tests. IDs come from a counter that survives deletions, so a deleted
/// ID is never handed out again.
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

struct Inner {
    tasks: Vec<Task>,
    next_id: i32,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tasks: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Clears all tasks and restarts ID assignment from 1.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.tasks.clear();
        inner.next_id = 1;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self, page: u64, per_page: u64) -> Result<Vec<Task>, TaskStoreError> {
        let offset =
            usize::try_from(page.saturating_sub(1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(usize::MAX);
        let inner = self.lock();
        Ok(inner.tasks.iter().skip(offset).take(take).cloned().collect())
    }

    async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskStoreError> {
        let inner = self.lock();
        inner
            .tasks
            .iter()
            .find(|task| task.id() == id)
            .cloned()
            .ok_or(TaskStoreError::TaskNotFound(id))
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskStoreError> {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let task = Task::new(id, new_task.title, new_task.color, false, chrono::Utc::now());
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task_by_id(&self, id: i32, patch: TaskPatch) -> Result<Task, TaskStoreError> {
        let mut inner = self.lock();
        let task = inner
            .tasks
            .iter_mut()
            .find(|task| task.id() == id)
            .ok_or(TaskStoreError::TaskNotFound(id))?;
        let updated = Task::new(
            task.id(),
            patch.title,
            patch.color.unwrap_or_else(|| task.color().to_string()),
            patch.completed_status.unwrap_or(task.completed_status()),
            task.created_at(),
        );
        *task = updated.clone();
        Ok(updated)
    }

    async fn delete_task_by_id(&self, id: i32) -> Result<(), TaskStoreError> {
        let mut inner = self.lock();
        let index = inner
            .tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or(TaskStoreError::TaskNotFound(id))?;
        inner.tasks.remove(index);
        Ok(())
    }
}
