use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::task::{NewTask, Task, TaskPatch, TaskState, TaskStoreError, is_valid_hex_color};

const DEFAULT_COLOR: &str = "#fff";
const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

/// JSON representation of a task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Short description of what needs to be done
    title: String,
    /// Display color as a hex code
    color: String,
    /// Whether the task has been completed
    completed_status: bool,
    /// When the task was created
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            color: task.color().to_string(),
            completed_status: task.completed_status(),
            created_at: task.created_at(),
        }
    }
}

/// Request body for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Short description of what needs to be done
    title: Option<String>,
    /// Display color as a hex code; defaults to `#fff` when absent
    color: Option<String>,
}

/// Request body for updating a task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New title for the task
    title: Option<String>,
    /// New display color as a hex code; unchanged when absent
    color: Option<String>,
    /// New completion flag; unchanged when absent
    completed_status: Option<bool>,
}

/// Query parameters for paginating the task list.
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    page: Option<u64>,
    limit: Option<u64>,
}

/// Per-field validation failure reported back to the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Clone)]
pub struct FieldError {
    /// Name of the offending field
    field: String,
    /// Human-readable description of the failure
    message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// JSON body for validation failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// One entry per failing field
    errors: Vec<FieldError>,
}

/// JSON body for not-found and storage failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Fixed description of the failure
    error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Error type for task handler operations, covering the three failure
/// shapes the API exposes.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// One or more request fields failed validation.
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),
    /// The requested task does not exist.
    #[error("Task not found")]
    NotFound,
    /// The store failed; the fixed message is all the caller sees.
    #[error("{0}")]
    Storage(&'static str),
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            TaskApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorResponse { errors }),
            )
                .into_response(),
            TaskApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Task not found")),
            )
                .into_response(),
            TaskApiError::Storage(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(message)),
            )
                .into_response(),
        }
    }
}

/// Maps a store failure onto the API error for one operation: misses become
/// 404s, anything else is logged and reported with the operation's fixed
/// message.
fn storage_error(err: TaskStoreError, message: &'static str) -> TaskApiError {
    match err {
        TaskStoreError::TaskNotFound(_) => TaskApiError::NotFound,
        err => {
            tracing::error!("{}: {}", message, err);
            TaskApiError::Storage(message)
        }
    }
}

fn validate_title(title: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match title {
        Some(title) if !title.is_empty() => Some(title),
        _ => {
            errors.push(FieldError::new("title", "Title is required"));
            None
        }
    }
}

fn validate_color(color: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match color {
        Some(color) if !is_valid_hex_color(&color) => {
            errors.push(FieldError::new("color", "Color must be a valid hex code"));
            None
        }
        other => other,
    }
}

fn validate_create(payload: CreateTaskRequest) -> Result<NewTask, TaskApiError> {
    let mut errors = Vec::new();
    let title = validate_title(payload.title, &mut errors);
    let color = validate_color(payload.color, &mut errors);
    match (title, errors.is_empty()) {
        (Some(title), true) => Ok(NewTask {
            title,
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        }),
        _ => Err(TaskApiError::Validation(errors)),
    }
}

fn validate_update(payload: UpdateTaskRequest) -> Result<TaskPatch, TaskApiError> {
    let mut errors = Vec::new();
    let title = validate_title(payload.title, &mut errors);
    let color = validate_color(payload.color, &mut errors);
    match (title, errors.is_empty()) {
        (Some(title), true) => Ok(TaskPatch {
            title,
            color,
            completed_status: payload.completed_status,
        }),
        _ => Err(TaskApiError::Validation(errors)),
    }
}

/// Handler for GET /tasks - returns one page of tasks in ID order.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number, defaults to 1"),
        ("limit" = Option<u64>, Query, description = "Page size, defaults to 10, capped at 100")
    ),
    responses(
        (status = 200, description = "One page of tasks", body = [TaskJson]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<TaskState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskJson>>, TaskApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let tasks = state
        .store
        .list_tasks(page, limit)
        .await
        .map_err(|err| storage_error(err, "Failed to fetch tasks"))?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for GET /tasks/{id} - returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The requested task", body = TaskJson),
        (status = 404, description = "No task with this ID", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<i32>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let task = state
        .store
        .get_task_by_id(id)
        .await
        .map_err(|err| storage_error(err, "Failed to fetch task"))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /tasks - validates the payload and creates a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "The created task", body = TaskJson),
        (status = 400, description = "Validation failure", body = ValidationErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<TaskState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskJson>), TaskApiError> {
    let new_task = validate_create(payload)?;
    let task = state
        .store
        .create_task(new_task)
        .await
        .map_err(|err| storage_error(err, "Failed to create task"))?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for PUT /tasks/{id} - validates the payload and patches the task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    request_body = UpdateTaskRequest,
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The updated task", body = TaskJson),
        (status = 400, description = "Validation failure", body = ValidationErrorResponse),
        (status = 404, description = "No task with this ID", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskJson>, TaskApiError> {
    let patch = validate_update(payload)?;
    let task = state
        .store
        .update_task_by_id(id, patch)
        .await
        .map_err(|err| storage_error(err, "Failed to update task"))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /tasks/{id} - removes the task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No task with this ID", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, TaskApiError> {
    state
        .store
        .delete_task_by_id(id)
        .await
        .map_err(|err| storage_error(err, "Failed to delete task"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks router with all task-related routes.
pub fn create_task_router(state: TaskState) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
