/// Task endpoints
///
/// All handlers here sit behind the JWT middleware and read the caller
/// identity from the injected `AuthContext`. They parse the request shape
/// and delegate straight to the task service, which owns validation,
/// ownership scoping, and cache consistency.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks` - List tasks (filter, sort, paginate)
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PUT    /v1/tasks/:id` - Replace a task's fields
/// - `PATCH  /v1/tasks/:id` - Update some of a task's fields
/// - `DELETE /v1/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskvault_shared::auth::middleware::AuthContext;
use taskvault_shared::models::task::{Task, TaskStatus};
use taskvault_shared::tasks::{TaskDraft, TaskFilter, TaskPatch};
use uuid::Uuid;

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title (trimmed length >= 3)
    pub title: String,

    /// Optional details
    pub description: Option<String>,

    /// One of pending, in-progress, completed
    pub status: String,
}

/// Full-replace request (PUT)
///
/// `description` is part of the replacement: leaving it out clears the
/// stored value.
#[derive(Debug, Deserialize)]
pub struct ReplaceTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
}

/// Partial update request (PATCH)
///
/// Absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct PatchTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Listing query parameters
#[derive(Debug, Deserialize, Default)]
pub struct ListTasksParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
}

impl From<ListTasksParams> for TaskFilter {
    fn from(params: ListTasksParams) -> Self {
        TaskFilter {
            page: params.page,
            limit: params.limit,
            sort_by: params.sort_by,
            sort_order: params.sort_order,
            status: params.status,
            title: params.title,
        }
    }
}

/// Task as exposed on the wire
///
/// Timestamps and the owner id stay internal.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title,
            description: task.description,
            status: task.status,
        }
    }
}

/// Listing response with pagination metadata
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub message: String,
}

/// Create a task for the caller
///
/// # Errors
///
/// - `400 Bad Request`: title or status failed validation
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .tasks
        .create_task(
            auth.user_id,
            TaskDraft {
                title: req.title,
                description: req.description,
                status: req.status,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// List the caller's tasks with filtering, sorting, and pagination
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<ListTasksResponse>> {
    let page = state.tasks.list_tasks(auth.user_id, params.into()).await?;

    Ok(Json(ListTasksResponse {
        tasks: page.tasks.into_iter().map(TaskResponse::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// Fetch a single task owned by the caller
///
/// # Errors
///
/// - `404 Not Found`: no such task, or it belongs to someone else
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.tasks.get_task(auth.user_id, id).await?;

    Ok(Json(task.into()))
}

/// Replace a task's fields (PUT)
///
/// # Errors
///
/// - `400 Bad Request`: title or status failed validation
/// - `404 Not Found`: no such task, or it belongs to someone else
pub async fn replace_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplaceTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .tasks
        .update_task(
            auth.user_id,
            id,
            TaskPatch {
                title: Some(req.title),
                description: Some(req.description),
                status: Some(req.status),
            },
        )
        .await?;

    Ok(Json(task.into()))
}

/// Update some of a task's fields (PATCH)
///
/// # Errors
///
/// - `400 Bad Request`: a present field failed validation
/// - `404 Not Found`: no such task, or it belongs to someone else
pub async fn patch_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .tasks
        .update_task(
            auth.user_id,
            id,
            TaskPatch {
                title: req.title,
                description: req.description.map(Some),
                status: req.status,
            },
        )
        .await?;

    Ok(Json(task.into()))
}

/// Delete a task owned by the caller
///
/// # Errors
///
/// - `404 Not Found`: no such task, or it belongs to someone else
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let deleted = state.tasks.delete_task(auth.user_id, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(DeleteTaskResponse {
        message: "Task deleted".to_string(),
    }))
}
