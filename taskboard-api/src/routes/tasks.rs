/// Task endpoints
///
/// - `GET /v1/projects/:id/tasks` - Tasks by position, with assignees
/// - `POST /v1/projects/:id/tasks` - Append a task
/// - `PATCH /v1/tasks/:id` - Edit fields and/or move to a new position
/// - `DELETE /v1/tasks/:id?actorId=` - Delete (owner only)
/// - `POST /v1/tasks/:id/assignee` - Assign
/// - `DELETE /v1/tasks/:id/assignee?actorId=` - Unassign

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::task::{Assignee, Task, TaskStatus, TaskView};
use taskboard_shared::services::task::{CreateTask, TaskChanges};
use taskboard_shared::store::Store;
use uuid::Uuid;
use validator::Validate;

use super::{ActorQuery, PageQuery};
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// `todo`, `in_progress` or `done`; defaults to `todo`
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<String>,

    /// Zero-based target position; values past the end land last
    #[validate(range(min = 0, message = "Position must be non-negative"))]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub actor_id: Uuid,

    /// Defaults to the actor
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            position: task.position,
            title: task.title,
            description: task.description,
            status: task.status,
            assignee_id: task.assignee_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Assignee> for AssigneeResponse {
    fn from(assignee: Assignee) -> Self {
        Self {
            user_id: assignee.user_id,
            name: assignee.name,
            email: assignee.email,
        }
    }
}

/// Listed task with its assignee's details
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskViewResponse {
    #[serde(flatten)]
    pub task: TaskResponse,
    pub assignee: Option<AssigneeResponse>,
}

impl From<TaskView> for TaskViewResponse {
    fn from(view: TaskView) -> Self {
        Self {
            task: view.task.into(),
            assignee: view.assignee.map(Into::into),
        }
    }
}

pub async fn list_tasks<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<TaskViewResponse>>> {
    let page = query.page();
    let tasks = state
        .tasks
        .list_by_project(project_id, page.limit, page.offset)
        .await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Append a task to a project
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank title or unknown status
/// - `404 Not Found`: project does not exist
pub async fn create_task<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let task = state
        .tasks
        .create_in_project(
            project_id,
            CreateTask {
                title: req.title,
                description: req.description,
                status: req.status,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Edit a task, moving it when `position` is given
pub async fn update_task<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let task = state
        .tasks
        .update(
            id,
            TaskChanges {
                title: req.title,
                description: req.description,
                status: req.status,
                position: req.position,
            },
        )
        .await?;

    Ok(Json(task.into()))
}

/// Delete a task and close the gap it leaves
///
/// # Errors
///
/// - `404 Not Found`: task does not exist
/// - `403 Forbidden`: actor is not the project's owner
pub async fn delete_task<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(actor): Query<ActorQuery>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(id, actor.actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a task
///
/// # Errors
///
/// - `404 Not Found`: task or user does not exist
/// - `403 Forbidden`: actor or assignee is not a member, or a non-owner
///   assigns someone else
/// - `409 Conflict`: already assigned to that user
pub async fn assign_task<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(req) = payload?;
    let user_id = req.user_id.unwrap_or(req.actor_id);

    let task = state.tasks.assign(id, req.actor_id, user_id).await?;
    Ok(Json(task.into()))
}

pub async fn unassign_task<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(actor): Query<ActorQuery>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.tasks.unassign(id, actor.actor_id).await?;
    Ok(Json(task.into()))
}
