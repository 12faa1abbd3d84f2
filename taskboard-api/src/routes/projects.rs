/// Project endpoints
///
/// - `POST /v1/projects` - Create a project; the creator becomes owner
/// - `GET /v1/projects` - List projects, newest first
/// - `GET /v1/projects/:id` - Project with members and ordered tasks
/// - `PATCH /v1/projects/:id` - Rename or re-describe
/// - `DELETE /v1/projects/:id?actorId=` - Delete with tasks and memberships (owner only)
/// - `POST /v1/projects/:id/invite` - Add a member

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::membership::{Membership, ProjectMember, ProjectRole};
use taskboard_shared::models::project::{Project, ProjectDetails};
use taskboard_shared::services::project::{CreateProject, ProjectChanges};
use taskboard_shared::store::Store;
use uuid::Uuid;
use validator::Validate;

use super::tasks::TaskResponse;
use super::{ActorQuery, PageQuery};
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,

    /// Creator, recorded as the project's owner
    pub owner_id: Uuid,
}

/// Absent fields are left alone; an empty description clears it
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    /// Acting member
    pub inviter_id: Uuid,

    /// User to add
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
}

impl From<ProjectMember> for MemberResponse {
    fn from(member: ProjectMember) -> Self {
        Self {
            user_id: member.user_id,
            name: member.name,
            email: member.email,
            role: member.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub created_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            project_id: membership.project_id,
            user_id: membership.user_id,
            role: membership.role,
            created_at: membership.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailsResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub members: Vec<MemberResponse>,

    /// Ordered by position
    pub tasks: Vec<TaskResponse>,
}

impl From<ProjectDetails> for ProjectDetailsResponse {
    fn from(details: ProjectDetails) -> Self {
        Self {
            project: details.project.into(),
            members: details.members.into_iter().map(Into::into).collect(),
            tasks: details.tasks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create a project
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank name
/// - `404 Not Found`: owner does not exist
pub async fn create_project<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let project = state
        .projects
        .create(CreateProject {
            name: req.name,
            description: req.description,
            owner_id: req.owner_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

pub async fn list_projects<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let page = query.page();
    let projects = state.projects.list(page.limit, page.offset).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

pub async fn get_project<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetailsResponse>> {
    let details = state.projects.get_by_id(id).await?;
    Ok(Json(details.into()))
}

pub async fn update_project<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<Json<ProjectResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let project = state
        .projects
        .update(
            id,
            ProjectChanges {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(project.into()))
}

/// Delete a project
///
/// # Errors
///
/// - `404 Not Found`: project does not exist
/// - `403 Forbidden`: actor is not the project's owner
pub async fn delete_project<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    Query(actor): Query<ActorQuery>,
) -> ApiResult<StatusCode> {
    state.projects.delete(id, actor.actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a member
///
/// # Errors
///
/// - `404 Not Found`: project or user does not exist
/// - `403 Forbidden`: inviter is not a member
/// - `409 Conflict`: user is already a member
pub async fn invite_member<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    let Json(req) = payload?;

    let membership = state
        .projects
        .invite(id, req.inviter_id, req.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(membership.into())))
}
