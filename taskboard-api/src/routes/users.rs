/// User endpoints
///
/// - `POST /v1/users` - Sign up
/// - `GET /v1/users` - List users, newest first
/// - `GET /v1/users/:id` - Get a user

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::user::{CreateUser, User};
use taskboard_shared::store::Store;
use uuid::Uuid;
use validator::Validate;

use super::PageQuery;
use crate::{app::AppState, error::ApiResult};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Email must be 1-255 characters"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    pub country: Option<String>,
}

/// User as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            country: user.country,
            created_at: user.created_at,
        }
    }
}

/// Sign up
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank email or name
/// - `409 Conflict`: email already registered
pub async fn create_user<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .users
        .create(CreateUser {
            email: req.email,
            name: req.name,
            country: req.country,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user.into()))
}

pub async fn list_users<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let page = query.page();
    let users = state.users.list(page.limit, page.offset).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
