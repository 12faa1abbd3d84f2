/// Error handling for the API server
///
/// Handlers return [`ApiResult`]; service errors convert through `?` and
/// render as an [`ErrorResponse`] JSON body:
///
/// | Service error | Status |
/// |---|---|
/// | `Validation` | 422 |
/// | `NotFound` | 404 |
/// | `Forbidden` | 403 |
/// | `Conflict` | 409 |
/// | `Storage` | 500, details logged only |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::error::ServiceError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400), e.g. malformed JSON
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. duplicate invite
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity (422)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Service unavailable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { field, message } => {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: field.to_string(),
                    message,
                }])
            }
            ServiceError::NotFound(resource) => ApiError::NotFound(format!("{} not found", resource)),
            ServiceError::Forbidden(reason) => ApiError::Forbidden(reason.to_string()),
            ServiceError::Conflict(kind) => ApiError::Conflict(kind.to_string()),
            ServiceError::Storage(source) => ApiError::InternalError(source.to_string()),
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::auth::authorization::AuthzError;
    use taskboard_shared::error::{ConflictKind, Resource};

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::ValidationError(vec![]);
        assert_eq!(err.to_string(), "Validation failed: 0 errors");
    }

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::validation("title", "title is required"), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::NotFound(Resource::Task), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden(AuthzError::NotMember), StatusCode::FORBIDDEN),
            (ServiceError::Conflict(ConflictKind::AlreadyMember), StatusCode::CONFLICT),
            (ServiceError::storage("connection reset"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_messages_carry_reason() {
        let err = ApiError::from(ServiceError::Forbidden(AuthzError::TargetNotMember));
        assert!(matches!(err, ApiError::Forbidden(ref msg) if msg == "user not in project"));

        let err = ApiError::from(ServiceError::NotFound(Resource::Project));
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "project not found"));

        let err = ApiError::from(ServiceError::validation("title", "title is required"));
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, "title is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
