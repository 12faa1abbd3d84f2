/// Service error taxonomy
///
/// Every use case returns [`ServiceResult`]. Input problems are reported as
/// [`ServiceError::Validation`] before storage is touched; everything else is
/// classified from the repository layer:
///
/// | Variant | Meaning |
/// |---|---|
/// | `Validation` | blank or malformed input |
/// | `NotFound` | project, task or user absent |
/// | `Forbidden` | the actor's role does not allow the action |
/// | `Conflict` | duplicate invite/assignment or a unique constraint race |
/// | `Storage` | opaque repository failure |
///
/// Unique-constraint violations raised by PostgreSQL are translated to
/// `Conflict` so a racing double-invite reads the same as a detected one.

use std::fmt;

use crate::auth::authorization::AuthzError;

/// Result alias used across the services and stores
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Project,
    Task,
    User,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Project => "project",
            Resource::Task => "task",
            Resource::User => "user",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mutation conflicts with existing state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictKind {
    /// The invited user already holds a membership in the project
    #[error("already member")]
    AlreadyMember,

    /// The task is already assigned to the requested user
    #[error("already assigned")]
    AlreadyAssigned,

    /// The task has no assignee to clear
    #[error("task is not assigned")]
    NotAssigned,

    /// Another user registered with the same email
    #[error("email already exists")]
    EmailTaken,

    /// Any other unique constraint reported by the store
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// Unified error type for the use case layer
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(Resource),

    /// Actor is not allowed to perform the action
    #[error("forbidden: {0}")]
    Forbidden(AuthzError),

    /// Mutation conflicts with existing state
    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    /// Repository failure
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    /// Builds a validation error for a named input field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Builds an opaque storage error from any error or message
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ServiceError::Storage(err.into())
    }

    /// Whether this error is a `NotFound` for the given resource
    pub fn is_not_found(&self, resource: Resource) -> bool {
        matches!(self, ServiceError::NotFound(r) if *r == resource)
    }
}

/// Maps authorization denials onto the error taxonomy
///
/// Duplicate-action denials are conflicts; everything else is forbidden.
impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::AlreadyMember => ServiceError::Conflict(ConflictKind::AlreadyMember),
            AuthzError::AlreadyAssigned => ServiceError::Conflict(ConflictKind::AlreadyAssigned),
            AuthzError::NotAssigned => ServiceError::Conflict(ConflictKind::NotAssigned),
            other => ServiceError::Forbidden(other),
        }
    }
}

/// Classifies sqlx errors
///
/// Unique violations become conflicts (named after the constraint so the
/// membership and email keys read as domain conflicts); anything else is
/// passed through as a storage error with its source preserved.
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let kind = match db_err.constraint() {
                    Some("project_members_pkey") => ConflictKind::AlreadyMember,
                    Some("users_email_key") => ConflictKind::EmailTaken,
                    Some(name) => ConflictKind::Constraint(name.to_string()),
                    None => ConflictKind::Constraint(db_err.message().to_string()),
                };
                return ServiceError::Conflict(kind);
            }
        }

        ServiceError::Storage(Box::new(err))
    }
}
