/// Use cases
///
/// Each service is generic over a [`crate::store::Store`] and runs every
/// operation inside a single transaction: validate input, open the
/// transaction, check existence, authorize, mutate, commit. Any error
/// drops the transaction and rolls it back.
///
/// - [`project::ProjectService`]: create, get, update, list, invite, delete
/// - [`task::TaskService`]: list, create, update (with reorder), assign,
///   unassign, delete
/// - [`user::UserService`]: signup, get, list

pub mod project;
pub mod task;
pub mod user;

pub use project::ProjectService;
pub use task::TaskService;
pub use user::UserService;

use crate::error::{ServiceError, ServiceResult};

/// Trims a required text field, rejecting blank input
pub(crate) fn required_text(field: &'static str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(field, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank becomes `None`
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interprets a patch of a clearable text field
///
/// Absent leaves the field alone, blank clears it, anything else sets it.
pub(crate) fn clearable_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| optional_text(Some(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Launch ").unwrap(), "Launch");
        assert!(matches!(
            required_text("name", "   "),
            Err(ServiceError::Validation { field: "name", .. })
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_clearable_text() {
        assert_eq!(clearable_text(None), None);
        assert_eq!(clearable_text(Some("".to_string())), Some(None));
        assert_eq!(
            clearable_text(Some("notes".to_string())),
            Some(Some("notes".to_string()))
        );
    }
}
