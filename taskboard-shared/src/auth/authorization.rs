/// Authorization decisions for project and task operations
///
/// Decisions are pure: callers load the facts (actor role, target role,
/// current assignee) inside their transaction and pass them in. Existence
/// checks happen before authorization, so a missing project or task is
/// reported as not found rather than forbidden.
///
/// # Check Order
///
/// 1. **Membership**: the actor must hold a role in the project
/// 2. **Target membership**: for assignment, the assignee must be a member
/// 3. **Role**: owner-only actions require [`ProjectRole::Owner`]
/// 4. **Duplicates**: already-member / already-assigned are reported last
///
/// # Permission Matrix
///
/// | Action | Owner | Member | Viewer |
/// |---|---|---|---|
/// | Invite member | yes | yes | yes |
/// | Delete project | yes | no | no |
/// | Delete task | yes | no | no |
/// | Assign task to self | yes | yes | yes |
/// | Assign task to other | yes | no | no |
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{authorize, AuthzError, ProjectAction};
/// use taskboard_shared::models::membership::ProjectRole;
///
/// assert!(authorize(Some(ProjectRole::Owner), ProjectAction::DeleteProject).is_ok());
/// assert_eq!(
///     authorize(None, ProjectAction::DeleteTask),
///     Err(AuthzError::NotMember)
/// );
/// ```

use uuid::Uuid;

use crate::models::membership::ProjectRole;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Actor is not a member of the project
    #[error("not a project member")]
    NotMember,

    /// Actor's role is insufficient
    #[error("insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// The user being assigned is not a member of the task's project
    #[error("user not in project")]
    TargetNotMember,

    /// The invited user is already a member
    #[error("already member")]
    AlreadyMember,

    /// The task is already assigned to the requested user
    #[error("already assigned")]
    AlreadyAssigned,

    /// The task has no assignee to remove
    #[error("task is not assigned")]
    NotAssigned,
}

/// Permission types for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePermission {
    /// Any project role
    Participate,

    /// Owner only
    Own,
}

impl ResourcePermission {
    /// Gets the minimum role required for this permission
    pub fn min_role(&self) -> ProjectRole {
        match self {
            ResourcePermission::Participate => ProjectRole::Viewer,
            ResourcePermission::Own => ProjectRole::Owner,
        }
    }
}

/// Operation being authorized, with the facts it depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    /// Invite a user into the project
    InviteMember {
        /// Role the invited user already holds, if any
        target_role: Option<ProjectRole>,
    },

    /// Delete the project with its tasks and memberships
    DeleteProject,

    /// Delete a task
    DeleteTask,

    /// Set a task's assignee
    AssignTask {
        actor_id: Uuid,
        assignee_id: Uuid,
        /// Role the assignee holds in the task's project, if any
        assignee_role: Option<ProjectRole>,
        current_assignee: Option<Uuid>,
    },

    /// Clear a task's assignee
    UnassignTask {
        actor_id: Uuid,
        current_assignee: Option<Uuid>,
    },
}

impl ProjectAction {
    /// Base permission the actor needs before action-specific checks
    pub fn required_permission(&self) -> ResourcePermission {
        match self {
            ProjectAction::DeleteProject | ProjectAction::DeleteTask => ResourcePermission::Own,
            ProjectAction::InviteMember { .. }
            | ProjectAction::AssignTask { .. }
            | ProjectAction::UnassignTask { .. } => ResourcePermission::Participate,
        }
    }
}

/// Checks that a role meets a minimum role
pub fn require_role(actual: ProjectRole, required: ProjectRole) -> Result<(), AuthzError> {
    if !actual.has_permission(&required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }

    Ok(())
}

/// Decides whether an actor holding `actor_role` may perform `action`
///
/// `actor_role` is `None` when the actor is not a member of the project.
pub fn authorize(actor_role: Option<ProjectRole>, action: ProjectAction) -> Result<(), AuthzError> {
    let role = actor_role.ok_or(AuthzError::NotMember)?;

    match action {
        ProjectAction::InviteMember { target_role } => {
            require_role(role, action.required_permission().min_role())?;
            if target_role.is_some() {
                return Err(AuthzError::AlreadyMember);
            }
        }
        ProjectAction::DeleteProject | ProjectAction::DeleteTask => {
            require_role(role, action.required_permission().min_role())?;
        }
        ProjectAction::AssignTask {
            actor_id,
            assignee_id,
            assignee_role,
            current_assignee,
        } => {
            if assignee_role.is_none() {
                return Err(AuthzError::TargetNotMember);
            }
            if actor_id != assignee_id {
                require_role(role, ProjectRole::Owner)?;
            }
            if current_assignee == Some(assignee_id) {
                return Err(AuthzError::AlreadyAssigned);
            }
        }
        ProjectAction::UnassignTask {
            actor_id,
            current_assignee,
        } => match current_assignee {
            None => return Err(AuthzError::NotAssigned),
            Some(assignee) if assignee != actor_id => {
                require_role(role, ProjectRole::Owner)?;
            }
            Some(_) => {}
        },
    }

    Ok(())
}
