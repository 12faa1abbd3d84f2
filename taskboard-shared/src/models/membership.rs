/// Project membership model and database operations
///
/// A membership links a user to a project with a role. Creating a project
/// inserts the creator as owner; invitations add plain members.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('owner', 'member', 'viewer');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT project_members_pkey PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: delete the project, delete tasks, assign tasks to anyone
/// - **member**: create and edit tasks, invite, assign tasks to themselves
/// - **viewer**: same permissions as member
///
/// All queries take a `&mut PgConnection` so they compose inside a single
/// transaction (`&mut *tx`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Role a user holds inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Created the project; holds every permission
    Owner,

    /// Invited collaborator
    Member,

    /// Read-mostly collaborator (permissions match member)
    Viewer,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Member => "member",
            ProjectRole::Viewer => "viewer",
        }
    }

    /// Checks if this role has permission level of the required role
    ///
    /// Hierarchy: Owner > Member = Viewer
    pub fn has_permission(&self, required: &ProjectRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            ProjectRole::Owner => 2,
            ProjectRole::Member | ProjectRole::Viewer => 1,
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub project_id: Uuid,
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

/// Member listing entry joined with the user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
}

impl Membership {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `project_members_pkey` when the user
    /// is already a member, or a foreign key violation when either side is
    /// missing.
    pub async fn create(
        conn: &mut PgConnection,
        data: CreateMembership,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(&mut *conn)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in a project, `None` if they are not a member
    pub async fn get_role(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(role)
    }

    /// Lists a project's members with their names, oldest membership first
    pub async fn list_members(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT m.user_id, u.name, u.email, m.role
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC, u.email ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(members)
    }

    /// Deletes every membership of a project
    ///
    /// Returns the number of memberships removed.
    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(ProjectRole::Owner.as_str(), "owner");
        assert_eq!(ProjectRole::Member.as_str(), "member");
        assert_eq!(ProjectRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_permission_hierarchy() {
        assert!(ProjectRole::Owner.has_permission(&ProjectRole::Member));
        assert!(ProjectRole::Member.has_permission(&ProjectRole::Viewer));
        assert!(ProjectRole::Viewer.has_permission(&ProjectRole::Member));
        assert!(!ProjectRole::Member.has_permission(&ProjectRole::Owner));
        assert!(!ProjectRole::Viewer.has_permission(&ProjectRole::Owner));
    }

    #[test]
    fn test_default_role_is_member() {
        let data: CreateMembership = serde_json::from_value(serde_json::json!({
            "project_id": Uuid::nil(),
            "user_id": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(data.role, ProjectRole::Member);
    }
}
