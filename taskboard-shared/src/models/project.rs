/// Project model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a project does not cascade. Callers remove the project's tasks
/// and memberships first, inside the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::membership::ProjectMember;
use super::task::Task;

/// Project record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a project row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

/// Partial project update
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Project with its members and tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,

    /// Ordered by position
    pub tasks: Vec<Task>,
}

impl Project {
    /// Inserts a project row
    pub async fn create(conn: &mut PgConnection, data: NewProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .fetch_one(&mut *conn)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(project)
    }

    /// Takes a row lock on the project until the transaction ends
    ///
    /// Every transaction that rewrites task positions locks the project
    /// first, so position changes in one project are serialized. Returns
    /// `false` when the project does not exist.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(locked.is_some())
    }

    /// Checks whether a project exists
    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(exists)
    }

    /// Lists projects, newest first
    pub async fn list(
        conn: &mut PgConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, created_at
            FROM projects
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(projects)
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the project doesn't exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(conn, id).await;
        }

        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            assignments.push(format!("name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }

        let query = format!(
            "UPDATE projects SET {} WHERE id = $1 RETURNING id, name, description, created_at",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        let project = q.fetch_optional(&mut *conn).await?;

        Ok(project)
    }

    /// Deletes a project row
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
