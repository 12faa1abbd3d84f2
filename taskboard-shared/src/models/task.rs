/// Task model and database operations
///
/// A task belongs to exactly one project and carries a dense position
/// inside it: the positions of a project's `n` tasks are exactly
/// `0..n` with no gaps or duplicates. New tasks are appended at the end;
/// moves and deletions go through [`crate::reindex`].
///
/// # Status
///
/// ```text
/// todo | in_progress | done
/// ```
///
/// Any status may be set from any other; there is no transition graph.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     position INTEGER NOT NULL CHECK (position >= 0),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     assignee_id UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_project_position_key UNIQUE (project_id, position)
///         DEFERRABLE INITIALLY IMMEDIATE
/// );
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, project_id, position, title, description, status, assignee_id, created_at, updated_at";

/// Task workflow status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started (default for new tasks)
    #[default]
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Dense rank inside the project, starting at 0
    pub position: i32,

    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,

    /// At most one assignee
    pub assignee_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    /// Touched on every mutation of the task's own fields
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a task row at a known position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// Partial update of a task's own fields
///
/// Position changes are not part of this; they go through the reindexer.
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

/// Assignee summary embedded in task listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Task joined with its assignee's user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<Assignee>,
}

#[derive(sqlx::FromRow)]
struct TaskViewRow {
    id: Uuid,
    project_id: Uuid,
    position: i32,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    assignee_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

impl From<TaskViewRow> for TaskView {
    fn from(row: TaskViewRow) -> Self {
        let assignee = match (row.assignee_id, row.assignee_name, row.assignee_email) {
            (Some(user_id), Some(name), Some(email)) => Some(Assignee {
                user_id,
                name,
                email,
            }),
            _ => None,
        };

        TaskView {
            task: Task {
                id: row.id,
                project_id: row.project_id,
                position: row.position,
                title: row.title,
                description: row.description,
                status: row.status,
                assignee_id: row.assignee_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            assignee,
        }
    }
}

impl Task {
    /// Inserts a task row
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `tasks_project_position_key` if the
    /// position is already taken.
    pub async fn create(conn: &mut PgConnection, data: NewTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, position, title, description, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.position)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .fetch_one(&mut *conn)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(task)
    }

    /// Resolves the project a task belongs to
    pub async fn project_id_of(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let project_id: Option<Uuid> =
            sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(project_id)
    }

    /// Current assignee of a task
    ///
    /// Outer `None` means the task doesn't exist; inner `None` means it is
    /// unassigned.
    pub async fn assignee_of(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Option<Uuid>>, sqlx::Error> {
        let assignee: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT assignee_id FROM tasks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(assignee)
    }

    /// Applies a partial update to a task's own fields
    ///
    /// Always touches `updated_at`. Returns `None` if the task doesn't exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let task = q.fetch_optional(&mut *conn).await?;

        Ok(task)
    }

    /// Sets or clears the assignee
    ///
    /// Returns `None` if the task doesn't exist.
    pub async fn set_assignee(
        conn: &mut PgConnection,
        id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET assignee_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(task)
    }

    /// Lists a project's tasks by position with their assignees
    pub async fn list_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskViewRow>(
            r#"
            SELECT t.id, t.project_id, t.position, t.title, t.description, t.status,
                   t.assignee_id, t.created_at, t.updated_at,
                   u.name AS assignee_name, u.email AS assignee_email
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assignee_id
            WHERE t.project_id = $1
            ORDER BY t.position ASC, t.created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(TaskView::from).collect())
    }

    /// Lists every task of a project by position
    pub async fn list_all_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY position ASC, created_at ASC",
            TASK_COLUMNS
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(tasks)
    }

    /// Counts a project's tasks
    pub async fn count_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Highest position in a project, `None` when it has no tasks
    pub async fn max_position(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        let max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(position) FROM tasks WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(max)
    }

    /// Writes a task's position without touching anything else
    pub async fn set_position(
        conn: &mut PgConnection,
        id: Uuid,
        position: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(position)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds `delta` to every position in `start..=end` of a project,
    /// skipping `exclude`
    ///
    /// Returns the number of shifted tasks.
    pub async fn shift_positions(
        conn: &mut PgConnection,
        project_id: Uuid,
        start: i32,
        end: i32,
        delta: i32,
        exclude: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET position = position + $4
            WHERE project_id = $1 AND position BETWEEN $2 AND $3 AND id <> $5
            "#,
        )
        .bind(project_id)
        .bind(start)
        .bind(end)
        .bind(delta)
        .bind(exclude)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a task
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a project
    pub async fn delete_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
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
    fn test_status_default_is_todo() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("todo".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!(" done ".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("blocked".parse::<TaskStatus>().is_err());
        assert!("DONE".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let value = serde_json::to_value(TaskStatus::InProgress).unwrap();
        assert_eq!(value, serde_json::json!("in_progress"));
    }

    #[test]
    fn test_view_row_without_assignee() {
        let now = Utc::now();
        let row = TaskViewRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            position: 3,
            title: "Write docs".to_string(),
            description: None,
            status: TaskStatus::Todo,
            assignee_id: None,
            created_at: now,
            updated_at: now,
            assignee_name: None,
            assignee_email: None,
        };

        let view = TaskView::from(row);
        assert_eq!(view.task.position, 3);
        assert!(view.assignee.is_none());
    }

    #[test]
    fn test_view_row_with_assignee() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let row = TaskViewRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            position: 0,
            title: "Ship".to_string(),
            description: Some("v1".to_string()),
            status: TaskStatus::Done,
            assignee_id: Some(user_id),
            created_at: now,
            updated_at: now,
            assignee_name: Some("Ana".to_string()),
            assignee_email: Some("ana@example.com".to_string()),
        };

        let view = TaskView::from(row);
        let assignee = view.assignee.unwrap();
        assert_eq!(assignee.user_id, user_id);
        assert_eq!(assignee.name, "Ana");
    }
}
