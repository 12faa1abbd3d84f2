/// Task use cases
///
/// New tasks are appended after the current last position. Updates may
/// carry a new position, in which case the field changes and the reindex
/// commit together. Deleting a task closes the gap it leaves.
///
/// Appends, moves and deletes lock the project row first, so position
/// changes within one project never interleave.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{clearable_text, optional_text, required_text};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::models::task::{NewTask, Task, TaskStatus, TaskView, UpdateTask};
use crate::pagination::Page;
use crate::reindex;
use crate::store::{Store, StoreTx};

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,

    /// Absent or blank means `todo`
    pub status: Option<String>,
}

/// Partial task edit as received from a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,

    /// Blank clears the description
    pub description: Option<String>,
    pub status: Option<String>,

    /// Requested position; clamped into the project's range
    pub position: Option<i64>,
}

fn parse_status(value: &str) -> ServiceResult<TaskStatus> {
    TaskStatus::from_str(value).map_err(|e| ServiceError::validation("status", e.to_string()))
}

#[derive(Debug, Clone)]
pub struct TaskService<S> {
    store: S,
}

impl<S: Store> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists a project's tasks by position, with assignee details
    pub async fn list_by_project(
        &self,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<TaskView>> {
        let page = Page::clamp(limit, offset);

        let mut tx = self.store.begin().await?;
        if !tx.project_exists(project_id).await? {
            return Err(ServiceError::NotFound(Resource::Project));
        }
        let tasks = tx.list_tasks(project_id, page).await?;
        tx.commit().await?;

        Ok(tasks)
    }

    /// Appends a task to the end of a project
    pub async fn create_in_project(
        &self,
        project_id: Uuid,
        input: CreateTask,
    ) -> ServiceResult<Task> {
        let title = required_text("title", &input.title)?;
        let description = optional_text(input.description);
        let status = match optional_text(input.status) {
            Some(status) => parse_status(&status)?,
            None => TaskStatus::default(),
        };

        let mut tx = self.store.begin().await?;

        if !tx.lock_project(project_id).await? {
            return Err(ServiceError::NotFound(Resource::Project));
        }

        let position = tx
            .max_position(project_id)
            .await?
            .map_or(0, |max| max + 1);

        let task = tx
            .insert_task(NewTask {
                project_id,
                position,
                title,
                description,
                status,
            })
            .await?;

        tx.commit().await?;

        info!(task_id = %task.id, %project_id, position, "Task created");
        Ok(task)
    }

    /// Edits a task and optionally moves it
    pub async fn update(&self, id: Uuid, changes: TaskChanges) -> ServiceResult<Task> {
        let title = match changes.title {
            Some(title) => Some(required_text("title", &title)?),
            None => None,
        };
        let status = match changes.status {
            Some(status) => Some(parse_status(&status)?),
            None => None,
        };
        if let Some(position) = changes.position {
            if position < 0 {
                return Err(ServiceError::validation(
                    "position",
                    "position must be non-negative",
                ));
            }
        }
        let update = UpdateTask {
            title,
            description: clearable_text(changes.description),
            status,
        };

        let mut tx = self.store.begin().await?;

        if changes.position.is_some() {
            let project_id = tx
                .project_id_for_task(id)
                .await?
                .ok_or(ServiceError::NotFound(Resource::Task))?;
            if !tx.lock_project(project_id).await? {
                return Err(ServiceError::NotFound(Resource::Task));
            }
        }

        // Read after the lock so the position reflects every committed move
        let current = tx
            .find_task(id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        let mut task = tx
            .update_task(id, update)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        if let Some(requested) = changes.position {
            task.position = reindex::move_task(&mut tx, &current, requested).await?;
        }

        tx.commit().await?;

        debug!(task_id = %id, position = task.position, "Task updated");
        Ok(task)
    }

    /// Assigns `user_id` to a task on behalf of `actor_id`
    ///
    /// Members may assign themselves; assigning someone else requires the
    /// owner role. The assignee must belong to the task's project.
    pub async fn assign(&self, task_id: Uuid, actor_id: Uuid, user_id: Uuid) -> ServiceResult<Task> {
        let mut tx = self.store.begin().await?;

        let project_id = tx
            .project_id_for_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        if !tx.user_exists(user_id).await? {
            return Err(ServiceError::NotFound(Resource::User));
        }

        let actor_role = tx.membership_role(project_id, actor_id).await?;
        let assignee_role = tx.membership_role(project_id, user_id).await?;
        let current_assignee = tx.assignee_of(task_id).await?.flatten();

        authorize(
            actor_role,
            ProjectAction::AssignTask {
                actor_id,
                assignee_id: user_id,
                assignee_role,
                current_assignee,
            },
        )?;

        let task = tx
            .set_assignee(task_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        tx.commit().await?;

        info!(%task_id, %actor_id, assignee_id = %user_id, "Task assigned");
        Ok(task)
    }

    /// Clears a task's assignee
    ///
    /// Members may clear their own assignment; clearing anyone else's
    /// requires the owner role.
    pub async fn unassign(&self, task_id: Uuid, actor_id: Uuid) -> ServiceResult<Task> {
        let mut tx = self.store.begin().await?;

        let project_id = tx
            .project_id_for_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        let actor_role = tx.membership_role(project_id, actor_id).await?;
        let current_assignee = tx.assignee_of(task_id).await?.flatten();

        authorize(
            actor_role,
            ProjectAction::UnassignTask {
                actor_id,
                current_assignee,
            },
        )?;

        let task = tx
            .clear_assignee(task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        tx.commit().await?;

        info!(%task_id, %actor_id, "Task unassigned");
        Ok(task)
    }

    /// Deletes a task (owner only) and compacts later positions
    pub async fn delete(&self, task_id: Uuid, actor_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;

        let project_id = tx
            .project_id_for_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;
        if !tx.lock_project(project_id).await? {
            return Err(ServiceError::NotFound(Resource::Task));
        }

        let task = tx
            .find_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))?;

        let role = tx.membership_role(task.project_id, actor_id).await?;
        authorize(role, ProjectAction::DeleteTask)?;

        reindex::remove_task(&mut tx, &task).await?;

        tx.commit().await?;

        info!(%task_id, project_id = %task.project_id, %actor_id, "Task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_maps_to_validation() {
        assert_eq!(parse_status("done").unwrap(), TaskStatus::Done);
        assert!(matches!(
            parse_status("archived"),
            Err(ServiceError::Validation { field: "status", .. })
        ));
    }
}
