/// In-process store
///
/// Holds every table in memory behind a `tokio::sync::Mutex`. A transaction
/// takes the lock for its whole lifetime and works on a copy of the state;
/// commit writes the copy back, drop discards it. Transactions are therefore
/// fully serialized.
///
/// The store enforces the same constraints as the PostgreSQL schema, so
/// service code that violates them fails here too:
///
/// - unique `(project_id, position)` after every statement
/// - `position >= 0`
/// - unique `(project_id, user_id)` membership and unique user email
/// - foreign keys from tasks and memberships to projects and users
///
/// [`MemoryStore::fail_next`] arms a one-shot failure inside the next
/// transaction, which is how rollback behavior is tested.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::error::{ConflictKind, ServiceError, ServiceResult};
use crate::models::membership::{CreateMembership, Membership, ProjectMember, ProjectRole};
use crate::models::project::{NewProject, Project, UpdateProject};
use crate::models::task::{Assignee, NewTask, Task, TaskView, UpdateTask};
use crate::models::user::{CreateUser, User};
use crate::pagination::Page;
use crate::reindex::PositionRange;

/// Operation that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertMembership,
    InsertTask,
    SetPosition,
    ShiftPositions,
    DeleteTask,
    DeleteTasksInProject,
    DeleteProject,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    // Insertion order doubles as creation order
    users: Vec<User>,
    projects: Vec<Project>,
    memberships: Vec<Membership>,
    tasks: Vec<Task>,
    armed: Option<FailPoint>,
}

/// Store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `point` fail inside the next transaction
    ///
    /// The failure is consumed by that transaction whether or not it reaches
    /// `point`.
    pub async fn fail_next(&self, point: FailPoint) {
        self.state.lock().await.armed = Some(point);
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fault: Option<FailPoint>,
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> ServiceResult<MemoryTx> {
        let mut guard = self.state.clone().lock_owned().await;
        let fault = guard.armed.take();
        let working = guard.clone();

        Ok(MemoryTx {
            guard,
            working,
            fault,
        })
    }

    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

fn foreign_key_violation(detail: &str) -> ServiceError {
    ServiceError::storage(format!("foreign key violation: {}", detail))
}

fn window<T: Clone>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    items.skip(offset).take(limit).collect()
}

impl MemoryTx {
    fn trip(&mut self, point: FailPoint) -> ServiceResult<()> {
        if self.fault == Some(point) {
            self.fault = None;
            return Err(ServiceError::storage(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.working.tasks.iter_mut().find(|t| t.id == id)
    }

    fn has_user(&self, id: Uuid) -> bool {
        self.working.users.iter().any(|u| u.id == id)
    }

    fn has_project(&self, id: Uuid) -> bool {
        self.working.projects.iter().any(|p| p.id == id)
    }

    fn sorted_tasks(&self, project_id: Uuid) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .working
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.position, t.created_at));
        tasks
    }

    // Mirrors the CHECK and UNIQUE constraints on tasks
    fn check_positions(&self, project_id: Uuid) -> ServiceResult<()> {
        let mut seen = HashSet::new();

        for task in self.working.tasks.iter().filter(|t| t.project_id == project_id) {
            if task.position < 0 {
                return Err(ServiceError::storage(format!(
                    "check constraint violated: position {} < 0",
                    task.position
                )));
            }
            if !seen.insert(task.position) {
                return Err(ServiceError::Conflict(ConflictKind::Constraint(
                    "tasks_project_position_key".to_string(),
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self) -> ServiceResult<()> {
        self.trip(FailPoint::Commit)?;
        *self.guard = self.working;
        Ok(())
    }

    async fn insert_user(&mut self, data: CreateUser) -> ServiceResult<User> {
        if self.working.users.iter().any(|u| u.email == data.email) {
            return Err(ServiceError::Conflict(ConflictKind::EmailTaken));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            country: data.country,
            created_at: Utc::now(),
        };
        self.working.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_exists(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(self.has_user(id))
    }

    async fn list_users(&mut self, page: Page) -> ServiceResult<Vec<User>> {
        Ok(window(self.working.users.iter().rev().cloned(), page))
    }

    async fn insert_project(&mut self, data: NewProject) -> ServiceResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            created_at: Utc::now(),
        };
        self.working.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&mut self, id: Uuid) -> ServiceResult<Option<Project>> {
        Ok(self.working.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn project_exists(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(self.has_project(id))
    }

    // Transactions already hold the whole store
    async fn lock_project(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(self.has_project(id))
    }

    async fn list_projects(&mut self, page: Page) -> ServiceResult<Vec<Project>> {
        Ok(window(self.working.projects.iter().rev().cloned(), page))
    }

    async fn update_project(
        &mut self,
        id: Uuid,
        data: UpdateProject,
    ) -> ServiceResult<Option<Project>> {
        let Some(project) = self.working.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = description;
        }

        Ok(Some(project.clone()))
    }

    async fn delete_project(&mut self, id: Uuid) -> ServiceResult<bool> {
        self.trip(FailPoint::DeleteProject)?;

        if self.working.tasks.iter().any(|t| t.project_id == id) {
            return Err(foreign_key_violation("tasks still reference project"));
        }
        if self.working.memberships.iter().any(|m| m.project_id == id) {
            return Err(foreign_key_violation("memberships still reference project"));
        }

        let before = self.working.projects.len();
        self.working.projects.retain(|p| p.id != id);
        Ok(self.working.projects.len() < before)
    }

    async fn insert_membership(&mut self, data: CreateMembership) -> ServiceResult<Membership> {
        self.trip(FailPoint::InsertMembership)?;

        if !self.has_project(data.project_id) {
            return Err(foreign_key_violation("membership project"));
        }
        if !self.has_user(data.user_id) {
            return Err(foreign_key_violation("membership user"));
        }
        if self
            .working
            .memberships
            .iter()
            .any(|m| m.project_id == data.project_id && m.user_id == data.user_id)
        {
            return Err(ServiceError::Conflict(ConflictKind::AlreadyMember));
        }

        let membership = Membership {
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            created_at: Utc::now(),
        };
        self.working.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn membership_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<Option<ProjectRole>> {
        Ok(self
            .working
            .memberships
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .map(|m| m.role))
    }

    async fn list_members(&mut self, project_id: Uuid) -> ServiceResult<Vec<ProjectMember>> {
        let members = self
            .working
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                self.working.users.iter().find(|u| u.id == m.user_id).map(|u| ProjectMember {
                    user_id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    role: m.role,
                })
            })
            .collect();

        Ok(members)
    }

    async fn delete_memberships_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64> {
        let before = self.working.memberships.len();
        self.working.memberships.retain(|m| m.project_id != project_id);
        Ok((before - self.working.memberships.len()) as u64)
    }

    async fn insert_task(&mut self, data: NewTask) -> ServiceResult<Task> {
        self.trip(FailPoint::InsertTask)?;

        if !self.has_project(data.project_id) {
            return Err(foreign_key_violation("task project"));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            position: data.position,
            title: data.title,
            description: data.description,
            status: data.status,
            assignee_id: None,
            created_at: now,
            updated_at: now,
        };
        self.working.tasks.push(task.clone());
        self.check_positions(task.project_id)?;
        Ok(task)
    }

    async fn find_task(&mut self, id: Uuid) -> ServiceResult<Option<Task>> {
        Ok(self.working.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn project_id_for_task(&mut self, id: Uuid) -> ServiceResult<Option<Uuid>> {
        Ok(self
            .working
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.project_id))
    }

    async fn assignee_of(&mut self, id: Uuid) -> ServiceResult<Option<Option<Uuid>>> {
        Ok(self
            .working
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.assignee_id))
    }

    async fn update_task(&mut self, id: Uuid, data: UpdateTask) -> ServiceResult<Option<Task>> {
        let Some(task) = self.task_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn set_assignee(&mut self, id: Uuid, user_id: Uuid) -> ServiceResult<Option<Task>> {
        if !self.has_user(user_id) {
            return Err(foreign_key_violation("task assignee"));
        }

        let Some(task) = self.task_mut(id) else {
            return Ok(None);
        };
        task.assignee_id = Some(user_id);
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn clear_assignee(&mut self, id: Uuid) -> ServiceResult<Option<Task>> {
        let Some(task) = self.task_mut(id) else {
            return Ok(None);
        };
        task.assignee_id = None;
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn list_tasks(&mut self, project_id: Uuid, page: Page) -> ServiceResult<Vec<TaskView>> {
        let tasks = window(self.sorted_tasks(project_id).into_iter(), page);

        let views = tasks
            .into_iter()
            .map(|task| {
                let assignee = task.assignee_id.and_then(|id| {
                    self.working.users.iter().find(|u| u.id == id).map(|u| Assignee {
                        user_id: u.id,
                        name: u.name.clone(),
                        email: u.email.clone(),
                    })
                });
                TaskView { task, assignee }
            })
            .collect();

        Ok(views)
    }

    async fn list_all_tasks(&mut self, project_id: Uuid) -> ServiceResult<Vec<Task>> {
        Ok(self.sorted_tasks(project_id))
    }

    async fn count_tasks(&mut self, project_id: Uuid) -> ServiceResult<i64> {
        let count = self
            .working
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .count();
        Ok(count as i64)
    }

    async fn max_position(&mut self, project_id: Uuid) -> ServiceResult<Option<i32>> {
        Ok(self
            .working
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.position)
            .max())
    }

    async fn set_position(&mut self, task_id: Uuid, position: i32) -> ServiceResult<bool> {
        self.trip(FailPoint::SetPosition)?;

        let Some(task) = self.task_mut(task_id) else {
            return Ok(false);
        };
        task.position = position;
        let project_id = task.project_id;

        self.check_positions(project_id)?;
        Ok(true)
    }

    async fn shift_positions(
        &mut self,
        project_id: Uuid,
        range: PositionRange,
        delta: i32,
        exclude: Uuid,
    ) -> ServiceResult<u64> {
        self.trip(FailPoint::ShiftPositions)?;

        let mut shifted = 0;
        for task in self.working.tasks.iter_mut().filter(|t| {
            t.project_id == project_id && t.id != exclude && range.contains(t.position)
        }) {
            task.position += delta;
            shifted += 1;
        }

        self.check_positions(project_id)?;
        Ok(shifted)
    }

    async fn delete_task(&mut self, id: Uuid) -> ServiceResult<bool> {
        self.trip(FailPoint::DeleteTask)?;

        let before = self.working.tasks.len();
        self.working.tasks.retain(|t| t.id != id);
        Ok(self.working.tasks.len() < before)
    }

    async fn delete_tasks_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64> {
        self.trip(FailPoint::DeleteTasksInProject)?;

        let before = self.working.tasks.len();
        self.working.tasks.retain(|t| t.project_id != project_id);
        Ok((before - self.working.tasks.len()) as u64)
    }
}
