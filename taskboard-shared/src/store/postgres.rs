/// PostgreSQL store
///
/// Each transaction owns a pooled connection through
/// `sqlx::Transaction`, which rolls back when dropped uncommitted. Every
/// operation delegates to the model queries with `&mut *self.tx`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::db::pool::health_check;
use crate::error::ServiceResult;
use crate::models::membership::{CreateMembership, Membership, ProjectMember, ProjectRole};
use crate::models::project::{NewProject, Project, UpdateProject};
use crate::models::task::{NewTask, Task, TaskView, UpdateTask};
use crate::models::user::{CreateUser, User};
use crate::pagination::Page;
use crate::reindex::PositionRange;

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Open PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> ServiceResult<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> ServiceResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self) -> ServiceResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn insert_user(&mut self, data: CreateUser) -> ServiceResult<User> {
        Ok(User::create(&mut *self.tx, data).await?)
    }

    async fn find_user(&mut self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(User::find_by_id(&mut *self.tx, id).await?)
    }

    async fn user_exists(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(User::exists(&mut *self.tx, id).await?)
    }

    async fn list_users(&mut self, page: Page) -> ServiceResult<Vec<User>> {
        Ok(User::list(&mut *self.tx, page.limit, page.offset).await?)
    }

    async fn insert_project(&mut self, data: NewProject) -> ServiceResult<Project> {
        Ok(Project::create(&mut *self.tx, data).await?)
    }

    async fn find_project(&mut self, id: Uuid) -> ServiceResult<Option<Project>> {
        Ok(Project::find_by_id(&mut *self.tx, id).await?)
    }

    async fn project_exists(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(Project::exists(&mut *self.tx, id).await?)
    }

    async fn lock_project(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(Project::lock(&mut *self.tx, id).await?)
    }

    async fn list_projects(&mut self, page: Page) -> ServiceResult<Vec<Project>> {
        Ok(Project::list(&mut *self.tx, page.limit, page.offset).await?)
    }

    async fn update_project(
        &mut self,
        id: Uuid,
        data: UpdateProject,
    ) -> ServiceResult<Option<Project>> {
        Ok(Project::update(&mut *self.tx, id, data).await?)
    }

    async fn delete_project(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(Project::delete(&mut *self.tx, id).await?)
    }

    async fn insert_membership(&mut self, data: CreateMembership) -> ServiceResult<Membership> {
        Ok(Membership::create(&mut *self.tx, data).await?)
    }

    async fn membership_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<Option<ProjectRole>> {
        Ok(Membership::get_role(&mut *self.tx, project_id, user_id).await?)
    }

    async fn list_members(&mut self, project_id: Uuid) -> ServiceResult<Vec<ProjectMember>> {
        Ok(Membership::list_members(&mut *self.tx, project_id).await?)
    }

    async fn delete_memberships_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64> {
        Ok(Membership::delete_by_project(&mut *self.tx, project_id).await?)
    }

    async fn insert_task(&mut self, data: NewTask) -> ServiceResult<Task> {
        Ok(Task::create(&mut *self.tx, data).await?)
    }

    async fn find_task(&mut self, id: Uuid) -> ServiceResult<Option<Task>> {
        Ok(Task::find_by_id(&mut *self.tx, id).await?)
    }

    async fn project_id_for_task(&mut self, id: Uuid) -> ServiceResult<Option<Uuid>> {
        Ok(Task::project_id_of(&mut *self.tx, id).await?)
    }

    async fn assignee_of(&mut self, id: Uuid) -> ServiceResult<Option<Option<Uuid>>> {
        Ok(Task::assignee_of(&mut *self.tx, id).await?)
    }

    async fn update_task(&mut self, id: Uuid, data: UpdateTask) -> ServiceResult<Option<Task>> {
        Ok(Task::update(&mut *self.tx, id, data).await?)
    }

    async fn set_assignee(&mut self, id: Uuid, user_id: Uuid) -> ServiceResult<Option<Task>> {
        Ok(Task::set_assignee(&mut *self.tx, id, Some(user_id)).await?)
    }

    async fn clear_assignee(&mut self, id: Uuid) -> ServiceResult<Option<Task>> {
        Ok(Task::set_assignee(&mut *self.tx, id, None).await?)
    }

    async fn list_tasks(&mut self, project_id: Uuid, page: Page) -> ServiceResult<Vec<TaskView>> {
        Ok(Task::list_by_project(&mut *self.tx, project_id, page.limit, page.offset).await?)
    }

    async fn list_all_tasks(&mut self, project_id: Uuid) -> ServiceResult<Vec<Task>> {
        Ok(Task::list_all_by_project(&mut *self.tx, project_id).await?)
    }

    async fn count_tasks(&mut self, project_id: Uuid) -> ServiceResult<i64> {
        Ok(Task::count_by_project(&mut *self.tx, project_id).await?)
    }

    async fn max_position(&mut self, project_id: Uuid) -> ServiceResult<Option<i32>> {
        Ok(Task::max_position(&mut *self.tx, project_id).await?)
    }

    async fn set_position(&mut self, task_id: Uuid, position: i32) -> ServiceResult<bool> {
        Ok(Task::set_position(&mut *self.tx, task_id, position).await?)
    }

    async fn shift_positions(
        &mut self,
        project_id: Uuid,
        range: PositionRange,
        delta: i32,
        exclude: Uuid,
    ) -> ServiceResult<u64> {
        Ok(Task::shift_positions(
            &mut *self.tx,
            project_id,
            range.start,
            range.end,
            delta,
            exclude,
        )
        .await?)
    }

    async fn delete_task(&mut self, id: Uuid) -> ServiceResult<bool> {
        Ok(Task::delete(&mut *self.tx, id).await?)
    }

    async fn delete_tasks_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64> {
        Ok(Task::delete_by_project(&mut *self.tx, project_id).await?)
    }
}
