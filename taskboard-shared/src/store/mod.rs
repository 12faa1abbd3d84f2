/// Transactional repository boundary
///
/// Use cases talk to persistence only through these two traits. A
/// [`Store`] hands out transactions; a [`StoreTx`] performs reads and
/// writes against one consistent snapshot and is committed explicitly.
/// Dropping a transaction without calling [`StoreTx::commit`] rolls it
/// back, so every early `?` return in a use case leaves storage untouched.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: sqlx transactions over a `PgPool`
/// - [`memory::MemoryStore`]: in-process store with the same constraint
///   semantics, used by tests and local runs without a database
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::store::{Store, StoreTx};
/// use taskboard_shared::error::ServiceResult;
/// use uuid::Uuid;
///
/// async fn project_is_empty<S: Store>(store: &S, project_id: Uuid) -> ServiceResult<bool> {
///     let mut tx = store.begin().await?;
///     let count = tx.count_tasks(project_id).await?;
///     tx.commit().await?;
///     Ok(count == 0)
/// }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::models::membership::{CreateMembership, Membership, ProjectMember, ProjectRole};
use crate::models::project::{NewProject, Project, UpdateProject};
use crate::models::task::{NewTask, Task, TaskView, UpdateTask};
use crate::models::user::{CreateUser, User};
use crate::pagination::Page;
use crate::reindex::PositionRange;

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Source of transactions
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    /// Opens a transaction
    async fn begin(&self) -> ServiceResult<Self::Tx>;

    /// Checks that the backing storage is reachable
    async fn ping(&self) -> ServiceResult<()>;
}

/// One open transaction
///
/// All methods run inside the transaction. Nothing is visible to other
/// transactions until [`StoreTx::commit`] succeeds.
#[async_trait]
pub trait StoreTx: Send + Sized {
    /// Makes every write of this transaction durable
    async fn commit(self) -> ServiceResult<()>;

    // Users

    async fn insert_user(&mut self, data: CreateUser) -> ServiceResult<User>;

    async fn find_user(&mut self, id: Uuid) -> ServiceResult<Option<User>>;

    async fn user_exists(&mut self, id: Uuid) -> ServiceResult<bool>;

    /// Newest first
    async fn list_users(&mut self, page: Page) -> ServiceResult<Vec<User>>;

    // Projects

    async fn insert_project(&mut self, data: NewProject) -> ServiceResult<Project>;

    async fn find_project(&mut self, id: Uuid) -> ServiceResult<Option<Project>>;

    async fn project_exists(&mut self, id: Uuid) -> ServiceResult<bool>;

    /// Locks the project against concurrent position changes until commit
    /// or rollback; `false` if it does not exist
    async fn lock_project(&mut self, id: Uuid) -> ServiceResult<bool>;

    /// Newest first
    async fn list_projects(&mut self, page: Page) -> ServiceResult<Vec<Project>>;

    async fn update_project(
        &mut self,
        id: Uuid,
        data: UpdateProject,
    ) -> ServiceResult<Option<Project>>;

    /// Fails if tasks or memberships still reference the project
    async fn delete_project(&mut self, id: Uuid) -> ServiceResult<bool>;

    // Memberships

    /// Fails with `Conflict(AlreadyMember)` on a duplicate
    async fn insert_membership(&mut self, data: CreateMembership) -> ServiceResult<Membership>;

    async fn membership_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<Option<ProjectRole>>;

    async fn list_members(&mut self, project_id: Uuid) -> ServiceResult<Vec<ProjectMember>>;

    async fn delete_memberships_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64>;

    // Tasks

    /// Fails with a conflict if the position is taken
    async fn insert_task(&mut self, data: NewTask) -> ServiceResult<Task>;

    async fn find_task(&mut self, id: Uuid) -> ServiceResult<Option<Task>>;

    async fn project_id_for_task(&mut self, id: Uuid) -> ServiceResult<Option<Uuid>>;

    /// Outer `None`: no such task. Inner `None`: unassigned.
    async fn assignee_of(&mut self, id: Uuid) -> ServiceResult<Option<Option<Uuid>>>;

    /// Updates title/description/status and touches `updated_at`
    async fn update_task(&mut self, id: Uuid, data: UpdateTask) -> ServiceResult<Option<Task>>;

    /// Touches `updated_at`; fails if the user doesn't exist
    async fn set_assignee(&mut self, id: Uuid, user_id: Uuid) -> ServiceResult<Option<Task>>;

    /// Touches `updated_at`
    async fn clear_assignee(&mut self, id: Uuid) -> ServiceResult<Option<Task>>;

    /// Ordered by position
    async fn list_tasks(&mut self, project_id: Uuid, page: Page) -> ServiceResult<Vec<TaskView>>;

    /// Ordered by position
    async fn list_all_tasks(&mut self, project_id: Uuid) -> ServiceResult<Vec<Task>>;

    async fn count_tasks(&mut self, project_id: Uuid) -> ServiceResult<i64>;

    async fn max_position(&mut self, project_id: Uuid) -> ServiceResult<Option<i32>>;

    async fn set_position(&mut self, task_id: Uuid, position: i32) -> ServiceResult<bool>;

    /// Adds `delta` to every position in `range`, skipping `exclude`
    async fn shift_positions(
        &mut self,
        project_id: Uuid,
        range: PositionRange,
        delta: i32,
        exclude: Uuid,
    ) -> ServiceResult<u64>;

    async fn delete_task(&mut self, id: Uuid) -> ServiceResult<bool>;

    async fn delete_tasks_in_project(&mut self, project_id: Uuid) -> ServiceResult<u64>;
}
