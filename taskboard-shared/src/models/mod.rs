/// Database models for Taskboard
///
/// This module contains the persisted entities and their queries.
///
/// # Models
///
/// - `user`: Registered users
/// - `project`: Projects
/// - `membership`: User-project relationships with roles
/// - `task`: Positioned tasks owned by a project
///
/// Every query takes `&mut PgConnection`, so a caller can run several of
/// them inside one transaction:
///
/// ```no_run
/// use taskboard_shared::models::project::{Project, NewProject};
/// use taskboard_shared::models::membership::{Membership, CreateMembership, ProjectRole};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
///
/// let project = Project::create(&mut *tx, NewProject {
///     name: "Launch".to_string(),
///     description: None,
/// }).await?;
///
/// Membership::create(&mut *tx, CreateMembership {
///     project_id: project.id,
///     user_id: owner_id,
///     role: ProjectRole::Owner,
/// }).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod project;
pub mod task;
pub mod user;
