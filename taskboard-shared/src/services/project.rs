/// Project use cases
///
/// Creation makes the creator the project's owner in the same transaction.
/// Deletion is owner-only and removes tasks, then memberships, then the
/// project row.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{clearable_text, optional_text, required_text};
use crate::auth::authorization::{authorize, ProjectAction};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::models::membership::{CreateMembership, Membership, ProjectRole};
use crate::models::project::{NewProject, Project, ProjectDetails, UpdateProject};
use crate::pagination::Page;
use crate::store::{Store, StoreTx};

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,

    /// Becomes the project's owner
    pub owner_id: Uuid,
}

/// Partial project edit as received from a caller
///
/// A blank description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectService<S> {
    store: S,
}

impl<S: Store> ProjectService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a project owned by `input.owner_id`
    pub async fn create(&self, input: CreateProject) -> ServiceResult<Project> {
        let name = required_text("name", &input.name)?;
        let description = optional_text(input.description);

        let mut tx = self.store.begin().await?;

        if !tx.user_exists(input.owner_id).await? {
            return Err(ServiceError::NotFound(Resource::User));
        }

        let project = tx.insert_project(NewProject { name, description }).await?;
        tx.insert_membership(CreateMembership {
            project_id: project.id,
            user_id: input.owner_id,
            role: ProjectRole::Owner,
        })
        .await?;

        tx.commit().await?;

        info!(project_id = %project.id, owner_id = %input.owner_id, "Project created");
        Ok(project)
    }

    /// Loads a project with its members and position-ordered tasks
    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<ProjectDetails> {
        let mut tx = self.store.begin().await?;

        let project = tx
            .find_project(id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Project))?;
        let members = tx.list_members(id).await?;
        let tasks = tx.list_all_tasks(id).await?;

        tx.commit().await?;

        Ok(ProjectDetails {
            project,
            members,
            tasks,
        })
    }

    pub async fn update(&self, id: Uuid, changes: ProjectChanges) -> ServiceResult<Project> {
        let name = match changes.name {
            Some(name) => Some(required_text("name", &name)?),
            None => None,
        };
        let update = UpdateProject {
            name,
            description: clearable_text(changes.description),
        };

        let mut tx = self.store.begin().await?;
        let project = tx
            .update_project(id, update)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Project))?;
        tx.commit().await?;

        debug!(project_id = %id, "Project updated");
        Ok(project)
    }

    /// Lists projects newest first
    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Project>> {
        let page = Page::clamp(limit, offset);

        let mut tx = self.store.begin().await?;
        let projects = tx.list_projects(page).await?;
        tx.commit().await?;

        Ok(projects)
    }

    /// Adds `user_id` to the project as a member on behalf of `inviter_id`
    ///
    /// Checks run in order: project exists, user exists, inviter is a member,
    /// user is not yet a member.
    pub async fn invite(
        &self,
        project_id: Uuid,
        inviter_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<Membership> {
        let mut tx = self.store.begin().await?;

        if !tx.project_exists(project_id).await? {
            return Err(ServiceError::NotFound(Resource::Project));
        }
        if !tx.user_exists(user_id).await? {
            return Err(ServiceError::NotFound(Resource::User));
        }

        let inviter_role = tx.membership_role(project_id, inviter_id).await?;
        let target_role = tx.membership_role(project_id, user_id).await?;
        authorize(inviter_role, ProjectAction::InviteMember { target_role })?;

        let membership = tx
            .insert_membership(CreateMembership {
                project_id,
                user_id,
                role: ProjectRole::Member,
            })
            .await?;

        tx.commit().await?;

        info!(%project_id, %inviter_id, %user_id, "Member invited");
        Ok(membership)
    }

    /// Deletes a project with all its tasks and memberships
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;

        if !tx.lock_project(id).await? {
            return Err(ServiceError::NotFound(Resource::Project));
        }

        let role = tx.membership_role(id, actor_id).await?;
        authorize(role, ProjectAction::DeleteProject)?;

        let tasks = tx.delete_tasks_in_project(id).await?;
        let memberships = tx.delete_memberships_in_project(id).await?;
        tx.delete_project(id).await?;

        tx.commit().await?;

        info!(project_id = %id, %actor_id, tasks, memberships, "Project deleted");
        Ok(())
    }
}
