//! Common fixtures for service tests
//!
//! A [`Fixture`] wires the three services to one store and offers helpers
//! to seed users, projects and tasks. It is generic over the store so the
//! same helpers drive the in-process store and PostgreSQL.

#![allow(dead_code)]

use std::env;

use taskboard_shared::models::project::Project;
use taskboard_shared::models::task::Task;
use taskboard_shared::models::user::{CreateUser, User};
use taskboard_shared::services::project::CreateProject;
use taskboard_shared::services::task::CreateTask;
use taskboard_shared::services::{ProjectService, TaskService, UserService};
use taskboard_shared::store::{MemoryStore, Store};
use uuid::Uuid;

pub struct Fixture<S> {
    pub store: S,
    pub users: UserService<S>,
    pub projects: ProjectService<S>,
    pub tasks: TaskService<S>,
}

impl Fixture<MemoryStore> {
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: Store> Fixture<S> {
    pub fn new(store: S) -> Self {
        Self {
            users: UserService::new(store.clone()),
            projects: ProjectService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
        }
    }

    /// Registers a user with a unique email
    pub async fn user(&self, name: &str) -> User {
        self.users
            .create(CreateUser {
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                name: name.to_string(),
                country: None,
            })
            .await
            .expect("failed to create user")
    }

    /// Creates a project owned by `owner`
    pub async fn project(&self, owner: &User) -> Project {
        self.projects
            .create(CreateProject {
                name: format!("Project {}", Uuid::new_v4()),
                description: None,
                owner_id: owner.id,
            })
            .await
            .expect("failed to create project")
    }

    /// Invites `user` into `project` on behalf of `inviter`
    pub async fn join(&self, project: &Project, inviter: &User, user: &User) {
        self.projects
            .invite(project.id, inviter.id, user.id)
            .await
            .expect("failed to invite member");
    }

    /// Appends tasks with the given titles
    pub async fn tasks(&self, project: &Project, titles: &[&str]) -> Vec<Task> {
        let mut created = Vec::new();
        for title in titles {
            let task = self
                .tasks
                .create_in_project(
                    project.id,
                    CreateTask {
                        title: title.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .expect("failed to create task");
            created.push(task);
        }
        created
    }

    /// Task titles in position order, asserting positions are `0..n`
    pub async fn titles(&self, project: &Project) -> Vec<String> {
        let tasks = self
            .tasks
            .list_by_project(project.id, 100, 0)
            .await
            .expect("failed to list tasks");

        for (index, view) in tasks.iter().enumerate() {
            assert_eq!(
                view.task.position, index as i32,
                "positions are not dense: {:?}",
                tasks.iter().map(|v| v.task.position).collect::<Vec<_>>()
            );
        }

        tasks.into_iter().map(|v| v.task.title).collect()
    }
}

/// Database URL for PostgreSQL-backed tests, `None` to skip them
pub fn database_url() -> Option<String> {
    match env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => Some(url),
        _ => {
            eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
            None
        }
    }
}
