/// Project and user use case tests against the in-process store

mod common;

use common::Fixture;
use taskboard_shared::auth::authorization::AuthzError;
use taskboard_shared::error::{ConflictKind, Resource, ServiceError};
use taskboard_shared::models::membership::ProjectRole;
use taskboard_shared::models::user::CreateUser;
use taskboard_shared::services::project::{CreateProject, ProjectChanges};
use taskboard_shared::store::FailPoint;
use uuid::Uuid;

#[tokio::test]
async fn test_create_makes_creator_owner() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;

    let project = fx
        .projects
        .create(CreateProject {
            name: "  Launch  ".to_string(),
            description: Some("Q3 launch".to_string()),
            owner_id: owner.id,
        })
        .await
        .unwrap();
    assert_eq!(project.name, "Launch");

    let details = fx.projects.get_by_id(project.id).await.unwrap();
    assert_eq!(details.project.description.as_deref(), Some("Q3 launch"));
    assert_eq!(details.members.len(), 1);
    assert_eq!(details.members[0].user_id, owner.id);
    assert_eq!(details.members[0].role, ProjectRole::Owner);
    assert!(details.tasks.is_empty());
}

#[tokio::test]
async fn test_create_validation_and_missing_owner() {
    let fx = Fixture::memory();

    let err = fx
        .projects
        .create(CreateProject {
            name: "   ".to_string(),
            description: None,
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { field: "name", .. }));

    let err = fx
        .projects
        .create(CreateProject {
            name: "Launch".to_string(),
            description: None,
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found(Resource::User));
    assert!(fx.projects.list(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_owner_membership_rolls_back_project() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;

    fx.store.fail_next(FailPoint::InsertMembership).await;
    let result = fx
        .projects
        .create(CreateProject {
            name: "Launch".to_string(),
            description: None,
            owner_id: owner.id,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::Storage(_))));
    assert!(fx.projects.list(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_project() {
    let fx = Fixture::memory();
    let err = fx.projects.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found(Resource::Project));
}

#[tokio::test]
async fn test_details_list_tasks_by_position() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let project = fx.project(&owner).await;
    let tasks = fx.tasks(&project, &["A", "B", "C"]).await;

    fx.tasks
        .update(
            tasks[2].id,
            taskboard_shared::services::task::TaskChanges {
                position: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let details = fx.projects.get_by_id(project.id).await.unwrap();
    let titles: Vec<&str> = details.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_update_partial_fields() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let project = fx
        .projects
        .create(CreateProject {
            name: "Launch".to_string(),
            description: Some("first".to_string()),
            owner_id: owner.id,
        })
        .await
        .unwrap();

    let renamed = fx
        .projects
        .update(
            project.id,
            ProjectChanges {
                name: Some("Relaunch".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Relaunch");
    assert_eq!(renamed.description.as_deref(), Some("first"));

    let cleared = fx
        .projects
        .update(
            project.id,
            ProjectChanges {
                name: None,
                description: Some("  ".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.name, "Relaunch");
    assert_eq!(cleared.description, None);

    let err = fx
        .projects
        .update(
            project.id,
            ProjectChanges {
                name: Some("".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { field: "name", .. }));

    let err = fx
        .projects
        .update(Uuid::new_v4(), ProjectChanges::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found(Resource::Project));
}

#[tokio::test]
async fn test_list_newest_first_with_paging() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let first = fx.project(&owner).await;
    let second = fx.project(&owner).await;
    let third = fx.project(&owner).await;

    let all = fx.projects.list(500, -1).await.unwrap();
    let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let page = fx.projects.list(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);
}

#[tokio::test]
async fn test_invite_adds_member() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let member = fx.user("Member").await;
    let project = fx.project(&owner).await;

    let membership = fx.projects.invite(project.id, owner.id, member.id).await.unwrap();
    assert_eq!(membership.role, ProjectRole::Member);
    assert_eq!(membership.user_id, member.id);

    // Members may invite too
    let third = fx.user("Third").await;
    fx.projects.invite(project.id, member.id, third.id).await.unwrap();

    let details = fx.projects.get_by_id(project.id).await.unwrap();
    assert_eq!(details.members.len(), 3);
}

#[tokio::test]
async fn test_duplicate_invite_conflicts() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let member = fx.user("Member").await;
    let project = fx.project(&owner).await;
    fx.join(&project, &owner, &member).await;

    let err = fx.projects.invite(project.id, owner.id, member.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ConflictKind::AlreadyMember)));

    let details = fx.projects.get_by_id(project.id).await.unwrap();
    assert_eq!(details.members.len(), 2);
}

#[tokio::test]
async fn test_invite_check_order() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let outsider = fx.user("Outsider").await;
    let target = fx.user("Target").await;
    let project = fx.project(&owner).await;

    // Missing project wins over everything
    let err = fx
        .projects
        .invite(Uuid::new_v4(), outsider.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found(Resource::Project));

    // Missing user before membership checks
    let err = fx
        .projects
        .invite(project.id, outsider.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found(Resource::User));

    // Non-member inviter before duplicate target
    let err = fx.projects.invite(project.id, outsider.id, owner.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(AuthzError::NotMember)));

    let err = fx.projects.invite(project.id, outsider.id, target.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(AuthzError::NotMember)));
}

#[tokio::test]
async fn test_delete_cascades() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let member = fx.user("Member").await;
    let project = fx.project(&owner).await;
    let other = fx.project(&owner).await;
    fx.join(&project, &owner, &member).await;
    let tasks = fx.tasks(&project, &["A", "B"]).await;
    fx.tasks(&other, &["Keep"]).await;
    fx.tasks.assign(tasks[0].id, member.id, member.id).await.unwrap();

    fx.projects.delete(project.id, owner.id).await.unwrap();

    let err = fx.projects.get_by_id(project.id).await.unwrap_err();
    assert!(err.is_not_found(Resource::Project));

    let err = fx.tasks.assign(tasks[1].id, owner.id, owner.id).await.unwrap_err();
    assert!(err.is_not_found(Resource::Task));

    // The owner can no longer act on the deleted project's membership
    let err = fx.projects.invite(project.id, owner.id, member.id).await.unwrap_err();
    assert!(err.is_not_found(Resource::Project));

    assert_eq!(fx.titles(&other).await, vec!["Keep"]);
}

#[tokio::test]
async fn test_delete_requires_owner() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let member = fx.user("Member").await;
    let project = fx.project(&owner).await;
    fx.join(&project, &owner, &member).await;

    let err = fx.projects.delete(project.id, member.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(AuthzError::InsufficientRole {
            required: ProjectRole::Owner,
            actual: ProjectRole::Member,
        })
    ));

    let err = fx.projects.delete(Uuid::new_v4(), owner.id).await.unwrap_err();
    assert!(err.is_not_found(Resource::Project));

    assert!(fx.projects.get_by_id(project.id).await.is_ok());
}

#[tokio::test]
async fn test_failed_delete_keeps_everything() {
    let fx = Fixture::memory();
    let owner = fx.user("Owner").await;
    let project = fx.project(&owner).await;
    fx.tasks(&project, &["A", "B"]).await;

    fx.store.fail_next(FailPoint::DeleteProject).await;
    assert!(fx.projects.delete(project.id, owner.id).await.is_err());

    let details = fx.projects.get_by_id(project.id).await.unwrap();
    assert_eq!(details.members.len(), 1);
    assert_eq!(details.tasks.len(), 2);
}

#[tokio::test]
async fn test_user_signup_and_lookup() {
    let fx = Fixture::memory();

    let user = fx
        .users
        .create(CreateUser {
            email: " ana@example.com ".to_string(),
            name: "Ana".to_string(),
            country: Some("".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.country, None);

    let found = fx.users.get_by_id(user.id).await.unwrap();
    assert_eq!(found, user);

    let err = fx
        .users
        .create(CreateUser {
            email: "ana@example.com".to_string(),
            name: "Other Ana".to_string(),
            country: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ConflictKind::EmailTaken)));

    let err = fx.users.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found(Resource::User));

    let err = fx
        .users
        .create(CreateUser {
            email: "bo@example.com".to_string(),
            name: " ".to_string(),
            country: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { field: "name", .. }));

    let users = fx.users.list(0, 0).await.unwrap();
    assert_eq!(users.len(), 1);
}
