/// User signup and lookup

use tracing::info;
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::error::{Resource, ServiceError, ServiceResult};
use crate::models::user::{CreateUser, User};
use crate::pagination::Page;
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a user
    ///
    /// Email and name are trimmed and must be non-blank; a blank country is
    /// stored as absent. A duplicate email is a conflict.
    pub async fn create(&self, input: CreateUser) -> ServiceResult<User> {
        let email = required_text("email", &input.email)?;
        let name = required_text("name", &input.name)?;
        let country = optional_text(input.country);

        let mut tx = self.store.begin().await?;
        let user = tx.insert_user(CreateUser { email, name, country }).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx.find_user(id).await?;
        tx.commit().await?;

        user.ok_or(ServiceError::NotFound(Resource::User))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<User>> {
        let page = Page::clamp(limit, offset);

        let mut tx = self.store.begin().await?;
        let users = tx.list_users(page).await?;
        tx.commit().await?;

        Ok(users)
    }
}
