/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup and user lookup
/// - `projects`: Project lifecycle and invitations
/// - `tasks`: Task listing, creation, reorder, assignment and deletion
///
/// Request and response bodies use camelCase field names. The acting user
/// is named by `actorId` in the body or query string.

pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use serde::Deserialize;
use taskboard_shared::pagination::Page;
use uuid::Uuid;

/// `?limit=&offset=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::from_query(self.limit, self.offset)
    }
}

/// `?actorId=` query parameter for body-less mutations
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    pub actor_id: Uuid,
}
