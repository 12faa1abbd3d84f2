/// User model and database operations
///
/// Users are the actors of every project and task operation. They are
/// registered once and referenced by id afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     country VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let mut conn = pool.acquire().await?;
///
/// let user = User::create(&mut conn, CreateUser {
///     email: "ana@example.com".to_string(),
///     name: "Ana".to_string(),
///     country: Some("PT".to_string()),
/// }).await?;
///
/// let found = User::find_by_id(&mut conn, user.id).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Optional country code or name
    pub country: Option<String>,

    /// When the user was registered
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub country: Option<String>,
}

impl User {
    /// Registers a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// already registered.
    pub async fn create(conn: &mut PgConnection, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, country)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, country, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.country)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, country, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// Checks whether a user exists
    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists)
    }

    /// Lists users, newest first
    pub async fn list(
        conn: &mut PgConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, country, created_at
            FROM users
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(users)
    }
}
