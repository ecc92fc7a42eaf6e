use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub username: String,           // unique login name
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub role: String,               // free-form role label
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Fields for a record that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new user; the store assigns `id` and `created_at`.
    /// A taken username fails with `AppError::Conflict`.
    async fn save(&self, user: NewUser) -> AppResult<User>;

    /// Find a user by username. Absence is `Ok(None)`, not an error.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
}

pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn save(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            // the UNIQUE constraint is the arbiter for racing registrations
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(user.username.clone())
            }
            _ => AppError::from(e),
        })?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
