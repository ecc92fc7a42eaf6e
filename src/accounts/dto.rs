use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::store::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public part of the user returned to the client. The hash is excluded by
/// construction, not by serializer annotation.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Response returned after a successful login. No token is issued.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
}
