use std::sync::Arc;

use tracing::info;

use crate::accounts::password::{hash_password, verify_password};
use crate::accounts::store::{CredentialStore, NewUser, User};
use crate::error::{AppError, AppResult};

/// Orchestrates registration and authentication against a credential store.
///
/// Built once at startup and carried in `AppState`; holds no state of its
/// own beyond the store handle.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Hash the password and persist a new user.
    ///
    /// Uniqueness is decided by the store when the record is written, so two
    /// concurrent registrations of the same username cannot both win.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("username must not be empty"));
        }
        if password.is_empty() {
            return Err(AppError::validation("password must not be empty"));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .store
            .save(NewUser {
                username: username.to_string(),
                password_hash,
                role: role.to_string(),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    /// Check a username/password pair against the stored hash.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(username.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = %user.id, username = %user.username, "user authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::store::memory::MemoryCredentialStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryCredentialStore::new()))
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_plaintext() {
        let svc = service();
        let user = svc
            .register_user("alice", "s3cret", "USER")
            .await
            .expect("register should succeed");

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, "USER");
        assert_ne!(user.password_hash, "s3cret");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_empty_username() {
        let svc = service();
        let err = svc.register_user("   ", "s3cret", "USER").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_empty_password() {
        let svc = service();
        let err = svc.register_user("alice", "", "USER").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let svc = service();
        svc.register_user("alice", "s3cret", "USER")
            .await
            .expect("first registration");

        let err = svc
            .register_user("alice", "another-password", "ADMIN")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(u) if u == "alice"));
    }

    #[tokio::test]
    async fn authenticate_accepts_the_correct_password() {
        let svc = service();
        let registered = svc
            .register_user("alice", "s3cret", "USER")
            .await
            .expect("register");

        let user = svc
            .authenticate("alice", "s3cret")
            .await
            .expect("authenticate should succeed");
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn authenticate_rejects_the_wrong_password() {
        let svc = service();
        svc.register_user("alice", "s3cret", "USER")
            .await
            .expect("register");

        let err = svc.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_unknown_username_is_not_found() {
        let svc = service();
        let err = svc.authenticate("ghost", "anything").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(u) if u == "ghost"));
    }

    #[tokio::test]
    async fn same_password_for_two_users_stores_different_hashes() {
        let svc = service();
        let alice = svc
            .register_user("alice", "shared-password", "USER")
            .await
            .expect("register alice");
        let bob = svc
            .register_user("bob", "shared-password", "USER")
            .await
            .expect("register bob");

        assert_ne!(alice.password_hash, bob.password_hash);
        svc.authenticate("alice", "shared-password")
            .await
            .expect("alice authenticates");
        svc.authenticate("bob", "shared-password")
            .await
            .expect("bob authenticates");
    }
}
