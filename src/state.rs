use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::accounts::service::AccountService;
use crate::accounts::store::{CredentialStore, PgCredentialStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgCredentialStore::new(db.clone())) as Arc<dyn CredentialStore>;
        let accounts = AccountService::new(store);

        Ok(Self {
            db,
            config,
            accounts,
        })
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, accounts: AccountService) -> Self {
        Self {
            db,
            config,
            accounts,
        }
    }
}
