use std::sync::Arc;

use actix_web::web::{self, Data};
use anyhow::{Context, Result};

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::error::AppError;
use crate::model::{
    role::Role,
    user::{DEFAULT_INSTITUTION, DEFAULT_REGION, NewUser},
};
use crate::rules::clock::{Clock, SystemClock};
use crate::store::{MemoryStore, MySqlStore, Store};
use crate::utils::email_registry::EmailRegistry;

/// Everything the handlers pull out of `app_data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Data<Config>,
    pub store: Data<dyn Store>,
    pub clock: Data<dyn Clock>,
    pub emails: Data<EmailRegistry>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Data::new(config),
            store: Data::from(store),
            clock: Data::from(clock),
            emails: Data::new(EmailRegistry::new()),
        }
    }

    /// Picks MySQL when `DATABASE_URL` is set, otherwise the in-memory store.
    pub async fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let pool = crate::db::init_db(url)
                    .await
                    .context("Failed to connect to database")?;
                Arc::new(MySqlStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, data is kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let offset = config
            .utc_offset()
            .context("UTC_OFFSET_MINUTES out of range")?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));

        Ok(Self::new(config, store, clock))
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        // Malformed bodies and queries get the same JSON envelope as every
        // other failure.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected JSON body");
            AppError::validation(format!("Data tidak valid: {}", err)).into()
        });
        let query_config = web::QueryConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected query string");
            AppError::validation(format!("Parameter tidak valid: {}", err)).into()
        });

        cfg.app_data(json_config)
            .app_data(query_config)
            .app_data(self.config.clone())
            .app_data(self.store.clone())
            .app_data(self.clock.clone())
            .app_data(self.emails.clone());
    }

    /// Creates the configured admin account unless an admin already exists.
    pub async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(email), Some(password)) =
            (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.store.count_users(Some(Role::Admin)).await? > 0 {
            return Ok(());
        }

        let password_hash =
            hash_password(password).map_err(|e| anyhow::anyhow!("hash admin password: {}", e))?;
        let admin = self
            .store
            .create_user(NewUser {
                name: self.config.admin_name.clone(),
                email: email.clone(),
                password_hash,
                role: Role::Admin,
                position: "Admin".to_string(),
                region: DEFAULT_REGION.to_string(),
                institution: DEFAULT_INSTITUTION.to_string(),
                phone: String::new(),
            })
            .await?;

        self.emails.mark_taken(&admin.email).await;
        tracing::info!(user_id = %admin.id, "Bootstrap admin created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::clock::FixedClock;

    fn state_with_admin(email: Option<&str>) -> AppState {
        let mut config = Config::for_tests();
        config.admin_email = email.map(str::to_string);
        config.admin_password = Some("rahasia123".to_string());
        let offset = config.utc_offset().unwrap();
        AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::at_local("2024-01-01 08:00", offset)),
        )
    }

    #[actix_web::test]
    async fn bootstrap_creates_admin_once() {
        let state = state_with_admin(Some("admin@foksi.id"));
        state.bootstrap_admin().await.unwrap();
        state.bootstrap_admin().await.unwrap();

        assert_eq!(state.store.count_users(Some(Role::Admin)).await.unwrap(), 1);
        assert!(state.emails.might_exist("admin@foksi.id"));
    }

    #[actix_web::test]
    async fn bootstrap_without_credentials_does_nothing() {
        let state = state_with_admin(None);
        state.bootstrap_admin().await.unwrap();
        assert_eq!(state.store.count_users(None).await.unwrap(), 0);
    }
}
