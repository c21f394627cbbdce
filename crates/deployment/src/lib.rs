use std::time::Duration;

use async_trait::async_trait;
use db::{DBService, models::user::UserInfo};
use services::services::{
    config::AppConfig,
    data_source::DataSourceRouter,
    database_validator::{DatabaseValidationError, DatabaseValidator, ValidationResult},
    session_sweeper::SessionSweeperService,
    users::{UserError, UserService},
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The assembled runtime shared by every request handler.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: AppConfig) -> Result<Self, DeploymentError>;

    fn db(&self) -> &DBService;

    fn config(&self) -> &AppConfig;

    fn data_sources(&self) -> &DataSourceRouter;

    async fn validate_database(&self) -> Result<ValidationResult, DeploymentError> {
        let result = DatabaseValidator::new(self.db().pool.clone())
            .ensure_ready()
            .await?;
        info!("{}", result.summary());
        Ok(result)
    }

    /// Seed the first SuperAdmin from config when the user table is empty.
    async fn ensure_bootstrap_admin(&self) -> Result<Option<UserInfo>, DeploymentError> {
        let Some(admin) = self.config().bootstrap_admin.as_ref() else {
            return Ok(None);
        };
        Ok(
            UserService::ensure_bootstrap_admin(&self.db().pool, admin, self.config().bcrypt_cost)
                .await?,
        )
    }

    async fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        SessionSweeperService::spawn(self.db().clone(), self.config().session_sweep_interval)
            .await
    }

    /// Wait up to `timeout` for background sheet writes to drain.
    async fn shutdown(&self, timeout: Duration) {
        self.data_sources().shutdown(timeout).await;
    }
}
