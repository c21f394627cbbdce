use std::{path::Path, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{config::AppConfig, data_source::DataSourceRouter};

/// A single-process deployment backed by a local SQLite file.
#[derive(Clone)]
pub struct LocalDeployment {
    db: DBService,
    config: Arc<AppConfig>,
    data_sources: DataSourceRouter,
}

impl LocalDeployment {
    /// Wire a deployment around an already opened database.
    pub fn from_parts(db: DBService, config: AppConfig) -> Self {
        let data_sources = DataSourceRouter::new(db.pool.clone(), &config);
        Self {
            db,
            config: Arc::new(config),
            data_sources,
        }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: AppConfig) -> Result<Self, DeploymentError> {
        ensure_parent_dir(&config.database_url)?;
        let db = DBService::new(&config.database_url).await?;
        Ok(Self::from_parts(db, config))
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }

    fn data_sources(&self) -> &DataSourceRouter {
        &self.data_sources
    }
}

/// SQLite creates the file but not the directory holding it.
fn ensure_parent_dir(database_url: &str) -> Result<(), DeploymentError> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_parts_shares_the_pool() {
        let db = DBService::new_in_memory().await.unwrap();
        let deployment = LocalDeployment::from_parts(db, AppConfig::default());
        let result = deployment.validate_database().await.unwrap();
        assert!(result.is_ok());
        assert!(deployment.ensure_bootstrap_admin().await.unwrap().is_none());
    }

    #[test]
    fn memory_urls_need_no_directory() {
        assert!(ensure_parent_dir("sqlite::memory:").is_ok());
        assert!(ensure_parent_dir("postgres://nope").is_ok());
    }
}
