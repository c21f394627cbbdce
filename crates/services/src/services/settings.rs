//! Runtime settings: which data source is active and where the sheet lives.

use db::models::{
    setting::{DATA_SOURCE_KEY, DataSource, SHEETS_API_URL_KEY, Setting},
    user::{Role, UserInfo},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use url::Url;

use super::{
    access::{AccessDenied, require_role},
    data_source::{DataSourceRouter, StoreError},
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("{0}")]
    Validation(String),
}

/// `sheets_api_url` grants write access to the sheet and is only shown to SuperAdmins.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SettingsView {
    pub data_source: DataSource,
    pub sheets_api_url: Option<String>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateSetting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SheetConnectionStatus {
    pub url: String,
    pub reachable: bool,
    pub error: Option<String>,
}

pub struct SettingsService;

impl SettingsService {
    pub async fn view(
        pool: &SqlitePool,
        router: &DataSourceRouter,
        actor: &UserInfo,
    ) -> Result<SettingsView, SettingsError> {
        let mut settings = Setting::find_all(pool).await?;
        let sheets_api_url = if actor.role >= Role::SuperAdmin {
            router.sheets_url().await?.map(String::from)
        } else {
            settings.retain(|s| s.key != SHEETS_API_URL_KEY);
            None
        };
        Ok(SettingsView {
            data_source: router.configured_source().await?,
            sheets_api_url,
            settings,
        })
    }

    pub async fn set(
        pool: &SqlitePool,
        router: &DataSourceRouter,
        actor: &UserInfo,
        update: UpdateSetting,
    ) -> Result<Setting, SettingsError> {
        require_role(actor, Role::SuperAdmin)?;
        let value = update.value.trim();

        let stored = match update.key.as_str() {
            DATA_SOURCE_KEY => {
                let source = value.parse::<DataSource>().map_err(|_| {
                    SettingsError::Validation(format!(
                        "unknown data source '{value}', expected database, sheet or both"
                    ))
                })?;
                if source.uses_sheet() && router.sheets_url().await?.is_none() {
                    return Err(SettingsError::Validation(
                        "set a sheets API URL before switching to the sheet data source".to_string(),
                    ));
                }
                source.to_string()
            }
            SHEETS_API_URL_KEY => validate_sheet_url(value)?.to_string(),
            other => {
                return Err(SettingsError::Validation(format!("unknown setting '{other}'")));
            }
        };

        let setting = Setting::upsert(pool, &update.key, &stored).await?;
        info!(key = %setting.key, value = %setting.value, changed_by = %actor.full_name, "Setting changed");
        Ok(setting)
    }

    /// Ping the configured sheet endpoint.
    pub async fn test_connection(
        router: &DataSourceRouter,
        actor: &UserInfo,
    ) -> Result<SheetConnectionStatus, SettingsError> {
        require_role(actor, Role::SuperAdmin)?;
        let client = router
            .sheets_client()
            .await?
            .ok_or_else(|| SettingsError::Validation("no sheets API URL is configured".to_string()))?;

        let url = client.base_url().to_string();
        match client.ping().await {
            Ok(()) => Ok(SheetConnectionStatus {
                url,
                reachable: true,
                error: None,
            }),
            Err(e) => {
                warn!(url = %url, error = %e, "Sheet connection test failed");
                Ok(SheetConnectionStatus {
                    url,
                    reachable: false,
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

fn validate_sheet_url(raw: &str) -> Result<Url, SettingsError> {
    let url = Url::parse(raw)
        .map_err(|e| SettingsError::Validation(format!("invalid sheets API URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SettingsError::Validation(format!(
            "sheets API URL must use http or https, not {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, query_param},
    };

    use super::*;
    use crate::services::{access::test_support::actor, config::AppConfig};

    fn update(key: &str, value: &str) -> UpdateSetting {
        UpdateSetting {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    async fn setup() -> (DBService, DataSourceRouter) {
        let db = DBService::new_in_memory().await.unwrap();
        let router = DataSourceRouter::new(db.pool.clone(), &AppConfig::default());
        (db, router)
    }

    #[tokio::test]
    async fn sheet_source_requires_a_url() {
        let (db, router) = setup().await;
        let root = actor("Root", Role::SuperAdmin);

        assert!(matches!(
            SettingsService::set(&db.pool, &router, &root, update(DATA_SOURCE_KEY, "both")).await,
            Err(SettingsError::Validation(_))
        ));

        SettingsService::set(
            &db.pool,
            &router,
            &root,
            update(SHEETS_API_URL_KEY, "https://script.example.com/exec"),
        )
        .await
        .unwrap();
        let stored = SettingsService::set(&db.pool, &router, &root, update(DATA_SOURCE_KEY, "google"))
            .await
            .unwrap();
        assert_eq!(stored.value, "sheet");

        let view = SettingsService::view(&db.pool, &router, &root).await.unwrap();
        assert_eq!(view.data_source, DataSource::Sheet);
        assert_eq!(view.sheets_api_url.as_deref(), Some("https://script.example.com/exec"));
        assert!(view.settings.iter().any(|s| s.key == SHEETS_API_URL_KEY));
    }

    #[tokio::test]
    async fn sheet_url_is_hidden_below_super_admin() {
        let (db, router) = setup().await;
        Setting::upsert(&db.pool, SHEETS_API_URL_KEY, "https://script.example.com/exec?key=s3cret")
            .await
            .unwrap();
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "both").await.unwrap();

        for role in [Role::User, Role::Admin] {
            let view = SettingsService::view(&db.pool, &router, &actor("Clerk", role))
                .await
                .unwrap();
            assert_eq!(view.data_source, DataSource::Both);
            assert!(view.sheets_api_url.is_none());
            assert!(view.settings.iter().all(|s| s.key != SHEETS_API_URL_KEY));
            assert_eq!(view.settings.len(), 1);
        }
    }

    #[tokio::test]
    async fn rejects_unknown_keys_bad_values_and_non_super_admins() {
        let (db, router) = setup().await;
        let root = actor("Root", Role::SuperAdmin);

        for (key, value) in [
            ("theme", "dark"),
            (DATA_SOURCE_KEY, "excel"),
            (SHEETS_API_URL_KEY, "ftp://example.com"),
            (SHEETS_API_URL_KEY, "not a url"),
        ] {
            assert!(matches!(
                SettingsService::set(&db.pool, &router, &root, update(key, value)).await,
                Err(SettingsError::Validation(_))
            ));
        }
        assert!(matches!(
            SettingsService::set(&db.pool, &router, &actor("A", Role::Admin), update(DATA_SOURCE_KEY, "database")).await,
            Err(SettingsError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn connection_test_reports_reachability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": "pong" })))
            .mount(&server)
            .await;

        let (db, router) = setup().await;
        let root = actor("Root", Role::SuperAdmin);
        assert!(matches!(
            SettingsService::test_connection(&router, &root).await,
            Err(SettingsError::Validation(_))
        ));

        Setting::upsert(&db.pool, SHEETS_API_URL_KEY, &format!("{}/exec", server.uri()))
            .await
            .unwrap();
        let status = SettingsService::test_connection(&router, &root).await.unwrap();
        assert!(status.reachable);
        assert!(status.error.is_none());
    }
}
