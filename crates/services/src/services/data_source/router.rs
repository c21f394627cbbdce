use std::{sync::Arc, time::Duration};

use db::models::{
    setting::{DATA_SOURCE_KEY, DataSource, SHEETS_API_URL_KEY, Setting},
    user::UserInfo,
};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

use super::{DataStore, MirrorQueue, MirroredStore, SheetStore, SqlStore, StoreError};
use crate::services::{
    config::AppConfig,
    sheets_api::{SheetsApiError, SheetsClient},
};

/// The store serving the current request and the source it was chosen for.
#[derive(Clone)]
pub struct ActiveStore {
    pub source: DataSource,
    pub store: Arc<dyn DataStore>,
}

/// A user account change to replay against the sheet.
#[derive(Debug, Clone)]
pub enum UserChange {
    Added(UserInfo),
    Updated(UserInfo),
    Deleted(UserInfo),
}

impl UserChange {
    fn operation(&self) -> &'static str {
        match self {
            UserChange::Added(_) => "add_user",
            UserChange::Updated(_) => "update_user",
            UserChange::Deleted(_) => "delete_user",
        }
    }

    async fn apply(self, client: SheetsClient) -> Result<(), SheetsApiError> {
        match self {
            UserChange::Added(user) => client.add_user(&user).await,
            UserChange::Updated(user) => {
                let key = sheet_user_key(&client, &user).await?;
                client.update_user(&key, &user).await
            }
            UserChange::Deleted(user) => {
                let key = sheet_user_key(&client, &user).await?;
                client.delete_user(&key).await
            }
        }
    }
}

/// Sheet account rows are matched by username; rows older than the SQL
/// accounts carry their own ids.
async fn sheet_user_key(client: &SheetsClient, user: &UserInfo) -> Result<String, SheetsApiError> {
    Ok(client
        .fetch_dashboard()
        .await?
        .user_keys
        .remove(&user.username)
        .unwrap_or_else(|| user.id.to_string()))
}

#[derive(Clone)]
pub struct DataSourceRouter {
    pool: SqlitePool,
    default_sheets_url: Option<Url>,
    sheets_timeout: Duration,
    tracker: TaskTracker,
    mirror_queue: Arc<Mutex<Option<MirrorQueue>>>,
    client_cache: Arc<Mutex<Option<SheetsClient>>>,
}

impl DataSourceRouter {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        Self {
            pool,
            default_sheets_url: config.sheets_api_url.clone(),
            sheets_timeout: config.sheets_timeout,
            tracker: TaskTracker::new(),
            mirror_queue: Arc::new(Mutex::new(None)),
            client_cache: Arc::new(Mutex::new(None)),
        }
    }

    /// The shared queue every mirror write goes through, started on first use.
    async fn queue(&self) -> MirrorQueue {
        self.mirror_queue
            .lock()
            .await
            .get_or_insert_with(|| MirrorQueue::spawn(&self.tracker))
            .clone()
    }

    /// The stored `data_source` setting. Unknown values fall back to the database.
    pub async fn configured_source(&self) -> Result<DataSource, StoreError> {
        let raw = Setting::get(&self.pool, DATA_SOURCE_KEY).await?;
        Ok(match raw {
            Some(raw) => raw.parse::<DataSource>().unwrap_or_else(|_| {
                warn!(value = %raw, "Unrecognised data source setting, using database");
                DataSource::Database
            }),
            None => DataSource::Database,
        })
    }

    /// The `sheets_api_url` setting if present and valid, otherwise the configured default.
    pub async fn sheets_url(&self) -> Result<Option<Url>, StoreError> {
        let stored = Setting::get(&self.pool, SHEETS_API_URL_KEY).await?;
        let parsed = stored
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid sheets_api_url setting");
                    None
                }
            });
        Ok(parsed.or_else(|| self.default_sheets_url.clone()))
    }

    /// A client for the current sheet URL, reused while the URL is unchanged.
    pub async fn sheets_client(&self) -> Result<Option<SheetsClient>, StoreError> {
        let Some(url) = self.sheets_url().await? else {
            return Ok(None);
        };

        let mut cache = self.client_cache.lock().await;
        if let Some(client) = cache.as_ref().filter(|c| c.base_url() == &url) {
            return Ok(Some(client.clone()));
        }
        debug!(url = %url, "Building sheets client");
        let client = SheetsClient::new(url, self.sheets_timeout)?;
        *cache = Some(client.clone());
        Ok(Some(client))
    }

    /// Pick the store for this request.
    ///
    /// `sheet` without a URL is an error; `both` without a URL degrades to the
    /// database alone.
    pub async fn resolve(&self) -> Result<ActiveStore, StoreError> {
        let source = self.configured_source().await?;
        let sql: Arc<dyn DataStore> = Arc::new(SqlStore::new(self.pool.clone()));

        let store: Arc<dyn DataStore> = match source {
            DataSource::Database => sql,
            DataSource::Sheet => {
                let client = self.sheets_client().await?.ok_or_else(|| {
                    StoreError::Unavailable("sheet data source selected but no sheets API URL is set".to_string())
                })?;
                Arc::new(SheetStore::new(client))
            }
            DataSource::Both => match self.sheets_client().await? {
                Some(client) => Arc::new(MirroredStore::new(
                    sql,
                    Arc::new(SheetStore::new(client)),
                    self.queue().await,
                )),
                None => {
                    warn!("Dual data source selected without a sheets API URL, writing to database only");
                    sql
                }
            },
        };

        Ok(ActiveStore { source, store })
    }

    /// Replay a user change against the sheet when the active source includes it.
    /// Accounts always live in SQL; this copy is best effort.
    pub async fn mirror_user(&self, change: UserChange) {
        let source = match self.configured_source().await {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "Could not read data source, skipping user mirror");
                return;
            }
        };
        if !source.uses_sheet() {
            return;
        }
        let client = match self.sheets_client().await {
            Ok(Some(client)) => client,
            Ok(None) => {
                warn!("No sheets API URL set, skipping user mirror");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Could not build sheets client, skipping user mirror");
                return;
            }
        };

        let operation = change.operation();
        self.queue()
            .await
            .push(operation, "sheet", async move {
                change.apply(client).await.map_err(StoreError::from)
            });
    }

    /// Stop accepting mirror writes and wait up to `timeout` for queued ones.
    pub async fn shutdown(&self, timeout: Duration) {
        self.mirror_queue.lock().await.take();
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for mirror writes to finish");
        }
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            warn!(pending = self.tracker.len(), "Gave up waiting for mirror writes");
        }
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::user::{Role, UserStatus},
    };
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, query_param},
    };

    use super::*;

    async fn router(db: &DBService, default_url: Option<&str>) -> DataSourceRouter {
        let config = AppConfig {
            sheets_api_url: default_url.map(|u| Url::parse(u).unwrap()),
            ..AppConfig::default()
        };
        DataSourceRouter::new(db.pool.clone(), &config)
    }

    #[tokio::test]
    async fn defaults_to_database() {
        let db = DBService::new_in_memory().await.unwrap();
        let active = router(&db, None).await.resolve().await.unwrap();
        assert_eq!(active.source, DataSource::Database);
        assert_eq!(active.store.name(), "database");
    }

    #[tokio::test]
    async fn sheet_without_url_is_unavailable() {
        let db = DBService::new_in_memory().await.unwrap();
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "google").await.unwrap();
        let err = router(&db, None).await.resolve().await.err().unwrap();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn both_without_url_degrades_to_database() {
        let db = DBService::new_in_memory().await.unwrap();
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "both").await.unwrap();
        let active = router(&db, None).await.resolve().await.unwrap();
        assert_eq!(active.source, DataSource::Both);
        assert_eq!(active.store.name(), "database");
    }

    #[tokio::test]
    async fn setting_url_overrides_default() {
        let db = DBService::new_in_memory().await.unwrap();
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "both").await.unwrap();
        Setting::upsert(&db.pool, SHEETS_API_URL_KEY, "https://sheets.example.com/exec")
            .await
            .unwrap();
        let router = router(&db, Some("https://fallback.example.com/exec")).await;

        let url = router.sheets_url().await.unwrap().unwrap();
        assert_eq!(url.host_str(), Some("sheets.example.com"));
        assert_eq!(router.resolve().await.unwrap().store.name(), "both");
    }

    fn account(username: &str) -> UserInfo {
        UserInfo {
            id: Uuid::new_v4(),
            full_name: username.to_string(),
            username: username.to_string(),
            role: Role::User,
            timeout_minutes: 60,
            status: UserStatus::Active,
        }
    }

    #[tokio::test]
    async fn user_changes_are_mirrored_only_when_sheet_is_active() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getDashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "UsersInfo": [{ "SheetID": "u7", "FullName": "Meena", "userName": "meena", "UserType": "User", "Status": "Active" }]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "action": "deleteUser", "data": { "SheetID": "u7" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let db = DBService::new_in_memory().await.unwrap();
        let url = format!("{}/exec", server.uri());
        let router = router(&db, Some(&url)).await;

        router.mirror_user(UserChange::Deleted(account("meena"))).await;
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "both").await.unwrap();
        router.mirror_user(UserChange::Deleted(account("meena"))).await;

        router.shutdown(Duration::from_secs(5)).await;
    }

    #[tokio::test]
    async fn mirror_writes_replay_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getDashboard"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": {} }))
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let db = DBService::new_in_memory().await.unwrap();
        Setting::upsert(&db.pool, DATA_SOURCE_KEY, "both").await.unwrap();
        let url = format!("{}/exec", server.uri());
        let router = router(&db, Some(&url)).await;

        router.mirror_user(UserChange::Updated(account("ravi"))).await;
        router.mirror_user(UserChange::Added(account("asha"))).await;
        router.shutdown(Duration::from_secs(5)).await;

        let actions: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|r| r.body_json::<serde_json::Value>().ok())
            .filter_map(|body| body["action"].as_str().map(str::to_string))
            .collect();
        assert_eq!(actions, vec!["updateUser", "addUser"]);
    }
}
