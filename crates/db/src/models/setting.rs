use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

pub const DATA_SOURCE_KEY: &str = "data_source";
pub const SHEETS_API_URL_KEY: &str = "sheets_api_url";

/// Where records are read from and written to.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataSource {
    /// SQL only.
    #[default]
    #[serde(alias = "mysql")]
    #[strum(to_string = "database", serialize = "mysql")]
    Database,
    /// Remote spreadsheet only.
    #[serde(alias = "google")]
    #[strum(to_string = "sheet", serialize = "google")]
    Sheet,
    /// SQL primary, every write mirrored to the sheet.
    Both,
}

impl DataSource {
    pub fn uses_sheet(self) -> bool {
        matches!(self, DataSource::Sheet | DataSource::Both)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(pool)
            .await
    }

    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(pool: &SqlitePool, key: &str, value: &str) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, $3)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: now,
        })
    }
}
