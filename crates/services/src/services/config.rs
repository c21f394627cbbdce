//! Process configuration read from the environment.

use std::{net::SocketAddr, time::Duration};

use thiserror::Error;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/oil-ledger.db";
/// Work factors bcrypt accepts.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// First SuperAdmin created when the user table is empty.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Fallback spreadsheet endpoint when the `sheets_api_url` setting is unset.
    pub sheets_api_url: Option<Url>,
    pub sheets_timeout: Duration,
    pub cookie_secure: bool,
    pub session_sweep_interval: Duration,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sheets_api_url: None,
            sheets_timeout: Duration::from_secs(30),
            cookie_secure: false,
            session_sweep_interval: Duration::from_secs(300),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bootstrap_admin: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let sheets_api_url = get("SHEETS_API_URL")
            .or_else(|| get("GOOGLE_SCRIPT_URL"))
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    key: "SHEETS_API_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => parse_bool("COOKIE_SECURE", &v)?,
            None => production,
        };

        let bootstrap_admin = match (
            get("BOOTSTRAP_ADMIN_USERNAME"),
            get("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                full_name: get("BOOTSTRAP_ADMIN_FULL_NAME").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            sheets_api_url,
            sheets_timeout: get("SHEETS_TIMEOUT_SECS")
                .map(|v| parse_u64("SHEETS_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sheets_timeout),
            cookie_secure,
            session_sweep_interval: get("SESSION_SWEEP_INTERVAL_SECS")
                .map(|v| parse_u64("SESSION_SWEEP_INTERVAL_SECS", &v))
                .transpose()?
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or(defaults.session_sweep_interval),
            bcrypt_cost: get("BCRYPT_COST")
                .map(|v| parse_bcrypt_cost(&v))
                .transpose()?
                .unwrap_or(defaults.bcrypt_cost),
            bootstrap_admin,
            log_json: get("LOG_JSON")
                .map(|v| parse_bool("LOG_JSON", &v))
                .transpose()?
                .unwrap_or(false),
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_bcrypt_cost(value: &str) -> Result<u32, ConfigError> {
    let cost = parse_u64("BCRYPT_COST", value)?;
    u32::try_from(cost)
        .ok()
        .filter(|cost| BCRYPT_COST_RANGE.contains(cost))
        .ok_or_else(|| ConfigError::Invalid {
            key: "BCRYPT_COST",
            reason: format!(
                "must be between {} and {}, got {cost}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            ),
        })
}
