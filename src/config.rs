//! SQLite-backed shell configuration
//!
//! `AppConfig` is a plain key-value table. `ShellSettings` is the typed view
//! the shell runs on: stored values override defaults, environment variables
//! override both. Secrets never go in here; they live in the OS vault.

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::security::DEFAULT_ALLOWED_ORIGINS;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

pub const KEY_API_BASE_URL: &str = "api_base_url";
pub const KEY_REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
pub const KEY_ALLOWED_ORIGINS: &str = "allowed_origins";

pub const ENV_MODE: &str = "SGE_ENV";
pub const ENV_START_URL: &str = "SGE_START_URL";
pub const ENV_API_BASE_URL: &str = "SGE_API_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl From<rusqlite::Error> for ConfigError {
    fn from(e: rusqlite::Error) -> Self {
        ConfigError::Database(e.to_string())
    }
}

pub struct AppConfig {
    conn: Mutex<Connection>,
}

impl AppConfig {
    /// Create config table in an existing database connection
    pub fn init_table(conn: &Connection) -> Result<(), ConfigError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS app_config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );"
        )?;
        Ok(())
    }

    /// Open (or create) the config database at `path`
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let conn = Connection::open(path)?;
        Self::init_table(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open standalone in-memory config (for testing)
    pub fn open_in_memory() -> Result<Self, ConfigError> {
        let conn = Connection::open_in_memory()?;
        Self::init_table(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ConfigError> {
        self.conn
            .lock()
            .map_err(|_| ConfigError::Database("config connection poisoned".to_string()))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT value FROM app_config WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        let ret = match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ConfigError::from(e)),
        };
        tracing::debug!(key = %key, found = ret.as_ref().ok().and_then(|v| v.as_ref()).is_some(), "Config get");
        ret
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        tracing::debug!(key = %key, "Config set");
        let now = chrono::Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO app_config (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<(), ConfigError> {
        tracing::debug!(key = %key, "Config delete");
        let conn = self.lock()?;
        conn.execute("DELETE FROM app_config WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Typed runtime settings for the shell
#[derive(Debug, Clone, PartialEq)]
pub struct ShellSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub login_route: String,
    /// Dev server URL; `None` loads the packaged frontend
    pub start_url: Option<String>,
    pub is_production: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            start_url: None,
            is_production: !cfg!(debug_assertions),
        }
    }
}

impl ShellSettings {
    /// Defaults overridden by stored config, then by the process environment
    pub fn load(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::from_sources(config, |name| std::env::var(name).ok())
    }

    pub fn from_sources(
        config: &AppConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(url) = config.get(KEY_API_BASE_URL)? {
            settings.api_base_url = url;
        }
        if let Some(raw) = config.get(KEY_REQUEST_TIMEOUT_SECS)? {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: KEY_REQUEST_TIMEOUT_SECS.to_string(),
                reason: format!("not a number of seconds: {:?}", raw),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: KEY_REQUEST_TIMEOUT_SECS.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = config.get(KEY_ALLOWED_ORIGINS)? {
            settings.allowed_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(mode) = env(ENV_MODE) {
            settings.is_production = mode.eq_ignore_ascii_case("production");
        }
        if let Some(url) = env(ENV_START_URL).filter(|s| !s.is_empty()) {
            settings.start_url = Some(url);
        }
        if let Some(url) = env(ENV_API_BASE_URL).filter(|s| !s.is_empty()) {
            settings.api_base_url = url;
        }

        url::Url::parse(&settings.api_base_url).map_err(|e| ConfigError::Invalid {
            key: KEY_API_BASE_URL.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            api_base_url = %settings.api_base_url,
            timeout_secs = settings.request_timeout.as_secs(),
            production = settings.is_production,
            "Loaded shell settings"
        );
        Ok(settings)
    }
}
