use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::AdapterError;
use crate::options::AdapterOptions;

use super::connection::SqliteAdapter;
use super::errors::translate;

/// Engine `busy_timeout` applied when the configuration does not name one.
pub const DEFAULT_LOCK_TIMEOUT_MS: u32 = 5000;

const MEMORY_URL: &str = ":memory:";

/// `PRAGMA synchronous` levels accepted alongside WAL mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    #[must_use]
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

impl fmt::Display for Synchronous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pragma())
    }
}

impl FromStr for Synchronous {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Synchronous::Off),
            "NORMAL" => Ok(Synchronous::Normal),
            "FULL" => Ok(Synchronous::Full),
            "EXTRA" => Ok(Synchronous::Extra),
            _ => Err(AdapterError::ConfigError(format!(
                "invalid synchronous setting '{}': expected one of OFF, NORMAL, FULL, EXTRA",
                s.trim()
            ))),
        }
    }
}

/// Object form of the WAL setting as supplied by the caller.
///
/// Numbers are kept signed so that negative input reaches validation instead of
/// failing inside the deserializer with a less useful message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalOptions {
    pub enabled: bool,
    pub synchronous: Option<String>,
    #[serde(alias = "checkpointPageCount")]
    pub checkpoint_page_count: Option<i64>,
    #[serde(alias = "lockTimeoutMs")]
    pub lock_timeout_ms: Option<i64>,
}

/// `true`/`false` or a [`WalOptions`] object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WalSetting {
    Enabled(bool),
    Options(WalOptions),
}

impl Default for WalSetting {
    fn default() -> Self {
        WalSetting::Enabled(false)
    }
}

impl WalSetting {
    /// Parse a WAL setting from JSON.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` for input that is neither a boolean nor
    /// an options object.
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Canonical, validated WAL and locking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalConfiguration {
    pub enabled: bool,
    pub synchronous: Synchronous,
    pub checkpoint_page_count: Option<u32>,
    pub lock_timeout_ms: u32,
}

impl Default for WalConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            synchronous: Synchronous::default(),
            checkpoint_page_count: None,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl WalConfiguration {
    /// Normalize and validate a caller-supplied setting.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` naming the offending field when
    /// `synchronous` is unknown or a count is negative or too large.
    pub fn try_from_setting(setting: &WalSetting) -> Result<Self, AdapterError> {
        let options = match setting {
            WalSetting::Enabled(enabled) => {
                return Ok(Self {
                    enabled: *enabled,
                    ..Self::default()
                });
            }
            WalSetting::Options(options) => options,
        };

        let synchronous = match options.synchronous.as_deref() {
            Some(raw) => raw.parse()?,
            None => Synchronous::default(),
        };
        let checkpoint_page_count = options
            .checkpoint_page_count
            .map(|v| non_negative("checkpoint_page_count", v))
            .transpose()?;
        let lock_timeout_ms = options
            .lock_timeout_ms
            .map(|v| non_negative("lock_timeout_ms", v))
            .transpose()?
            .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);

        Ok(Self {
            enabled: options.enabled,
            synchronous,
            checkpoint_page_count,
            lock_timeout_ms,
        })
    }

    /// Apply the configuration to a freshly opened connection.
    ///
    /// # Errors
    /// Returns the translated engine error if a pragma is rejected.
    pub fn apply_pragmas(&self, conn: &rusqlite::Connection) -> Result<(), AdapterError> {
        conn.busy_timeout(Duration::from_millis(u64::from(self.lock_timeout_ms)))
            .map_err(translate)?;
        run_pragma(conn, "PRAGMA foreign_keys = ON")?;

        if self.enabled {
            run_pragma(conn, "PRAGMA journal_mode = WAL")?;
            run_pragma(
                conn,
                &format!("PRAGMA synchronous = {}", self.synchronous.as_pragma()),
            )?;
            if let Some(pages) = self.checkpoint_page_count {
                run_pragma(conn, &format!("PRAGMA wal_autocheckpoint = {pages}"))?;
            }
        }
        debug!(
            wal = self.enabled,
            synchronous = %self.synchronous,
            lock_timeout_ms = self.lock_timeout_ms,
            "sqlite pragmas applied"
        );
        Ok(())
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, AdapterError> {
    if value < 0 {
        return Err(AdapterError::ConfigError(format!(
            "{field} must be a non-negative integer, got {value}"
        )));
    }
    u32::try_from(value).map_err(|_| {
        AdapterError::ConfigError(format!("{field} is out of range, got {value}"))
    })
}

// Some pragmas (journal_mode, wal_autocheckpoint) report a row; drain it.
fn run_pragma(conn: &rusqlite::Connection, sql: &str) -> Result<(), AdapterError> {
    let mut stmt = conn.prepare(sql).map_err(translate)?;
    let mut rows = stmt.query([]).map_err(translate)?;
    while rows.next().map_err(translate)?.is_some() {}
    Ok(())
}

/// Immutable configuration for an adapter factory.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub url: String,
    pub shadow_database_url: Option<String>,
    pub options: AdapterOptions,
    pub wal: WalConfiguration,
}

impl AdapterConfig {
    #[must_use]
    pub fn builder(url: impl Into<String>) -> AdapterConfigBuilder {
        AdapterConfigBuilder::new(url)
    }
}

/// Fluent builder for [`AdapterConfig`].
#[derive(Debug, Clone)]
pub struct AdapterConfigBuilder {
    url: String,
    shadow_database_url: Option<String>,
    options: AdapterOptions,
    wal: WalSetting,
}

impl AdapterConfigBuilder {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            shadow_database_url: None,
            options: AdapterOptions::default(),
            wal: WalSetting::default(),
        }
    }

    #[must_use]
    pub fn shadow_database_url(mut self, url: impl Into<String>) -> Self {
        self.shadow_database_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: WalSetting) -> Self {
        self.wal = wal;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` for an empty URL, inconsistent adapter
    /// options or an invalid WAL setting.
    pub fn finish(self) -> Result<AdapterConfig, AdapterError> {
        if self.url.trim().is_empty() {
            return Err(AdapterError::ConfigError("database url is empty".into()));
        }
        self.options.validate()?;
        let wal = WalConfiguration::try_from_setting(&self.wal)?;
        Ok(AdapterConfig {
            url: self.url,
            shadow_database_url: self.shadow_database_url,
            options: self.options,
            wal,
        })
    }

    /// Validate the configuration and wrap it in a factory.
    ///
    /// # Errors
    /// Same as [`AdapterConfigBuilder::finish`].
    pub fn build(self) -> Result<SqliteAdapterFactory, AdapterError> {
        Ok(SqliteAdapterFactory::new(self.finish()?))
    }
}

/// Opens configured [`SqliteAdapter`]s.
#[derive(Debug, Clone)]
pub struct SqliteAdapterFactory {
    config: AdapterConfig,
}

impl SqliteAdapterFactory {
    #[must_use]
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Open the main database.
    ///
    /// # Errors
    /// Returns `AdapterError::ConnectionError` if the file cannot be opened, or the
    /// translated engine error if a pragma fails.
    pub async fn connect(&self) -> Result<SqliteAdapter, AdapterError> {
        self.open(&self.config.url).await
    }

    /// Open the shadow database, or a fresh in-memory database when none is
    /// configured.
    ///
    /// # Errors
    /// Same as [`SqliteAdapterFactory::connect`].
    pub async fn connect_to_shadow_db(&self) -> Result<SqliteAdapter, AdapterError> {
        let url = self
            .config
            .shadow_database_url
            .as_deref()
            .unwrap_or(MEMORY_URL);
        self.open(url).await
    }

    async fn open(&self, url: &str) -> Result<SqliteAdapter, AdapterError> {
        let path = database_path(url).to_owned();
        let wal = self.config.wal;
        debug!(path = %path, "opening sqlite database");

        let conn = tokio::task::spawn_blocking(move || -> Result<rusqlite::Connection, AdapterError> {
            let conn = if path == MEMORY_URL {
                rusqlite::Connection::open_in_memory()
            } else {
                rusqlite::Connection::open(&path)
            }
            .map_err(|e| {
                AdapterError::ConnectionError(format!("failed to open sqlite database '{path}': {e}"))
            })?;
            wal.apply_pragmas(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| AdapterError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))??;

        Ok(SqliteAdapter::new(conn, self.config.options))
    }
}

/// Strip the `file:` scheme and any query string from a database URL.
#[must_use]
pub fn database_path(url: &str) -> &str {
    let url = url.trim();
    let path = url.strip_prefix("file:").unwrap_or(url);
    match path.split_once('?') {
        Some((path, _)) => path,
        None => path,
    }
}
