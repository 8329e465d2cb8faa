//! # tempo-config
//!
//! Layered configuration loading for Tempo using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TEMPO_*` prefix, `__` as separator)
//! 2. Project-level `.tempo/config.toml`
//! 3. User-level `~/.config/tempo/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TEMPO_CACHE__QUERY_TTL_SECS` -> `cache.query_ttl_secs`,
//! `TEMPO_REPORT__LATE_COUNTS_AS_ATTENDED` -> `report.late_counts_as_attended`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use tempo_config::TempoConfig;
//!
//! let config = TempoConfig::load_with_dotenv().expect("config");
//! println!("query cache TTL: {:?}", config.cache.query_ttl());
//! ```

mod cache;
mod error;
mod queue;
mod report;
mod store;

pub use cache::CacheConfig;
pub use error::ConfigError;
pub use queue::QueueConfig;
pub use report::ReportConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TempoConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl TempoConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".tempo/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("TEMPO_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tempo").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.queue.max_delay_ms < self.queue.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "queue.max_delay_ms".into(),
                reason: format!(
                    "must not be below queue.base_delay_ms ({})",
                    self.queue.base_delay_ms
                ),
            });
        }
        Ok(())
    }
}
