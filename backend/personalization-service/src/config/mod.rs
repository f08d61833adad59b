use crate::services::scoring::MAX_JITTER;
use crate::services::EngineSettings;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // Persistence
    pub storage_backend: StorageBackend,
    pub redis_url: String,
    pub redis_key_prefix: String,

    // Ranking
    pub profile_timeout_ms: u64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub tie_break_jitter: f64,

    /// Seed for reproducible jitter and assignment; unset uses a thread RNG
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8013)?
            .set_default("storage_backend", "memory")?
            .set_default("redis_url", "redis://localhost:6379")?
            .set_default("redis_key_prefix", "personalization")?
            .set_default("profile_timeout_ms", 250)?
            .set_default("default_limit", 6)?
            .set_default("max_limit", 100)?
            .set_default("tie_break_jitter", 0.01)?
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.storage_backend == StorageBackend::Redis && self.redis_url.is_empty() {
            return Err(anyhow!("Redis URL is required for the redis storage backend"));
        }

        if self.redis_key_prefix.is_empty() {
            return Err(anyhow!("Redis key prefix must not be empty"));
        }

        if self.profile_timeout_ms == 0 {
            return Err(anyhow!("Profile timeout must be greater than 0"));
        }

        if self.max_limit == 0 || self.default_limit > self.max_limit {
            return Err(anyhow!(
                "Limits must satisfy 0 < default_limit <= max_limit (got {} / {})",
                self.default_limit,
                self.max_limit
            ));
        }

        if !(0.0..=MAX_JITTER).contains(&self.tie_break_jitter) {
            return Err(anyhow!(
                "Tie-break jitter must be between 0 and {}",
                MAX_JITTER
            ));
        }

        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            profile_timeout: Duration::from_millis(self.profile_timeout_ms),
            tie_break_jitter: self.tie_break_jitter,
        }
    }
}
