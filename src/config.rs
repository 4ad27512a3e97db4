use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{Result, ScraperError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub url: String,
    pub category: String,
    pub window_offset: u32,
    pub window_size: u32,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            window_offset: DEFAULT_WINDOW_OFFSET,
            window_size: DEFAULT_WINDOW_SIZE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub fence_multiplier: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fence_multiplier: DEFAULT_FENCE_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub db_path: String,
    /// Keep snapshots in memory only; nothing touches disk.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            info!("Loaded configuration from {}", path.display());
            Self::from_toml(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PRICE_SCRAPER_UPSTREAM_URL") {
            self.upstream.url = url;
        }
        if let Ok(db_path) = std::env::var("PRICE_SCRAPER_DB_PATH") {
            self.storage.db_path = db_path;
        }
        if let Ok(port) = std::env::var("PRICE_SCRAPER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ScraperError::Config(format!("Invalid PRICE_SCRAPER_PORT '{}': {}", port, e)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.timeout_seconds == 0 {
            return Err(ScraperError::Config("upstream.timeout_seconds must be positive".to_string()));
        }
        if self.upstream.window_size == 0 {
            return Err(ScraperError::Config("upstream.window_size must be positive".to_string()));
        }
        if !(self.pipeline.fence_multiplier.is_finite() && self.pipeline.fence_multiplier >= 0.0) {
            return Err(ScraperError::Config(
                "pipeline.fence_multiplier must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}
