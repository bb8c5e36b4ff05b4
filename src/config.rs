use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimiterConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_lang: String,
    pub youtube_base_url: String,
    pub log_file: Option<PathBuf>,
    pub rate_limit: RateLimiterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_lang: "en".to_string(),
            youtube_base_url: "https://www.youtube.com".to_string(),
            log_file: None,
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `path`, falling back to defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.rate_limit.validate()
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("tubescript")
        .join("config.toml")
}
