use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Upstream feed credential. Required; `NEWS_API_KEY` in the
    /// environment overrides the file value.
    #[serde(default)]
    pub api_key: String,

    /// Country filter passed straight to the headlines endpoint.
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default)]
    pub use_proxy: bool,

    #[serde(default = "default_proxy_host")]
    pub proxy_host: String,

    #[serde(default = "default_proxy_port")]
    pub proxy_port: u16,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_poll_interval_minutes")]
    pub poll_interval_minutes: u64,

    /// Disables TLS certificate verification on feed requests. Only for
    /// broken corporate middleboxes; leave off otherwise.
    #[serde(default)]
    pub skip_tls_verify: bool,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newswatch");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("newswatch.db").to_string_lossy().to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_proxy_port() -> u16 {
    7890
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2_000
}

fn default_poll_interval_minutes() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_key: String::new(),
            country: default_country(),
            use_proxy: false,
            proxy_host: default_proxy_host(),
            proxy_port: default_proxy_port(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            poll_interval_minutes: default_poll_interval_minutes(),
            skip_tls_verify: false,
        }
    }
}

impl Config {
    /// Load from the config file, writing a template on first run. Fails
    /// when no API key is available from the file or the environment.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the rest of the process cannot run with, before any
    /// of it starts.
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(format!(
                "no API key: set api_key in {} or export NEWS_API_KEY",
                Self::config_path().display()
            )));
        }
        if self.poll_interval_minutes == 0 {
            return Err(AppError::Config(
                "poll_interval_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newswatch")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = Config {
            api_key: "test-key".to_string(),
            poll_interval_minutes: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("poll_interval_minutes")));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = Config {
            api_key: String::new(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("API key")));
    }

    #[test]
    fn defaults_with_a_key_pass_validation() {
        let config = Config {
            api_key: "test-key".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
