use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use common::LogFormat;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "brainjar.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_secs: default_timeout(), retry: RetryConfig::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { store_path: default_store_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_chat_interval")]
    pub chat_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { chat_interval_ms: default_chat_interval() }
    }
}

impl PollingConfig {
    pub fn chat_interval(&self) -> Duration {
        Duration::from_millis(self.chat_interval_ms)
    }
}

/// Where feature data (streaks, chat) comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Mock,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataSource::Live),
            "mock" => Ok(DataSource::Mock),
            other => Err(anyhow!("data.source must be \"live\" or \"mock\", got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub source: DataSource,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_base_url() -> String { "http://localhost:8080".into() }
fn default_timeout() -> u64 { 15 }
fn default_true() -> bool { true }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_base() -> u64 { 200 }
fn default_backoff_max() -> u64 { 2_000 }
fn default_store_path() -> PathBuf { PathBuf::from("data/session.json") }
fn default_chat_interval() -> u64 { 3_000 }

/// Load from `CONFIG_PATH` (or `brainjar.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_or_default(&path)
}

/// Like [`load_from_file`], but a missing file yields defaults.
pub fn load_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("cannot read {path}: {e}")),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env_overrides()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// `BRAINJAR_API_URL`, `BRAINJAR_SESSION_PATH` and `BRAINJAR_DATA_SOURCE` win over the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BRAINJAR_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(path) = lookup("BRAINJAR_SESSION_PATH").filter(|v| !v.trim().is_empty()) {
            self.session.store_path = PathBuf::from(path);
        }
        if let Some(source) = lookup("BRAINJAR_DATA_SOURCE") {
            self.data.source = source.parse()?;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize()?;
        if self.session.store_path.as_os_str().is_empty() {
            return Err(anyhow!("session.store_path must not be empty"));
        }
        if self.polling.chat_interval_ms == 0 {
            return Err(anyhow!("polling.chat_interval_ms must be > 0"));
        }
        Ok(())
    }
}

impl ApiConfig {
    fn normalize(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(anyhow!("api.base_url is empty; set it in the config file or BRAINJAR_API_URL"));
        }
        let lower = trimmed.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https://"));
        }
        self.base_url = trimmed;
        if self.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be a positive number of seconds"));
        }
        if self.retry.max_attempts == 0 {
            self.retry.max_attempts = 1;
        }
        if self.retry.backoff_max_ms < self.retry.backoff_base_ms {
            return Err(anyhow!("api.retry.backoff_max_ms must be >= backoff_base_ms"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
