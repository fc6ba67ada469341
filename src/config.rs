//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Directory name under the platform config dir
pub const APP_DIR: &str = "dracin_player";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_BASE_URL is not defined")]
    MissingBaseUrl,
    #[error("invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream catalog origin, e.g. `https://api.example.com`
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    // Player timings
    #[serde(default = "default_controls_hide")]
    pub controls_hide_ms: u64,
    #[serde(default = "default_fullscreen_grace")]
    pub fullscreen_grace_ms: u64,
    #[serde(default = "default_skip")]
    pub skip_seconds: f64,
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

fn default_app_name() -> String { "DramaBox".to_string() }
fn default_timeout() -> u64 { 15 }
fn default_user_agent() -> String { format!("DracinPlayer/{}", env!("CARGO_PKG_VERSION")) }
fn default_controls_hide() -> u64 { 3000 }
fn default_fullscreen_grace() -> u64 { 500 }
fn default_skip() -> f64 { 10.0 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            app_name: default_app_name(),
            request_timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            controls_hide_ms: default_controls_hide(),
            fullscreen_grace_ms: default_fullscreen_grace(),
            skip_seconds: default_skip(),
            autoplay: true,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/dracin_player/<file>`, creating the directory on the way
    pub fn data_path(file: &str) -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        fs::create_dir_all(&path).ok();
        path.push(file);
        path
    }

    fn config_path() -> PathBuf {
        Self::data_path("config.json")
    }

    /// Load from disk (defaults when missing or unreadable), then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring malformed config {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Cannot read config {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// `API_BASE_URL` and `APP_NAME` take precedence over the file
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(name) = lookup("APP_NAME").filter(|v| !v.trim().is_empty()) {
            self.app_name = name;
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    log::warn!("Failed to save config to {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("Failed to serialize config: {}", e),
        }
    }

    /// Base URL, validated
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        let raw = self.api_base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        url::Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
