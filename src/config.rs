// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the gear tracker

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use crate::constants::{api, env_vars, limits};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// intervals.icu API key
    pub api_key: String,
    /// Athlete whose gear is tracked, e.g. `i12345`
    pub athlete_id: String,
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between gear polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    api::INTERVALS_API_BASE.to_string()
}

fn default_poll_interval_secs() -> u64 {
    limits::DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    limits::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_config_path() -> String {
    dirs::config_dir()
        .map(|p| p.join("intervals-gear/config.toml"))
        .unwrap_or_else(|| "config.toml".into())
        .to_string_lossy()
        .to_string()
}

impl Config {
    pub fn new(api_key: impl Into<String>, athlete_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            athlete_id: athlete_id.into(),
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Load from a TOML file, falling back to environment variables
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(default_config_path);

        let config = if Path::new(&config_path).exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            dotenv::dotenv().ok();
            Self::from_env()?
        };

        Ok(config.normalized())
    }

    /// Build configuration from `INTERVALS_*` environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(env_vars::API_KEY)
            .with_context(|| format!("{} is not set and no config file was found", env_vars::API_KEY))?;
        let athlete_id = std::env::var(env_vars::ATHLETE_ID)
            .with_context(|| format!("{} is not set and no config file was found", env_vars::ATHLETE_ID))?;

        let mut config = Self::new(api_key, athlete_id);
        if let Ok(base_url) = std::env::var(env_vars::BASE_URL) {
            config.base_url = base_url;
        }
        if let Ok(value) = std::env::var(env_vars::POLL_INTERVAL_SECS) {
            config.poll_interval_secs = value.parse()
                .with_context(|| format!("Invalid {} value", env_vars::POLL_INTERVAL_SECS))?;
        }
        if let Ok(value) = std::env::var(env_vars::REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = value.parse()
                .with_context(|| format!("Invalid {} value", env_vars::REQUEST_TIMEOUT_SECS))?;
        }

        Ok(config)
    }

    pub fn save(&self, path: Option<String>) -> Result<()> {
        let config_path = path.unwrap_or_else(default_config_path);

        let parent = Path::new(&config_path).parent()
            .context("Invalid config path")?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn normalized(mut self) -> Self {
        if self.poll_interval_secs < limits::MIN_POLL_INTERVAL_SECS {
            warn!(
                configured = self.poll_interval_secs,
                minimum = limits::MIN_POLL_INTERVAL_SECS,
                "Poll interval too short, using minimum"
            );
            self.poll_interval_secs = limits::MIN_POLL_INTERVAL_SECS;
        }
        self
    }
}
