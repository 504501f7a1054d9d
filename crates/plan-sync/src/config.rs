//! Client configuration
//!
//! Passed explicitly to whatever builds a transport; nothing here is global.
//! Sources layer as defaults, then a TOML file, then environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::{PlanLocator, DEFAULT_PLAN_NAME};

pub const ENV_BASE_URL: &str = "PLAN_SYNC_BASE_URL";
pub const ENV_TENANT: &str = "PLAN_SYNC_TENANT";
pub const ENV_TIMEOUT_MS: &str = "PLAN_SYNC_TIMEOUT_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Plan store client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Store base URL, without the `/plan/...` suffix
    pub base_url: String,
    pub tenant_id: String,
    pub plan_name: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Parse TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] on syntax or unknown keys
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay `PLAN_SYNC_*` variables from the process environment
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the timeout is not a number
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay `PLAN_SYNC_*` variables read through `lookup`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the timeout is not a number
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(tenant) = lookup(ENV_TENANT) {
            self.tenant_id = tenant;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.request_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn locator(&self) -> PlanLocator {
        PlanLocator::new(&self.tenant_id, &self.plan_name)
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            tenant_id: "default".to_string(),
            plan_name: DEFAULT_PLAN_NAME.to_string(),
            request_timeout_ms: 10_000,
            user_agent: concat!("plan-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
