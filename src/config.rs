//! 配置：超时、User-Agent、聚合 API 地址、提供者端点与密钥。
//!
//! Facade configuration. Sources, lowest precedence first: built-in defaults, an optional
//! YAML file named by `BOT_SERVICES_CONFIG`, then `BOT_SERVICES_*` environment variables.
//! `FacadeBuilder` calls override all of them.

use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AGGREGATOR_BASE_URL: &str = "https://myapiadonix.vercel.app";
pub const DEFAULT_LANGUAGE: &str = "es";
pub const DEFAULT_WEATHER_UNITS: &str = "metric";

/// Keyring service name used for API key lookup.
pub const KEYRING_SERVICE: &str = "bot-services";

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "BOT_SERVICES_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Per-HTTP-call timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Base URL of the aggregation API (YouTube backup, video search backup, upscaling).
    pub aggregator_base_url: String,
    /// Target language when a caller gives none; also the weather description language.
    pub default_language: String,
    pub weather_units: String,
    pub proxy_url: Option<String>,
    /// Provider id (e.g. `youtube.y2mate`) to endpoint URL overrides.
    pub endpoints: HashMap<String, String>,
    /// Key name (`rapidapi`, `openweathermap`, `removebg`, `youtube`) to secret.
    pub api_keys: HashMap<String, String>,
    /// Read `<NAME>_API_KEY` environment variables for keys missing from `api_keys`.
    pub use_env_keys: bool,
    pub use_keyring: bool,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("bot-services/{}", env!("CARGO_PKG_VERSION")),
            aggregator_base_url: DEFAULT_AGGREGATOR_BASE_URL.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            weather_units: DEFAULT_WEATHER_UNITS.to_string(),
            proxy_url: None,
            endpoints: HashMap::new(),
            api_keys: HashMap::new(),
            use_env_keys: true,
            use_keyring: true,
        }
    }
}

impl FacadeConfig {
    /// Defaults, then the YAML file from `BOT_SERVICES_CONFIG` (if set), then env overrides.
    pub fn load() -> Result<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim())?,
            _ => Self::default(),
        };
        Ok(base.apply_env())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: FacadeConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BOT_SERVICES_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(secs) = get("BOT_SERVICES_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                self.timeout_secs = secs;
            }
        }
        if let Some(ua) = get("BOT_SERVICES_USER_AGENT") {
            self.user_agent = ua;
        }
        if let Some(url) = get("BOT_SERVICES_BASE_URL") {
            self.aggregator_base_url = url;
        }
        if let Some(lang) = get("BOT_SERVICES_DEFAULT_LANG") {
            self.default_language = lang;
        }
        if let Some(proxy) = get("BOT_SERVICES_PROXY_URL") {
            self.proxy_url = Some(proxy);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be at least one second",
                ErrorContext::new()
                    .with_field_path("timeout_secs")
                    .with_source("config_loader"),
            ));
        }
        if self.default_language.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "default language must not be empty",
                ErrorContext::new()
                    .with_field_path("default_language")
                    .with_source("config_loader"),
            ));
        }
        url::Url::parse(&self.aggregator_base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid aggregator base url: {}", e),
                ErrorContext::new()
                    .with_field_path("aggregator_base_url")
                    .with_details(self.aggregator_base_url.clone())
                    .with_source("config_loader"),
            )
        })?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Endpoint for `provider_id`, or `default` when not overridden.
    pub fn endpoint(&self, provider_id: &str, default: &str) -> String {
        self.endpoints
            .get(provider_id)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// `path` joined onto the aggregator base URL.
    pub fn aggregator_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.aggregator_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Resolve an API key: config map, then `<NAME>_API_KEY`, then the OS keyring.
    pub fn api_key(&self, name: &str) -> Option<String> {
        self.api_key_with(name, |var| std::env::var(var).ok())
    }

    pub(crate) fn api_key_with(
        &self,
        name: &str,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        if let Some(key) = self.api_keys.get(name).filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }

        if self.use_env_keys {
            let env_var = format!("{}_API_KEY", name.replace('-', "_").to_uppercase());
            if let Some(key) = env_lookup(&env_var).filter(|k| !k.trim().is_empty()) {
                return Some(key);
            }
        }

        if self.use_keyring {
            if let Ok(entry) = Entry::new(KEYRING_SERVICE, name) {
                if let Ok(key) = entry.get_password() {
                    return Some(key);
                }
            }
        }
        None
    }
}
