//! Configuration management for runbridge
//!
//! Loads configuration with priority:
//! 1. Explicit config file (`--config`)
//! 2. runbridge.toml in the current directory or any parent
//! 3. Environment variables (fallback)
//! 4. Defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "runbridge.toml";
pub const API_KEY_ENV: &str = "RUNBRIDGE_API_KEY";
pub const BASE_URL_ENV: &str = "RUNBRIDGE_BASE_URL";

/// runbridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Remote execution service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential (can reference env var with ${VAR_NAME})
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fetch the full descriptor when a listed tool has no input schema
    #[serde(default = "default_true")]
    pub describe_missing_schemas: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Optional wall-clock ceiling for a whole run
    pub deadline_secs: Option<u64>,
}

/// Backoff for idempotent requests (listing and describing tools)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredPolicy {
    /// Every declared property is required
    #[default]
    Recompute,
    /// Keep the descriptor's own non-empty `required` list
    Inherit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Property used when a descriptor has no usable parameters
    #[serde(default = "default_property")]
    pub default_property: String,

    /// Placeholder properties some upstreams emit to mean "no parameters"
    #[serde(default = "default_sentinels")]
    pub sentinel_properties: Vec<String>,

    #[serde(default)]
    pub required_policy: RequiredPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,

    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            describe_missing_schemas: true,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            deadline_secs: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_elapsed_ms: default_max_elapsed_ms(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_property: default_property(),
            sentinel_properties: default_sentinels(),
            required_policy: RequiredPolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            instructions: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl RetryConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }
}

impl BridgeConfig {
    /// Load configuration, searching for runbridge.toml and falling back to
    /// the environment when no file exists.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No {} found, configuring from environment", CONFIG_FILE_NAME);
                Ok(Self::from_env())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading configuration from: {:?}", path);

        let contents = fs::read_to_string(path).map_err(|e| {
            Error::config_error(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml_str(&contents)
            .map_err(|e| Error::config_error(format!("Invalid config file {:?}: {}", path, e)))
    }

    /// Parse configuration from TOML text and resolve env references
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: BridgeConfig =
            toml::from_str(contents).map_err(|e| Error::config_error(e.to_string()))?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Defaults plus whatever the environment provides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.resolve_env_vars();
        config
    }

    /// Search the current directory and its parents for runbridge.toml
    fn find_config_file() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolve ${VAR_NAME} references, falling back to well-known variables
    fn resolve_env_vars(&mut self) {
        self.service.api_key = match self.service.api_key.as_deref() {
            Some(key) if !key.is_empty() => Self::resolve_env_var(key),
            _ => env::var(API_KEY_ENV).ok(),
        };

        if let Some(resolved) = Self::resolve_env_var(&self.service.base_url) {
            self.service.base_url = resolved;
        }
        if self.service.base_url == default_base_url() {
            if let Ok(url) = env::var(BASE_URL_ENV) {
                self.service.base_url = url;
            }
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    /// Check everything the bridge needs before registering any tool.
    ///
    /// A missing credential is fatal here rather than per call.
    pub fn validate(&self) -> Result<()> {
        if self.api_key().is_none() {
            return Err(Error::config_error(format!(
                "API key not found. Set it in {}:\n\
                [service]\n\
                api_key = \"${{{}}}\"\n\
                \n\
                Or set environment variable:\n\
                export {}=\"your-key\"",
                CONFIG_FILE_NAME, API_KEY_ENV, API_KEY_ENV
            )));
        }

        url::Url::parse(&self.service.base_url).map_err(|e| {
            Error::config_error(format!("Invalid base_url '{}': {}", self.service.base_url, e))
        })?;

        if self.polling.max_attempts == 0 {
            return Err(Error::config_error("polling.max_attempts must be at least 1"));
        }

        let property = &self.schema.default_property;
        let valid_property = !property.is_empty()
            && property
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_property {
            return Err(Error::config_error(format!(
                "schema.default_property '{}' is not a valid identifier",
                property
            )));
        }

        Ok(())
    }

    /// The configured credential, if non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.service.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Test-friendly defaults pointing at the given service
    pub fn test_defaults(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.service.base_url = base_url.into();
        config.service.api_key = Some("test-api-key".to_string());
        config.polling.interval_ms = 1;
        config.retry.initial_interval_ms = 1;
        config.retry.max_interval_ms = 5;
        config.retry.max_elapsed_ms = 50;
        config
    }
}

fn default_base_url() -> String {
    "https://api.runbridge.dev/v1/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_max_attempts() -> u32 {
    30
}

fn default_initial_interval_ms() -> u64 {
    250
}

fn default_max_interval_ms() -> u64 {
    2000
}

fn default_max_elapsed_ms() -> u64 {
    10_000
}

fn default_property() -> String {
    "input".to_string()
}

fn default_sentinels() -> Vec<String> {
    vec!["random_string".to_string()]
}

fn default_server_name() -> String {
    "runbridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
