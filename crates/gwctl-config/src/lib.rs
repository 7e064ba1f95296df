//! Configuration for embedding the gateway controller.
//!
//! TOML file + environment loading, validation, translation to
//! `gwctl_core::ControllerConfig`, and a tracing subscriber setup for
//! applications and tests. The core itself never reads files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gwctl_api::ServiceNames;
use gwctl_core::ControllerConfig;
use gwctl_core::config::DEFAULT_SESSION_PORT;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerSection,

    /// Bus names of the gateway agent.
    #[serde(default)]
    pub services: ServiceNames,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ControllerSection {
    /// Per-call deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_session_port")]
    pub session_port: u16,

    #[serde(default = "default_event_channel_size")]
    pub event_channel_size: usize,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            session_port: default_session_port(),
            event_channel_size: default_event_channel_size(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_session_port() -> u16 {
    DEFAULT_SESSION_PORT
}
fn default_event_channel_size() -> usize {
    256
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSection {
    /// `EnvFilter` directive, e.g. `"info,gwctl_core=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "gwctl", "gwctl").map_or_else(
        || PathBuf::from(".gwctl").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file leaves the defaults in place;
/// `GWCTL_`-prefixed variables override both, with `__` separating
/// sections (`GWCTL_CONTROLLER__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GWCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn check_interface(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || !name.contains('.') {
        return Err(invalid(field, format!("'{name}' is not a dotted interface name")));
    }
    Ok(())
}

impl Config {
    /// Validate and build the runtime controller configuration.
    pub fn to_controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        if self.controller.timeout == 0 {
            return Err(invalid("controller.timeout", "must be at least 1 second"));
        }
        if self.controller.event_channel_size == 0 {
            return Err(invalid("controller.event_channel_size", "must be positive"));
        }

        check_interface("services.acl_interface", &self.services.acl_interface)?;
        check_interface("services.app_interface", &self.services.app_interface)?;
        check_interface("services.app_mgmt_interface", &self.services.app_mgmt_interface)?;
        if !self.services.object_path_prefix.starts_with('/') {
            return Err(invalid(
                "services.object_path_prefix",
                format!("'{}' is not an object path", self.services.object_path_prefix),
            ));
        }

        Ok(ControllerConfig {
            call_timeout: Duration::from_secs(self.controller.timeout),
            services: self.services.clone(),
            session_port: self.controller.session_port,
            event_channel_size: self.controller.event_channel_size,
        })
    }
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install a global subscriber for `logging`.
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init_tracing(logging: &LoggingSection) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .map_err(|e| invalid("logging.filter", e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| ConfigError::Tracing(e.to_string()))?;

    tracing::debug!(filter = %logging.filter, format = ?logging.format, "tracing initialized");
    Ok(())
}
