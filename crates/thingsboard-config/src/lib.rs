//! Configuration for the ThingsBoard API client.
//!
//! TOML file + `THINGSBOARD_`-prefixed environment variables, merged via
//! figment, translated into `thingsboard_api::ClientConfig`. The backend
//! binary loads this at startup and hands the resulting config to
//! `ThingsboardClient::new`; the api crate itself never reads files.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use thingsboard_api::{ClientConfig, TlsMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// ThingsBoard connection settings as they appear on disk / in the
/// environment. Every field has a default matching a stock local
/// ThingsBoard installation, so an empty config file is valid.
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Instance base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Tenant account username.
    #[serde(default = "default_username")]
    pub username: String,

    /// Tenant password (plaintext -- prefer `THINGSBOARD_PASSWORD`).
    #[serde(default = "default_password")]
    pub password: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Attempts per call for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff base in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    /// Seconds before expiry at which the token is refreshed.
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin: u64,

    /// Assumed JWT lifetime in seconds. Keep in sync with the platform's
    /// `jwt.tokenExpirationTime` if that was tuned.
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,

    /// Path to a custom CA certificate.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification (self-signed instances).
    #[serde(default)]
    pub insecure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: default_password(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            refresh_margin: default_refresh_margin(),
            token_ttl: default_token_ttl(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_url() -> String {
    "http://localhost:8080".into()
}
fn default_username() -> String {
    "tenant@thingsboard.org".into()
}
fn default_password() -> String {
    "tenant".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> f64 {
    1.0
}
fn default_refresh_margin() -> u64 {
    300
}
fn default_token_ttl() -> u64 {
    9 * 60 * 60
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "smarthome", "smarthome").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("smarthome");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from defaults, the canonical config file, and
/// `THINGSBOARD_*` environment variables, in increasing precedence.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path())
}

/// Load settings merging a specific TOML file instead of the canonical path.
pub fn load_settings_from(path: &std::path::Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("THINGSBOARD_"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Serialize settings to TOML and write them to the canonical config path.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Settings {
    /// Build the api crate's runtime config from these settings.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let base_url: url::Url = self.url.parse().map_err(|_| ConfigError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {}", self.url),
        })?;

        if self.max_retries == 0 {
            return Err(ConfigError::Validation {
                field: "max_retries".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !self.retry_delay.is_finite() || self.retry_delay < 0.0 {
            return Err(ConfigError::Validation {
                field: "retry_delay".into(),
                reason: format!("must be a non-negative number, got {}", self.retry_delay),
            });
        }

        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        Ok(ClientConfig {
            base_url,
            username: self.username.clone(),
            password: SecretString::from(self.password.clone()),
            tls,
            timeout: Duration::from_secs(self.timeout),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs_f64(self.retry_delay),
            refresh_margin: Duration::from_secs(self.refresh_margin),
            token_ttl: Duration::from_secs(self.token_ttl),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
