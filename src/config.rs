//! Configuration for the notification publisher
//!
//! Settings arrive from two places: command-line flags and an optional TOML
//! file. Both are read into [`BrokerOverrides`], merged with the CLI taking
//! precedence, and frozen into an immutable [`BrokerSection`] that is passed by
//! reference into the connection factory and publisher. Nothing in this crate
//! reads configuration from global state after startup.

use crate::notification::TemporalExtent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_USERNAME_ENV: &str = "WISPUB_BROKER_USER";
pub const DEFAULT_PASSWORD_ENV: &str = "WISPUB_BROKER_PASSWD";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("Failed to read CA certificate {}: {source}", path.display())]
    CaCertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No valid certificate found in {}", path.display())]
    CaCertInvalid { path: PathBuf },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Top-level layout of the optional TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub broker: BrokerOverrides,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Broker settings where every field may still be missing
///
/// Used both for the `[broker]` table of the config file and for values
/// collected from CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BrokerOverrides {
    /// Broker URL, `tcp://host[:port]` or `ssl://host[:port]`
    pub url: Option<String>,
    /// Environment variable containing the username
    pub username_env: Option<String>,
    /// Environment variable containing the password
    pub password_env: Option<String>,
    /// PEM file with extra CA certificates to trust
    pub ca_cert: Option<PathBuf>,
    /// Skip remote certificate verification (testing only)
    pub insecure: Option<bool>,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: Option<u64>,
    /// MQTT client identifier
    pub client_id: Option<String>,
}

impl BrokerOverrides {
    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: BrokerOverrides) -> BrokerOverrides {
        BrokerOverrides {
            url: self.url.or(fallback.url),
            username_env: self.username_env.or(fallback.username_env),
            password_env: self.password_env.or(fallback.password_env),
            ca_cert: self.ca_cert.or(fallback.ca_cert),
            insecure: self.insecure.or(fallback.insecure),
            keep_alive_secs: self.keep_alive_secs.or(fallback.keep_alive_secs),
            client_id: self.client_id.or(fallback.client_id),
        }
    }

    /// Freeze into a resolved section, applying defaults
    pub fn resolve(self) -> Result<BrokerSection, ConfigError> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingSetting("broker url"))?;

        let keep_alive_secs = self.keep_alive_secs.unwrap_or(DEFAULT_KEEP_ALIVE_SECS);
        if keep_alive_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "keep_alive_secs must be greater than zero".to_string(),
            ));
        }

        Ok(BrokerSection {
            url,
            username_env: self
                .username_env
                .unwrap_or_else(|| DEFAULT_USERNAME_ENV.to_string()),
            password_env: self
                .password_env
                .unwrap_or_else(|| DEFAULT_PASSWORD_ENV.to_string()),
            tls: TlsOptions {
                ca_cert: self.ca_cert,
                insecure: self.insecure.unwrap_or(false),
            },
            keep_alive_secs,
            client_id: self.client_id.unwrap_or_default(),
        })
    }
}

/// Resolved broker settings
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSection {
    pub url: String,
    pub username_env: String,
    pub password_env: String,
    pub tls: TlsOptions,
    pub keep_alive_secs: u64,
    /// May be empty; the connection factory generates one in that case
    pub client_id: String,
}

impl BrokerSection {
    /// Section with defaults for everything but the URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username_env: DEFAULT_USERNAME_ENV.to_string(),
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
            tls: TlsOptions::default(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            client_id: String::new(),
        }
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Resolve broker credentials from the environment
    ///
    /// Both variables must be set; an empty value is accepted.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials {
            username: Self::get_env_var_required(&self.username_env)?,
            password: Self::get_env_var_required(&self.password_env)?,
        })
    }
}

/// Certificate trust policy for `ssl://` brokers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TlsOptions {
    pub ca_cert: Option<PathBuf>,
    pub insecure: bool,
}

/// Broker username and password
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything needed to build one data notification
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub input: PathBuf,
    pub topic: String,
    pub download_url: Url,
    /// Explicit content type; bypasses extension inference
    pub mime_type: Option<String>,
    pub metadata_id: Option<String>,
    pub temporal: Option<TemporalExtent>,
    /// Merged into `properties.dataDomain` when set
    pub data_domain: Option<String>,
}

/// A metadata record to publish unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRequest {
    pub input: PathBuf,
    pub topic: String,
}

/// Flags that change how a run ends rather than what it builds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunOptions {
    /// Print topic and document instead of publishing
    pub dry_run: bool,
    /// Log the payload before sending
    pub verbose: bool,
}

/// Client identifier for a center: the lower-cased center id
pub fn client_id_for_center(center: Option<&str>) -> Option<String> {
    center
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
}
