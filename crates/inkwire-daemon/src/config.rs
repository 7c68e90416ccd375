//! Command line and config file.
//!
//! Settings come from an optional TOML file; the command line (and its
//! environment fallbacks) overrides the file.

use clap::Parser;
use inkwire_client::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DISCOVERY_URL, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_MAX_RETRY_DELAY, DEFAULT_RETRY_DELAY, ManagerConfig, RetryPolicy,
};
use inkwire_core::{Credential, Fingerprint};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "inkwire", version, about = "Show chat notifications on a small display")]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, env = "INKWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bot token.
    #[arg(long, env = "INKWIRE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SHA-256 fingerprint of the discovery server certificate.
    #[arg(long)]
    pub fingerprint: Option<Fingerprint>,

    /// Discovery endpoint.
    #[arg(long)]
    pub discovery_url: Option<String>,
}

/// Retry mode as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryFile {
    #[serde(default)]
    pub mode: RetryMode,
    pub delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// Config file contents. Every field is optional here; [`Config`] decides
/// what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub token: Option<Credential>,
    pub discovery_url: Option<String>,
    pub fingerprint: Option<Fingerprint>,
    pub stream_fingerprint: Option<Fingerprint>,
    pub heartbeat_interval_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetryFile,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings.
#[derive(Debug)]
pub struct Config {
    pub credential: Credential,
    pub discovery_url: String,
    pub fingerprint: Fingerprint,
    pub stream_fingerprint: Option<Fingerprint>,
    pub request_timeout: Duration,
    pub manager: ManagerConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let credential = cli
            .token
            .clone()
            .map(Credential::new)
            .or(file.token)
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::Missing("token"))?;

        let fingerprint = cli
            .fingerprint
            .clone()
            .or(file.fingerprint)
            .ok_or(ConfigError::Missing("fingerprint"))?;

        let discovery_url = cli
            .discovery_url
            .clone()
            .or(file.discovery_url)
            .unwrap_or_else(|| DEFAULT_DISCOVERY_URL.to_string());

        let heartbeat_interval = secs(
            file.heartbeat_interval_secs,
            DEFAULT_HEARTBEAT_INTERVAL,
            "heartbeat_interval_secs",
        )?;
        let connect_timeout = secs(
            file.connect_timeout_secs,
            DEFAULT_CONNECT_TIMEOUT,
            "connect_timeout_secs",
        )?;
        let request_timeout = secs(
            file.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT,
            "request_timeout_secs",
        )?;

        let delay = millis(file.retry.delay_ms, DEFAULT_RETRY_DELAY, "delay_ms")?;
        let max_delay = millis(file.retry.max_delay_ms, DEFAULT_MAX_RETRY_DELAY, "max_delay_ms")?;
        let retry = match file.retry.mode {
            RetryMode::Fixed => RetryPolicy::Fixed(delay),
            RetryMode::Exponential => RetryPolicy::Exponential {
                initial: delay,
                max: max_delay.max(delay),
            },
        };

        Ok(Self {
            credential,
            discovery_url,
            fingerprint,
            stream_fingerprint: file.stream_fingerprint,
            request_timeout,
            manager: ManagerConfig {
                heartbeat_interval,
                connect_timeout,
                retry,
            },
        })
    }
}

fn secs(value: Option<u64>, default: Duration, name: &'static str) -> Result<Duration, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Zero(name)),
        Some(n) => Ok(Duration::from_secs(n)),
        None => Ok(default),
    }
}

fn millis(value: Option<u64>, default: Duration, name: &'static str) -> Result<Duration, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Zero(name)),
        Some(n) => Ok(Duration::from_millis(n)),
        None => Ok(default),
    }
}
