//! Configuration types for bitso-capture

use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::exchange::BITSO_API_URL;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "BITSO_API_KEY";
/// Environment variable holding the API secret
pub const API_SECRET_ENV: &str = "BITSO_API_SECRET";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Exchange API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the exchange REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    BITSO_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 10,
        }
    }
}

/// Capture loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Books to capture, each in its own loop
    #[serde(default = "default_books")]
    pub books: Vec<String>,

    /// Requests per batch; each batch starts a new partition file
    #[serde(default = "default_requests_per_partition")]
    pub requests_per_partition: u32,

    /// Batches to complete before the run ends
    #[serde(default = "default_progress_cycles")]
    pub progress_cycles: u32,

    /// Sleep between loop ticks (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Wall-clock minute the run waits for before starting
    #[serde(default)]
    pub align_minute: u32,

    /// Delay between starting consecutive book loops (seconds)
    #[serde(default = "default_stagger_secs")]
    pub stagger_secs: u64,
}

fn default_books() -> Vec<String> {
    vec!["usd_mxn".to_string(), "btc_mxn".to_string()]
}
fn default_requests_per_partition() -> u32 {
    600
}
fn default_progress_cycles() -> u32 {
    12
}
fn default_tick_interval_ms() -> u64 {
    500
}
fn default_stagger_secs() -> u64 {
    60
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            books: default_books(),
            requests_per_partition: 600,
            progress_cycles: 12,
            tick_interval_ms: 500,
            align_minute: 0,
            stagger_secs: 60,
        }
    }
}

/// Data lake configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Root directory of the data lake
    #[serde(default = "default_lake_root")]
    pub lake_root: PathBuf,

    /// Pending writes buffered per book before the loop blocks
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_lake_root() -> PathBuf {
    PathBuf::from("./data_lake")
}
fn default_queue_depth() -> usize {
    256
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            lake_root: default_lake_root(),
            queue_depth: 256,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Port for the Prometheus scrape endpoint; disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log level filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Exchange API credentials, read from the environment at startup
#[derive(Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    /// Read credentials from `BITSO_API_KEY` / `BITSO_API_SECRET`
    pub fn from_env() -> anyhow::Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{API_KEY_ENV} is not set"))?;
        let secret = std::env::var(API_SECRET_ENV)
            .with_context(|| format!("{API_SECRET_ENV} is not set"))?;
        Ok(Self { key, secret })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}
