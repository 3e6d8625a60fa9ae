//! Configuration management for the Noteshare service.
//!
//! Supports multiple configuration sources with precedence:
//! 1. Environment variables (highest priority)
//! 2. TOML configuration file
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the Noteshare service.
///
/// Can be loaded from a TOML file or constructed with defaults.
/// Environment variables override TOML settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Note and tombstone retention
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Request payload limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Per-client rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Expiry sweeper schedule
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration (bind address, public URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used to build `view_url` values
    /// (default: "http://localhost:8080")
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

/// Retention windows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Days a note is retained before becoming purge-eligible (default: 30)
    #[serde(default = "default_note_ttl_days")]
    pub note_ttl_days: u32,

    /// Days a tombstone is kept before pruning (default: 90)
    #[serde(default = "default_tombstone_ttl_days")]
    pub tombstone_ttl_days: u32,
}

/// Request payload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Max combined ciphertext + tag size in bytes (default: 512000, 500 KiB)
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

/// Per-client rate limiting (budget per fixed window; 0 disables a class)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Read requests allowed per window (default: 120)
    #[serde(default = "default_read_budget")]
    pub read_budget: u32,

    /// Write requests allowed per window (default: 30)
    #[serde(default = "default_write_budget")]
    pub write_budget: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

/// Expiry sweeper schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep cycles (default: 60)
    #[serde(default = "default_sweep_interval_seconds")]
    pub interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty (default: "pretty")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_note_ttl_days() -> u32 {
    30
}

fn default_tombstone_ttl_days() -> u32 {
    90
}

fn default_max_payload_bytes() -> usize {
    512_000
}

fn default_read_budget() -> u32 {
    120
}

fn default_write_budget() -> u32 {
    30
}

fn default_window_seconds() -> u64 {
    60
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            retention: RetentionConfig::default(),
            limits: LimitsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sweep: SweepConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            note_ttl_days: default_note_ttl_days(),
            tombstone_ttl_days: default_tombstone_ttl_days(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            read_budget: default_read_budget(),
            write_budget: default_write_budget(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file doesn't exist or has invalid TOML syntax.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::TomlError { path, source: e })
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Loads from `config.toml` if it exists, otherwise uses defaults.
    /// Environment variables override TOML/default values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if std::path::Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NOTESHARE_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("NOTESHARE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(url) = std::env::var("NOTESHARE_PUBLIC_URL") {
            self.server.public_url = url;
        }

        if let Ok(days) = std::env::var("NOTESHARE_NOTE_TTL_DAYS") {
            if let Ok(days) = days.parse() {
                self.retention.note_ttl_days = days;
            }
        }

        if let Ok(days) = std::env::var("NOTESHARE_TOMBSTONE_TTL_DAYS") {
            if let Ok(days) = days.parse() {
                self.retention.tombstone_ttl_days = days;
            }
        }

        if let Ok(bytes) = std::env::var("NOTESHARE_MAX_PAYLOAD_BYTES") {
            if let Ok(bytes) = bytes.parse() {
                self.limits.max_payload_bytes = bytes;
            }
        }

        if let Ok(budget) = std::env::var("NOTESHARE_READ_BUDGET") {
            if let Ok(budget) = budget.parse() {
                self.rate_limit.read_budget = budget;
            }
        }

        if let Ok(budget) = std::env::var("NOTESHARE_WRITE_BUDGET") {
            if let Ok(budget) = budget.parse() {
                self.rate_limit.write_budget = budget;
            }
        }

        if let Ok(seconds) = std::env::var("NOTESHARE_RATE_WINDOW_SECONDS") {
            if let Ok(seconds) = seconds.parse() {
                self.rate_limit.window_seconds = seconds;
            }
        }

        if let Ok(seconds) = std::env::var("NOTESHARE_SWEEP_INTERVAL_SECONDS") {
            if let Ok(seconds) = seconds.parse() {
                self.sweep.interval_seconds = seconds;
            }
        }

        if let Ok(level) = std::env::var("NOTESHARE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("NOTESHARE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if self.server.public_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.public_url cannot be empty".to_string(),
            ));
        }

        if self.retention.note_ttl_days == 0 {
            return Err(ConfigError::ValidationError(
                "retention.note_ttl_days must be > 0".to_string(),
            ));
        }

        if self.retention.tombstone_ttl_days == 0 {
            return Err(ConfigError::ValidationError(
                "retention.tombstone_ttl_days must be > 0".to_string(),
            ));
        }

        if self.limits.max_payload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_payload_bytes must be > 0".to_string(),
            ));
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.window_seconds must be > 0".to_string(),
            ));
        }

        if self.sweep.interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "sweep.interval_seconds must be > 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of: {}",
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading configuration file
    #[error("Failed to read config file {path:?}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse TOML in {path:?}: {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
