//! Configuration management for Faultline.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Main configuration for the Faultline server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Rule engine configuration.
    pub engine: EngineConfig,
    /// Injection behavior configuration.
    pub injection: InjectionConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Validates the configuration at startup.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range probabilities, a zero rule ceiling,
    /// a zero statistics capacity, or an unknown log level.
    pub fn validate(&self) -> crate::Result<()> {
        if self.engine.max_rules == 0 {
            return Err(crate::Error::Config("engine.max_rules must be positive".to_string()));
        }
        if self.engine.stats_capacity == 0 {
            return Err(crate::Error::Config("engine.stats_capacity must be positive".to_string()));
        }
        if self.engine.stats_queue_size == 0 {
            return Err(crate::Error::Config(
                "engine.stats_queue_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.engine.default_probability) {
            return Err(crate::Error::Config(
                "engine.default_probability must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.injection.global_probability) {
            return Err(crate::Error::Config(
                "injection.global_probability must be within [0, 1]".to_string(),
            ));
        }
        if self.injection.max_delay_ms == 0 {
            return Err(crate::Error::Config(
                "injection.max_delay_ms must be positive".to_string(),
            ));
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => {
                Err(crate::Error::Config(format!("invalid logging.level: {other}")))
            }
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind: SocketAddr,
    /// Deployment environment. Sample rules are seeded in `development`.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9500".parse().expect("valid default address"),
            environment: "development".to_string(),
        }
    }
}

/// Rule engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of rules the store will accept.
    pub max_rules: usize,
    /// Probability applied to rules submitted without conditions.
    pub default_probability: f64,
    /// Record injection events into the statistics store.
    pub enable_statistics: bool,
    /// Reserved for time-scheduled rules. Surfaced through the health
    /// endpoint; no scheduler ships yet.
    pub enable_scheduling: bool,
    /// Retention window for recorded events, in hours.
    pub stat_retention_hours: i64,
    /// Maximum number of events the statistics store retains.
    pub stats_capacity: usize,
    /// Capacity of the evaluation-to-statistics queue. Events beyond this
    /// are dropped (newest first) rather than blocking evaluation.
    pub stats_queue_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rules: 100,
            default_probability: 0.1,
            enable_statistics: true,
            enable_scheduling: false,
            stat_retention_hours: 24,
            stats_capacity: 10_000,
            stats_queue_size: 1024,
        }
    }
}

/// Injection behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Global gate applied before rule evaluation. 1.0 evaluates every call.
    pub global_probability: f64,
    /// Allow HTTP error actions.
    pub enable_http_errors: bool,
    /// Allow network error actions.
    pub enable_network_errors: bool,
    /// Allow database error actions.
    pub enable_database_errors: bool,
    /// Allow storage error actions.
    pub enable_storage_errors: bool,
    /// Upper bound for delay actions, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            global_probability: 1.0,
            enable_http_errors: true,
            enable_network_errors: true,
            enable_database_errors: true,
            enable_storage_errors: true,
            max_delay_ms: 30_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
    /// Include HTTP request/response logging.
    pub log_requests: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty, log_requests: true }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection and endpoint.
    pub enabled: bool,
    /// Port for the metrics endpoint (separate from main server).
    pub port: u16,
    /// Bind address for the metrics server.
    pub bind: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true, port: 9501, bind: "0.0.0.0".to_string() }
    }
}
