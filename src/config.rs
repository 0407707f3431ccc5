//! Centralized `DATAFIN_*` environment configuration.
//!
//! Loaded once by the presentation binary at startup and passed into the
//! core; the library itself never reads the environment implicitly. Mirrors
//! `original_source`'s `core/config.py` settings split (logging / network /
//! debug) without pulling in a settings framework — the teacher crate has no
//! equivalent dependency, so this follows its own idiom of a small
//! hand-rolled struct populated from `std::env`.

use std::env;
use std::time::Duration;

/// Logging verbosity, mirrors `DATAFIN_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" | "WARN" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "CRITICAL" => Some(LogLevel::Critical),
            _ => None,
        }
    }

    /// Translate to a `tracing_subscriber::EnvFilter` directive string.
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "error",
        }
    }
}

/// Network timeouts and retry defaults, mirrors `DATAFIN_NETWORK_*`.
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_retries: 3,
            retry_backoff: 1.0,
        }
    }
}

/// Top-level configuration, loaded once via [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub network: NetworkConfig,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_file: None,
            network: NetworkConfig::default(),
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from `DATAFIN_*` environment variables, falling
    /// back to defaults for anything missing or out of range.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(raw) = env::var("DATAFIN_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&raw) {
                config.log_level = level;
            }
        }

        if let Ok(raw) = env::var("DATAFIN_LOG_FILE") {
            if !raw.trim().is_empty() {
                config.log_file = Some(raw);
            }
        }

        if let Ok(raw) = env::var("DATAFIN_NETWORK_TIMEOUT") {
            if let Ok(secs) = raw.parse::<u64>() {
                config.network.timeout = Duration::from_secs(secs.clamp(30, 3600));
            }
        }

        if let Ok(raw) = env::var("DATAFIN_NETWORK_MAX_RETRIES") {
            if let Ok(retries) = raw.parse::<u32>() {
                config.network.max_retries = retries.clamp(0, 10);
            }
        }

        if let Ok(raw) = env::var("DATAFIN_NETWORK_RETRY_BACKOFF") {
            if let Ok(mult) = raw.parse::<f64>() {
                config.network.retry_backoff = mult.clamp(0.1, 10.0);
            }
        }

        if let Ok(raw) = env::var("DATAFIN_DEBUG") {
            config.debug = matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }
}
