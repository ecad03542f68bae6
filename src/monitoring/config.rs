//! Logging configuration
//!
//! Loads from environment variables:
//! - MONITORING_ENABLED: Enable/disable log output (true/false)
//! - RUST_LOG: Tracing level or filter directive (default: info)
//! - LOG_FORMAT: Console format (json or text)
//! - LOG_DIR: Directory for rolling log files (default: ~/.hierchunk/logs)
//! - LOG_TO_FILE: Also write daily-rotated JSON logs (default: false)
//! - LOG_TO_CONSOLE: Write logs to stderr (default: true)

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// Filter used when RUST_LOG is not a valid directive
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_dir: PathBuf,
    pub enable_file_logging: bool,
    pub enable_console_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            log_dir: Self::default_log_dir(),
            enable_file_logging: false,
            enable_console_logging: true,
        }
    }
}

impl MonitoringConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns; an unknown
    /// LOG_FORMAT keeps the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).map(|v| v.trim().eq_ignore_ascii_case("true"));
        let mut config = Self::default();

        if let Some(enabled) = flag("MONITORING_ENABLED") {
            config.enabled = enabled;
        }
        if let Some(log_level) = lookup("RUST_LOG") {
            config.log_level = log_level;
        }
        if let Some(Ok(format)) = lookup("LOG_FORMAT").map(|v| v.parse::<LogFormat>()) {
            config.log_format = format;
        }
        if let Some(log_dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }
        if let Some(to_file) = flag("LOG_TO_FILE") {
            config.enable_file_logging = to_file;
        }
        if let Some(to_console) = flag("LOG_TO_CONSOLE") {
            config.enable_console_logging = to_console;
        }

        config
    }

    /// ~/.hierchunk/logs
    pub fn default_log_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(format!("{}/.hierchunk/logs", home))
    }

    pub fn ensure_log_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_dir)
    }
}
