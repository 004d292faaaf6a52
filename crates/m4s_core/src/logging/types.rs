//! Log levels, per-job log configuration and line decoration.

use serde::{Deserialize, Serialize};

use crate::config::LoggingSettings;

/// Severity of a job log line. Ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How a [`JobLogger`](super::JobLogger) treats its lines.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Lines below this level are dropped.
    pub level: LogLevel,
    /// When set, ffmpeg output is only kept for the failure tail.
    pub compact: bool,
    /// ffmpeg output lines replayed when a command fails.
    pub error_tail: usize,
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::from(&LoggingSettings::default())
    }
}

impl LogConfig {
    /// Everything, including live ffmpeg output and a longer tail.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            error_tail: 50,
            ..Self::default()
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            compact: settings.compact,
            error_tail: settings.error_tail as usize,
            show_timestamps: settings.show_timestamps,
        }
    }
}

/// Receives every line a job logger writes.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Marker put around a log line so phases and failures stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// `$ ffmpeg ...`
    Command,
    /// `=== Merge video ===`
    Phase,
    /// `--- Mux ---`
    Section,
    Success,
    Warning,
    Error,
    None,
}

impl MessagePrefix {
    pub fn format(self, message: &str) -> String {
        let (open, close) = match self {
            MessagePrefix::Command => ("$ ", ""),
            MessagePrefix::Phase => ("=== ", " ==="),
            MessagePrefix::Section => ("--- ", " ---"),
            MessagePrefix::Success => ("[SUCCESS] ", ""),
            MessagePrefix::Warning => ("[WARNING] ", ""),
            MessagePrefix::Error => ("[ERROR] ", ""),
            MessagePrefix::None => ("", ""),
        };
        format!("{open}{message}{close}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_wrap_the_message() {
        assert_eq!(MessagePrefix::Command.format("ffmpeg -version"), "$ ffmpeg -version");
        assert_eq!(MessagePrefix::Phase.format("Mux"), "=== Mux ===");
        assert_eq!(MessagePrefix::Error.format("boom"), "[ERROR] boom");
        assert_eq!(MessagePrefix::None.format("plain"), "plain");
    }

    #[test]
    fn config_follows_settings() {
        let mut settings = LoggingSettings::default();
        settings.compact = false;
        settings.error_tail = 7;
        settings.show_timestamps = false;

        let config = LogConfig::from(&settings);
        assert!(!config.compact);
        assert_eq!(config.error_tail, 7);
        assert!(!config.show_timestamps);
    }

    #[test]
    fn debug_config_is_verbose() {
        let config = LogConfig::debug();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.compact);
        assert!(config.error_tail > LogConfig::default().error_tail);
    }

    #[test]
    fn filter_directives() {
        assert_eq!(LogLevel::Debug.as_filter(), "debug");
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
    }
}
