//! User settings. Each field of [`Settings`] is one TOML table.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Output, scratch and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// External executable and its time limits.
    #[serde(default)]
    pub ffmpeg: FfmpegSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration. Empty strings mean "use the default".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for merged files (empty = chosen by the application).
    #[serde(default)]
    pub output_folder: String,

    /// Root for scratch workspaces and concat manifests (empty = system temp).
    #[serde(default)]
    pub temp_root: String,

    /// Folder for per-job log files (empty = no log files).
    #[serde(default)]
    pub logs_folder: String,
}

impl PathSettings {
    pub fn output_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.output_folder)
    }

    pub fn temp_root_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.temp_root)
    }

    pub fn logs_dir(&self) -> Option<PathBuf> {
        non_empty_path(&self.logs_folder)
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

/// External executable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegSettings {
    /// Executable name or full path.
    #[serde(default = "default_ffmpeg_path")]
    pub path: String,

    /// Hard limit for one merge or mux invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Limit for the `-version` availability probe, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for job log lines.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format (tool output only kept for the error tail).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Log each ffmpeg command one argument per line.
    #[serde(default)]
    pub show_command_pretty: bool,

    /// Log each ffmpeg command as a JSON array.
    #[serde(default)]
    pub show_command_json: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
            show_command_pretty: false,
            show_command_json: false,
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Ffmpeg,
    Logging,
}

impl ConfigSection {
    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Ffmpeg => "ffmpeg",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 3] {
        [
            ConfigSection::Paths,
            ConfigSection::Ffmpeg,
            ConfigSection::Logging,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[paths]"));
        assert!(toml_str.contains("[ffmpeg]"));
        assert!(toml_str.contains("timeout_secs = 3600"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let settings: Settings = toml::from_str("[ffmpeg]\npath = \"/usr/bin/ffmpeg\"\n").unwrap();
        assert_eq!(settings.ffmpeg.path, "/usr/bin/ffmpeg");
        assert_eq!(settings.ffmpeg.timeout_secs, 3600);
        assert_eq!(settings.ffmpeg.probe_timeout_secs, 5);
        assert!(settings.logging.compact);
    }

    #[test]
    fn empty_paths_mean_defaults() {
        let mut paths = PathSettings::default();
        assert_eq!(paths.output_dir(), None);
        assert_eq!(paths.temp_root_dir(), None);

        paths.temp_root = "  /scratch  ".to_string();
        assert_eq!(paths.temp_root_dir(), Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn log_level_parses_lowercase() {
        let settings: Settings = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }
}
