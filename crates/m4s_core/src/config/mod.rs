//! Settings file for M4S Merge.
//!
//! ```no_run
//! use m4s_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("m4s-merge/settings.toml");
//! config.load_or_create()?;
//! println!("ffmpeg: {}", config.settings().ffmpeg.path);
//!
//! config.settings_mut().ffmpeg.timeout_secs = 7200;
//! config.update_section(ConfigSection::Ffmpeg)?;
//! # Ok::<(), m4s_core::config::ConfigError>(())
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, FfmpegSettings, LoggingSettings, PathSettings, Settings};
