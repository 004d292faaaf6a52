//! Job logging.
//!
//! Each job gets a [`JobLogger`] that writes to an optional `<job>.log`
//! file and an optional display callback. ffmpeg output is kept in a
//! bounded tail and replayed into the log when a command fails. Every line
//! is mirrored to `tracing`, which [`init_tracing`] routes to stderr.
//!
//! ```no_run
//! use m4s_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::create("merge_video", "/path/to/logs", LogConfig::default(), None)?;
//! logger.phase("Merge video");
//! logger.command("ffmpeg -f concat -safe 0 -i list.txt -c copy -y out.mp4");
//! logger.success("Merged to out.mp4");
//! # Ok::<(), std::io::Error>(())
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the process-wide subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(LogLevel::Warn.as_filter())
        .with_test_writer()
        .try_init();
}
