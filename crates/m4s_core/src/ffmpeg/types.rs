//! Types for ffmpeg invocations.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors from launching or supervising the executable.
///
/// A non-zero exit is not an error at this level; callers inspect
/// [`CommandOutput::success`] and classify it themselves.
#[derive(Error, Debug)]
pub enum FfmpegError {
    /// The executable could not be started (not found, not executable).
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The wall-clock budget ran out and the process was killed.
    #[error("{program} did not finish within {} seconds", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    /// Waiting on the running process failed.
    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A manifest input does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The concat manifest could not be written.
    #[error("Failed to write concat manifest: {0}")]
    Manifest(#[source] io::Error),
}

/// Result type for ffmpeg operations.
pub type FfmpegResult<T> = Result<T, FfmpegError>;

/// Captured result of a finished invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when the process was ended by a signal.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// The tool's diagnostic text: stderr, falling back to stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        "no diagnostic output".to_string()
    }
}
