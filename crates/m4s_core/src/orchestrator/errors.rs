//! Failures of merge and mux calls.
//!
//! A [`StepError`] says what went wrong inside one step; a
//! [`PipelineError`] adds which job and step it happened in. Both layers
//! expose [`ErrorKind`] so callers can branch on the failure class without
//! matching message text.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::ffmpeg::FfmpegError;

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Neither video nor audio segments were given.
    NoInput,
    /// A merge was asked to concatenate zero segments.
    EmptyInput,
    /// A named input path does not exist.
    MissingInput,
    /// The executable could not run or exited non-zero.
    ExternalTool,
    /// The executable reported success but wrote no file.
    OutputMissing,
    /// The wall-clock budget ran out.
    Timeout,
    /// Local filesystem failure (output dir, manifest, workspace).
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoInput => "NoInputError",
            ErrorKind::EmptyInput => "EmptyInputError",
            ErrorKind::MissingInput => "MissingInputError",
            ErrorKind::ExternalTool => "ExternalToolError",
            ErrorKind::OutputMissing => "OutputMissingError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Io => "IoError",
        }
    }

    /// Whether the caller's input, rather than the environment, is at fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoInput | ErrorKind::EmptyInput | ErrorKind::MissingInput
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a call produced no file.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No segments of either kind.
    #[error("Job '{job_name}': no video or audio segments were given")]
    NoInput { job_name: String },

    #[error("{job_name}: {step_name} failed: {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The scratch workspace could not be created.
    #[error("Job '{job_name}' setup failed while {operation}: {source}")]
    SetupFailed {
        job_name: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Every step ran but none produced a final file.
    #[error("Job '{job_name}' finished without producing an output file")]
    NoOutput { job_name: String },
}

impl PipelineError {
    pub fn no_input(job_name: impl Into<String>) -> Self {
        Self::NoInput {
            job_name: job_name.into(),
        }
    }

    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(
        job_name: impl Into<String>,
        operation: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoInput { .. } => ErrorKind::NoInput,
            PipelineError::StepFailed { source, .. } => source.kind(),
            PipelineError::SetupFailed { .. } => ErrorKind::Io,
            PipelineError::NoOutput { .. } => ErrorKind::OutputMissing,
        }
    }

    /// The message to show an end user: the step's own message when a
    /// step failed, without the job/step wrapper.
    pub fn detail(&self) -> String {
        match self {
            PipelineError::StepFailed { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// The failing step's error, if a step failed.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            PipelineError::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// What went wrong inside a single step.
#[derive(Error, Debug)]
pub enum StepError {
    /// Nothing to merge.
    #[error("No {0} segments to merge")]
    EmptyInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required input file was not found.
    #[error("Input file not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    /// ffmpeg exited non-zero.
    #[error("{tool} exited with code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The external command could not be started or supervised.
    #[error("{tool} could not be run: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: FfmpegError,
    },

    /// The command exited 0 but the expected file is absent.
    #[error("{tool} reported success but did not create {}", .path.display())]
    OutputMissing { tool: String, path: PathBuf },

    /// The command ran past its budget and was killed.
    #[error(
        "{tool} did not finish within {} seconds; check the input file sizes",
        .timeout.as_secs()
    )]
    Timeout { tool: String, timeout: Duration },

    #[error("{operation} failed: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput(what.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn missing_input(path: impl AsRef<Path>) -> Self {
        Self::MissingInput {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn output_missing(tool: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::OutputMissing {
            tool: tool.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Classify an invocation failure of `tool`.
    pub fn from_ffmpeg(tool: impl Into<String>, err: FfmpegError) -> Self {
        let tool = tool.into();
        match err {
            FfmpegError::TimedOut { timeout, .. } => Self::Timeout { tool, timeout },
            FfmpegError::InputNotFound(path) => Self::MissingInput { path },
            FfmpegError::Manifest(source) => Self::io_error("writing concat manifest", source),
            err @ (FfmpegError::Spawn { .. } | FfmpegError::Wait { .. }) => {
                Self::ToolUnavailable { tool, source: err }
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::EmptyInput(_) => ErrorKind::EmptyInput,
            StepError::InvalidInput(_) | StepError::MissingInput { .. } => {
                ErrorKind::MissingInput
            }
            StepError::CommandFailed { .. } | StepError::ToolUnavailable { .. } => {
                ErrorKind::ExternalTool
            }
            StepError::OutputMissing { .. } => ErrorKind::OutputMissing,
            StepError::Timeout { .. } => ErrorKind::Timeout,
            StepError::IoError { .. } => ErrorKind::Io,
        }
    }
}

pub type StepResult<T> = Result<T, StepError>;

pub type PipelineResult<T> = Result<T, PipelineError>;
