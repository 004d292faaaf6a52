//! What steps read ([`Context`]) and what they write ([`JobState`]).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::ffmpeg::FfmpegTool;
use crate::logging::JobLogger;
use crate::models::{MediaKind, ProcessJob};

/// Called with `(stage, percent, message)` as each step starts.
pub type ProgressCallback = Arc<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Everything a step may read but not change.
pub struct Context {
    /// The executable every step invokes.
    pub tool: FfmpegTool,
    pub settings: Settings,
    /// Segments, output directory and name for this call.
    pub job: ProcessJob,
    pub job_name: String,
    pub logger: Arc<JobLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        tool: FfmpegTool,
        settings: Settings,
        job: ProcessJob,
        job_name: impl Into<String>,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            tool,
            settings,
            job,
            job_name: job_name.into(),
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    pub fn report_progress(&self, stage: &str, percent: u32, message: &str) {
        if let Some(report) = &self.progress_callback {
            report(stage, percent, message);
        }
    }
}

/// Results recorded by the steps of one call.
///
/// Each stage writes its own slot once; the last step to produce a file
/// also sets `final_output`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    /// RFC 3339 local time.
    pub started_at: Option<String>,
    /// Video side: merged file or pass-through segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<StageOutput>,
    /// Audio side: merged file or pass-through segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<StageOutput>,
    /// Set once the mux step has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux: Option<StageOutput>,
    /// The single file the call returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<PathBuf>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Result of the given side, if recorded.
    pub fn stage(&self, kind: MediaKind) -> Option<&StageOutput> {
        match kind {
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Audio => self.audio.as_ref(),
        }
    }

    pub fn set_stage(&mut self, kind: MediaKind, output: StageOutput) {
        match kind {
            MediaKind::Video => self.video = Some(output),
            MediaKind::Audio => self.audio = Some(output),
        }
    }

    /// File the mux step should read for the given side.
    pub fn input_path(&self, kind: MediaKind) -> Option<&Path> {
        self.stage(kind).map(|s| s.path.as_path())
    }
}

/// What one stage produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    /// Path of the stage's file.
    pub path: PathBuf,
    /// False when a single segment was passed through without invoking ffmpeg.
    pub merged: bool,
    /// The command line that produced `path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Wall-clock seconds the invocation took.
    pub elapsed_secs: f64,
}

impl StageOutput {
    /// A stage result for a file produced by an invocation.
    pub fn produced(path: impl Into<PathBuf>, command: String, elapsed_secs: f64) -> Self {
        Self {
            path: path.into(),
            merged: true,
            command: Some(command),
            elapsed_secs,
        }
    }

    /// A stage result that reuses an existing file as-is.
    pub fn passthrough(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            merged: false,
            command: None,
            elapsed_secs: 0.0,
        }
    }
}

/// Outcome of a step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Nothing to do; the reason is logged.
    Skipped(String),
}
