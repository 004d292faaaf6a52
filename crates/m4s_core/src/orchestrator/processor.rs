//! Call-level API: merge, mux, and the combined pipeline.
//!
//! `SegmentProcessor` picks the steps for each call from the shape of
//! its input and runs them through a [`Pipeline`]. Every call is
//! blocking and self-contained; callers that need a responsive UI run
//! it on a worker thread and ship the result back themselves.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;

use crate::config::Settings;
use crate::ffmpeg::FfmpegTool;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{InputShape, MediaKind, MergeJob, MuxJob, ProcessJob};

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::steps::{MergeStep, MuxStep};
use super::types::{Context, JobState, ProgressCallback, StageOutput};
use super::workspace::Workspace;

/// Runs merge and mux jobs against one ffmpeg executable.
///
/// Holds no per-call state: concurrent calls on the same processor use
/// separate workspaces and never share intermediate files.
///
/// # Example
///
/// ```no_run
/// use m4s_core::config::Settings;
/// use m4s_core::orchestrator::SegmentProcessor;
///
/// let processor = SegmentProcessor::new(Settings::default());
/// let output = processor.process_all(
///     ["video_0.m4s", "video_1.m4s"],
///     ["audio_0.m4s", "audio_1.m4s"],
///     "/home/user/Desktop",
/// )?;
/// println!("Wrote {}", output.display());
/// # Ok::<(), m4s_core::orchestrator::PipelineError>(())
/// ```
pub struct SegmentProcessor {
    settings: Settings,
    tool: FfmpegTool,
    logger: Option<Arc<JobLogger>>,
    progress: Option<ProgressCallback>,
}

impl SegmentProcessor {
    /// Create a processor using the executable and timeouts in `settings`.
    pub fn new(settings: Settings) -> Self {
        let tool = FfmpegTool::from_settings(&settings);
        Self {
            settings,
            tool,
            logger: None,
            progress: None,
        }
    }

    /// Use a specific executable instead of the configured one.
    pub fn with_tool(mut self, tool: FfmpegTool) -> Self {
        self.tool = tool;
        self
    }

    /// Send job log lines to `logger` instead of a per-call detached logger.
    pub fn with_logger(mut self, logger: Arc<JobLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn tool(&self) -> &FfmpegTool {
        &self.tool
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether the configured executable answers a version query.
    pub fn is_available(&self) -> bool {
        self.tool.is_available()
    }

    /// Concatenate video segments into `output_dir`.
    pub fn merge_video<I, P>(
        &self,
        segments: I,
        output_dir: impl Into<PathBuf>,
    ) -> PipelineResult<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.merge(MergeJob::new(MediaKind::Video, segments, output_dir))
    }

    /// Concatenate audio segments into `output_dir`.
    pub fn merge_audio<I, P>(
        &self,
        segments: I,
        output_dir: impl Into<PathBuf>,
    ) -> PipelineResult<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.merge(MergeJob::new(MediaKind::Audio, segments, output_dir))
    }

    /// Combine one video file and one audio file into `output_dir`.
    pub fn mux(
        &self,
        video: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> PipelineResult<PathBuf> {
        self.mux_job(MuxJob::new(video, audio, output_dir))
    }

    /// Merge whichever sides are present and mux them when both are.
    pub fn process_all<V, A, P, Q>(
        &self,
        video: V,
        audio: A,
        output_dir: impl Into<PathBuf>,
    ) -> PipelineResult<PathBuf>
    where
        V: IntoIterator<Item = P>,
        A: IntoIterator<Item = Q>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        self.process(ProcessJob::new(video, audio, output_dir))
    }

    /// Run a single-kind merge job.
    ///
    /// Always invokes ffmpeg, even for one segment.
    pub fn merge(&self, job: MergeJob) -> PipelineResult<PathBuf> {
        let kind = job.kind;
        let pipeline = Pipeline::new().with_step(MergeStep::new(kind));
        self.run(&format!("merge_{}", kind), job.into(), &pipeline, None)
    }

    /// Run a mux job over two existing files.
    pub fn mux_job(&self, job: MuxJob) -> PipelineResult<PathBuf> {
        let mut process = ProcessJob::without_segments(job.output_dir);
        process.output_name = job.output_name;

        let mut state = JobState::new(job_id("mux"));
        state.set_stage(MediaKind::Video, StageOutput::passthrough(job.video));
        state.set_stage(MediaKind::Audio, StageOutput::passthrough(job.audio));

        let pipeline = Pipeline::new().with_step(MuxStep::new());
        self.run("mux", process, &pipeline, Some(state))
    }

    /// Run the combined pipeline for whatever the job contains.
    ///
    /// - no segments: `NoInput`, nothing is invoked
    /// - one kind only: merged straight into the output directory
    /// - both kinds: each side merged in a scratch workspace (a single
    ///   segment is used as-is), then muxed into the output directory;
    ///   the workspace is removed whatever the outcome
    pub fn process(&self, job: ProcessJob) -> PipelineResult<PathBuf> {
        const JOB_NAME: &str = "process_all";

        match job.shape() {
            InputShape::Empty => {
                tracing::warn!("{}: no video or audio segments", JOB_NAME);
                Err(PipelineError::no_input(JOB_NAME))
            }
            InputShape::VideoOnly => {
                let pipeline = Pipeline::new().with_step(MergeStep::new(MediaKind::Video));
                self.run(JOB_NAME, job, &pipeline, None)
            }
            InputShape::AudioOnly => {
                let pipeline = Pipeline::new().with_step(MergeStep::new(MediaKind::Audio));
                self.run(JOB_NAME, job, &pipeline, None)
            }
            InputShape::Combined => {
                let temp_root = self.settings.paths.temp_root_dir();
                Workspace::with_scratch(temp_root.as_deref(), |work_dir| {
                    tracing::debug!("{}: workspace {}", JOB_NAME, work_dir.display());
                    let pipeline = Pipeline::new()
                        .with_step(MergeStep::intermediate(MediaKind::Video, work_dir))
                        .with_step(MergeStep::intermediate(MediaKind::Audio, work_dir))
                        .with_step(MuxStep::new());
                    self.run(JOB_NAME, job, &pipeline, None)
                })
                .map_err(|e| PipelineError::setup_failed(JOB_NAME, "creating workspace", e))?
            }
        }
    }

    fn run(
        &self,
        job_name: &str,
        job: ProcessJob,
        pipeline: &Pipeline,
        state: Option<JobState>,
    ) -> PipelineResult<PathBuf> {
        let mut state = state.unwrap_or_else(|| JobState::new(job_id(job_name)));
        let ctx = Context::new(
            self.tool.clone(),
            self.settings.clone(),
            job,
            job_name,
            self.logger_for(job_name),
        )
        .with_progress_callback(self.progress.clone());

        ctx.logger.section(&format!("Job {}", state.job_id));
        tracing::info!(
            "{}: running {:?} with {}",
            job_name,
            pipeline.step_names(),
            self.tool.program().display()
        );

        let report = pipeline.run(&ctx, &mut state)?;
        if !report.nothing_skipped() {
            tracing::debug!(
                "{}: {} of {} steps skipped: {:?}",
                job_name,
                report.skipped.len(),
                report.steps_run(),
                report.skipped
            );
        }

        let output = state
            .final_output
            .ok_or_else(|| PipelineError::NoOutput {
                job_name: job_name.to_string(),
            })?;
        ctx.logger.success(&format!("Output: {}", output.display()));
        tracing::info!("{}: wrote {}", job_name, output.display());
        Ok(output)
    }

    fn logger_for(&self, job_name: &str) -> Arc<JobLogger> {
        match &self.logger {
            Some(logger) => Arc::clone(logger),
            None => Arc::new(JobLogger::detached(
                job_name,
                LogConfig::from(&self.settings.logging),
                None,
            )),
        }
    }
}

fn job_id(job_name: &str) -> String {
    format!("{}-{}", job_name, Local::now().format("%Y%m%d-%H%M%S%.3f"))
}
