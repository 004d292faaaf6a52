//! Merge step - concatenates one kind of segments with the concat demuxer.

use std::path::PathBuf;

use crate::ffmpeg::{ConcatManifest, FfmpegTool};
use crate::models::MediaKind;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StageOutput, StepOutcome};

use super::{require_output, run_ffmpeg};

/// Where the merged file goes.
#[derive(Debug, Clone)]
enum Target {
    /// The job's output directory and name; the result is the call's output.
    Final,
    /// A fixed name inside a workspace, to be muxed afterwards.
    Intermediate(PathBuf),
}

/// Stream-copy concatenation of the job's video or audio segments.
pub struct MergeStep {
    kind: MediaKind,
    target: Target,
    name: String,
}

impl MergeStep {
    /// Merge into the job's output directory.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            target: Target::Final,
            name: format!("Merge {}", kind),
        }
    }

    /// Merge into `work_dir` ahead of a mux.
    ///
    /// A single segment needs no concatenation: the step is skipped and the
    /// segment itself is recorded as this side's input.
    pub fn intermediate(kind: MediaKind, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Intermediate(work_dir.into()),
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    fn output_path(&self, ctx: &Context) -> PathBuf {
        match &self.target {
            Target::Final => ctx.job.output_path(self.kind.name_stem()),
            Target::Intermediate(dir) => dir.join(self.kind.intermediate_name()),
        }
    }
}

impl PipelineStep for MergeStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Concatenate segments without re-encoding"
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StepResult<()> {
        let segments = ctx.job.segments(self.kind);
        if segments.is_empty() {
            return Err(StepError::empty_input(self.kind.label()));
        }
        // Manifest entries are text; a lossy path would name a different file.
        if let Some(unreadable) = segments.iter().find(|s| s.path.to_str().is_none()) {
            return Err(StepError::invalid_input(format!(
                "{} segment path is not valid UTF-8: {}",
                self.kind.label(),
                unreadable.path.display()
            )));
        }
        if let Some(missing) = segments.iter().find(|s| !s.exists()) {
            return Err(StepError::missing_input(&missing.path));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let segments = ctx.job.segments(self.kind);

        if let (Target::Intermediate(_), [single]) = (&self.target, segments) {
            state.set_stage(self.kind, StageOutput::passthrough(&single.path));
            return Ok(StepOutcome::Skipped(format!(
                "single {} segment used as-is: {}",
                self.kind,
                single.path.display()
            )));
        }

        let output = self.output_path(ctx);
        ctx.logger.info(&format!(
            "Concatenating {} {} segments into {}",
            segments.len(),
            self.kind,
            output.display()
        ));

        let manifest = ConcatManifest::create(segments, ctx.tool.manifest_dir())
            .map_err(|e| StepError::from_ffmpeg(ctx.tool.name(), e))?;
        ctx.logger
            .debug(&format!("Concat manifest: {}", manifest.path().display()));

        let args = FfmpegTool::concat_args(manifest.path(), &output);
        let result = run_ffmpeg(ctx, &args, &output);

        let manifest_path = manifest.path().to_path_buf();
        if let Err(e) = manifest.close() {
            ctx.logger.warn(&format!(
                "Could not remove concat manifest {}: {}",
                manifest_path.display(),
                e
            ));
        }

        state.set_stage(self.kind, result?);
        if let Target::Final = self.target {
            state.final_output = Some(output);
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        let stage = state
            .stage(self.kind)
            .ok_or_else(|| StepError::output_missing(ctx.tool.name(), self.output_path(ctx)))?;
        require_output(ctx, &stage.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_follow_kind() {
        assert_eq!(MergeStep::new(MediaKind::Video).name(), "Merge video");
        let step = MergeStep::intermediate(MediaKind::Audio, "/work");
        assert_eq!(step.name(), "Merge audio");
        assert_eq!(step.kind(), MediaKind::Audio);
    }
}
