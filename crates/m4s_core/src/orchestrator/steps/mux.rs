//! Mux step - combines one video and one audio input into the final file.

use crate::ffmpeg::FfmpegTool;
use crate::models::{MediaKind, MUX_NAME_STEM};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

use super::{require_output, run_ffmpeg};

/// Copies the video stream and re-encodes audio to AAC.
///
/// Reads its inputs from the video and audio stages recorded in the
/// job state, so it always runs after both sides are resolved.
#[derive(Debug, Default)]
pub struct MuxStep;

impl MuxStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for MuxStep {
    fn name(&self) -> &str {
        "Mux"
    }

    fn description(&self) -> &str {
        "Combine video and audio (video copied, audio to AAC)"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        for kind in [MediaKind::Video, MediaKind::Audio] {
            let path = state.input_path(kind).ok_or_else(|| {
                StepError::invalid_input(format!("no {} input recorded", kind))
            })?;
            if !path.is_file() {
                return Err(StepError::missing_input(path));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let (Some(video), Some(audio)) = (
            state.input_path(MediaKind::Video),
            state.input_path(MediaKind::Audio),
        ) else {
            return Err(StepError::invalid_input("mux inputs not recorded"));
        };

        let output = ctx.job.output_path(MUX_NAME_STEM);
        ctx.logger.info(&format!("Video: {}", video.display()));
        ctx.logger.info(&format!("Audio: {}", audio.display()));
        ctx.logger.info(&format!("Output: {}", output.display()));

        let args = FfmpegTool::mux_args(video, audio, &output);
        let stage = run_ffmpeg(ctx, &args, &output)?;

        state.mux = Some(stage);
        state.final_output = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        let mux = state
            .mux
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Mux results not recorded"))?;
        require_output(ctx, &mux.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::ProcessJob;
    use crate::orchestrator::errors::ErrorKind;
    use crate::orchestrator::types::StageOutput;
    use std::sync::Arc;

    fn context() -> Context {
        Context::new(
            FfmpegTool::default(),
            Settings::default(),
            ProcessJob::without_segments("/out"),
            "mux",
            Arc::new(JobLogger::detached("mux", LogConfig::default(), None)),
        )
    }

    #[test]
    fn mux_step_name() {
        assert_eq!(MuxStep::new().name(), "Mux");
    }

    #[test]
    fn requires_both_inputs_recorded() {
        let mut state = JobState::new("job");
        let err = MuxStep.validate_input(&context(), &state).unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));

        state.set_stage(MediaKind::Video, StageOutput::passthrough("/no/such/video.mp4"));
        state.set_stage(MediaKind::Audio, StageOutput::passthrough("/no/such/audio.mp4"));
        let err = MuxStep.validate_input(&context(), &state).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert!(err.to_string().contains("video.mp4"));
    }
}
