//! The contract every unit of work in a [`Pipeline`](super::Pipeline) meets.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One stage of a merge or mux call.
///
/// The runner checks `validate_input`, then calls `execute`, then checks
/// `validate_output` if the step did not skip. Input checks see the
/// state so a step can require what an earlier step recorded, as the mux
/// step does with both merge results.
pub trait PipelineStep: Send + Sync {
    /// Shown in log phases and carried into step failures.
    fn name(&self) -> &str;

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Do the work and record it in `state`. `Skipped` is not a failure.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopStep {
        name: &'static str,
        skip: bool,
    }

    impl PipelineStep for NoopStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            if self.skip {
                Ok(StepOutcome::Skipped("nothing to do".to_string()))
            } else {
                Ok(StepOutcome::Success)
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn description_defaults_to_name() {
        let step: Box<dyn PipelineStep> = Box::new(NoopStep {
            name: "Merge audio",
            skip: true,
        });

        assert_eq!(step.name(), "Merge audio");
        assert_eq!(step.description(), "Merge audio");
    }
}
