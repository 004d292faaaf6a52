//! Sequential step runner.

use super::errors::{PipelineError, PipelineResult, StepResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// An ordered list of steps sharing one [`JobState`].
///
/// A step that fails validation or execution stops the run; later steps
/// never see the state it left behind.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step against `state`.
    ///
    /// Progress is reported as each step starts, spread evenly over 0..100,
    /// and once more with stage `"Complete"` at 100.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<RunReport> {
        let mut report = RunReport::default();
        let count = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            let percent = (index * 100 / count) as u32;
            ctx.logger.phase(name);
            ctx.report_progress(name, percent, &format!("Starting {}", name));

            match run_step(step.as_ref(), ctx, state) {
                Ok(StepOutcome::Success) => {
                    ctx.logger.success(&format!("{} done", name));
                    report.completed.push(name.to_string());
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    ctx.logger.info(&format!("{} skipped: {}", name, reason));
                    report.skipped.push(name.to_string());
                }
                Err(e) => {
                    ctx.logger.error(&format!("{} failed: {}", name, e));
                    return Err(PipelineError::step_failed(&ctx.job_name, name, e));
                }
            }
        }

        ctx.report_progress("Complete", 100, "All steps finished");
        Ok(report)
    }
}

/// Validate, execute, then check what a successful step produced.
fn run_step(
    step: &dyn PipelineStep,
    ctx: &Context,
    state: &mut JobState,
) -> StepResult<StepOutcome> {
    step.validate_input(ctx, state)?;
    ctx.logger.debug(step.description());

    let outcome = step.execute(ctx, state)?;
    if outcome == StepOutcome::Success {
        step.validate_output(ctx, state)?;
    }
    Ok(outcome)
}

/// Which steps ran to completion and which chose to skip.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn nothing_skipped(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn steps_run(&self) -> usize {
        self.completed.len() + self.skipped.len()
    }
}
