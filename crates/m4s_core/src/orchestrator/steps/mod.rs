//! Pipeline step implementations.

mod merge;
mod mux;

pub use merge::MergeStep;
pub use mux::MuxStep;

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, StageOutput};

/// Create the directory a step writes into.
fn ensure_parent_dir(output: &Path) -> StepResult<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| StepError::io_error("creating output directory", e)),
        _ => Ok(()),
    }
}

/// Run ffmpeg with `args`, log the exchange, and classify failure.
///
/// A non-zero exit becomes [`StepError::CommandFailed`] carrying the
/// tool's diagnostic text. Whether `output` exists is left to the
/// calling step's `validate_output`.
fn run_ffmpeg(ctx: &Context, args: &[OsString], output: &Path) -> StepResult<StageOutput> {
    let tool = ctx.tool.name();
    let command = ctx.tool.display_command(args);

    ctx.logger.command(&command);
    if ctx.settings.logging.show_command_pretty {
        ctx.logger
            .command_pretty(&ctx.tool.program().to_string_lossy(), args);
    }
    if ctx.settings.logging.show_command_json {
        ctx.logger.command_json(args);
    }

    ensure_parent_dir(output)?;
    ctx.logger.clear_tail();

    let result = ctx
        .tool
        .run(args)
        .map_err(|e| StepError::from_ffmpeg(&tool, e))?;

    for line in result.stdout.lines() {
        ctx.logger.tool_output(line, false);
    }
    for line in result.stderr.lines() {
        ctx.logger.tool_output(line, true);
    }

    if !result.success() {
        ctx.logger.dump_tail(&format!("{} output", tool));
        return Err(StepError::command_failed(
            tool,
            result.exit_code(),
            result.diagnostic(),
        ));
    }

    ctx.logger.debug(&format!(
        "{} finished in {:.1}s",
        tool,
        result.elapsed.as_secs_f64()
    ));

    Ok(StageOutput::produced(
        output,
        command,
        result.elapsed.as_secs_f64(),
    ))
}

/// Fail with `OutputMissing` unless `path` is an existing file.
fn require_output(ctx: &Context, path: &Path) -> StepResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StepError::output_missing(ctx.tool.name(), path))
    }
}
