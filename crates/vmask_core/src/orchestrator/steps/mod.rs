//! Pipeline step implementations.
//!
//! Prepare → Split → Analyze → Mask → Merge.

mod analyze;
mod mask;
mod merge;
mod prepare;
mod split;

pub use analyze::AnalyzeStep;
pub use mask::MaskStep;
pub use merge::MergeStep;
pub use prepare::PrepareStep;
pub use split::SplitStep;

use super::errors::{StepError, StepResult};
use super::pool::percent;
use super::types::Context;
use crate::tools::{ToolInvocation, ToolOutput};

/// Run a whole-run tool call, logging the command and its output.
///
/// A non-zero exit shows the output tail and becomes a step error.
fn run_tool(ctx: &Context, invocation: &ToolInvocation) -> StepResult<ToolOutput> {
    ctx.logger.command(&invocation.command_line());

    let output = ctx.executor.run(invocation)?;
    for line in output.stdout.lines() {
        ctx.logger.output_line(line, false);
    }
    for line in output.stderr.lines() {
        ctx.logger.output_line(line, true);
    }

    if !output.is_success() {
        let tool = invocation.tool_name();
        ctx.logger.show_tail(&format!("{} output", tool));
        return Err(StepError::command_failed(
            tool,
            output.exit_code,
            output.stderr_tail(5).join("\n"),
        ));
    }
    Ok(output)
}

/// Report per-frame progress to the callback and the run log.
fn report_frames(ctx: &Context, step: &str, done: usize, total: usize) {
    let pct = percent(done, total);
    ctx.report_progress(step, pct, &format!("{}/{} frames", done, total));
    ctx.logger.progress(pct);
}
