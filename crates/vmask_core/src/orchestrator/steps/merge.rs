//! Merge step: encode the output frames into the final video.

use super::run_tool;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MergeOutput, RunState, StepOutcome, ToolFailure};
use crate::tools::ffmpeg::merge_invocation;

pub struct MergeStep;

impl MergeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MergeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MergeStep {
    fn name(&self) -> &str {
        "Merge"
    }

    fn description(&self) -> &str {
        "Merging frames into video..."
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.job.output_frame_rate == 0 {
            return Err(StepError::invalid_input("output frame rate must be positive"));
        }
        if !ctx.job.output_frames_dir.is_dir() {
            return Err(StepError::precondition_failed(format!(
                "output directory {} does not exist",
                ctx.job.output_frames_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(ref masking) = state.masking else {
            return Err(StepError::precondition_failed("frames have not been masked"));
        };
        if masking.masked() + masking.passed_through() == 0 {
            ctx.logger.warn("No output frames were written");
            return Ok(StepOutcome::Skipped("no output frames to merge".to_string()));
        }

        if let Some(at) = masking.sequence_break() {
            let frame = state.analyzed_frames().get(at).map(|f| f.filename.clone());
            let message = format!(
                "output frames stop at {}; the video ends after {} frame(s)",
                frame.as_deref().unwrap_or("?"),
                at
            );
            ctx.logger.warn(&message);
            state.tool_failures.push(ToolFailure {
                step: self.name().to_string(),
                frame,
                message,
            });
        }

        ctx.logger.info(&format!(
            "Encoding at {} fps to {}",
            ctx.job.output_frame_rate,
            ctx.job.output_video.display()
        ));
        let invocation = merge_invocation(
            ctx.ffmpeg(),
            ctx.job.output_frame_rate,
            &ctx.job.output_pattern(),
            &ctx.job.output_video,
        );
        run_tool(ctx, &invocation)?;

        state.merge = Some(MergeOutput {
            output_path: ctx.job.output_video.clone(),
            command: invocation.command_line(),
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.job.output_video.is_file() {
            return Err(StepError::invalid_output(format!(
                "output video {} was not created",
                ctx.job.output_video.display()
            )));
        }
        Ok(())
    }
}
