//! Mask step: blur every analyzed frame into the output directory.

use super::report_frames;
use crate::masking::FrameMasker;
use crate::models::MaskOutcome;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pool::{fan_out, lowest_error};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MaskOutput, RunState, StepOutcome, ToolFailure};

/// Writes one output frame per analyzed frame.
///
/// Frames with regions get a blur command. Frames without regions are
/// copied unchanged when pass-through is enabled, otherwise skipped.
pub struct MaskStep;

impl MaskStep {
    pub fn new() -> Self {
        Self
    }

    fn masker(ctx: &Context) -> FrameMasker {
        FrameMasker::new(
            ctx.executor.clone(),
            ctx.ffmpeg(),
            &ctx.job.output_frames_dir,
        )
        .with_policy(ctx.settings.execution.tool_failure)
        .with_logger(ctx.logger.clone())
    }
}

impl Default for MaskStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MaskStep {
    fn name(&self) -> &str {
        "Mask"
    }

    fn description(&self) -> &str {
        "Masking frames..."
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.job.output_frames_dir.is_dir() {
            return Err(StepError::precondition_failed(format!(
                "output directory {} does not exist",
                ctx.job.output_frames_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        if !state.has_analysis() {
            return Err(StepError::precondition_failed("frames have not been analyzed"));
        }

        let masker = Self::masker(ctx);
        let pass_through = ctx.settings.execution.pass_through_unmasked;
        let frames = state.analyzed_frames();
        let total = frames.len();

        let pool = ctx.worker_pool()?;
        let results = fan_out(
            &pool,
            frames,
            |_, frame| {
                let outcome = if !frame.has_regions() && pass_through {
                    masker.pass_through(frame)
                } else {
                    masker.mask(frame)
                };
                outcome.map_err(|e| StepError::frame_failed(frame.index, &frame.filename, e.into()))
            },
            |done| report_frames(ctx, self.name(), done, total),
        );
        let outcomes = lowest_error(results)?;

        let mut failures = Vec::new();
        for (frame, outcome) in frames.iter().zip(&outcomes) {
            if let MaskOutcome::Failed { message } = outcome {
                ctx.logger
                    .warn(&format!("Masking {} failed: {}", frame.filename, message));
                failures.push(ToolFailure {
                    step: self.name().to_string(),
                    frame: Some(frame.filename.clone()),
                    message: message.clone(),
                });
            }
        }

        let output = MaskOutput { outcomes };
        ctx.logger.info(&format!(
            "Masked {}, passed through {}, skipped {}, failed {}",
            output.masked(),
            output.passed_through(),
            output.skipped(),
            output.failed()
        ));
        state.tool_failures.extend(failures);
        state.masking = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let Some(ref masking) = state.masking else {
            return Err(StepError::invalid_output("no masking results"));
        };
        if masking.outcomes.len() != state.analyzed_frames().len() {
            return Err(StepError::invalid_output(format!(
                "{} outcomes for {} frames",
                masking.outcomes.len(),
                state.analyzed_frames().len()
            )));
        }
        for path in masking.outcomes.iter().filter_map(MaskOutcome::output) {
            if !path.is_file() {
                return Err(StepError::file_not_found(path.display().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, ToolFailurePolicy};
    use crate::models::{frame_file_name, AnalyzedFrame, Rect};
    use crate::orchestrator::test_support::context_with;
    use crate::orchestrator::types::AnalysisOutput;
    use crate::tools::fake::FakeExecutor;
    use std::fs;
    use std::sync::Arc;

    /// Frames 1..=count on disk, with a region on the listed frame numbers.
    fn analyzed_state(ctx: &Context, count: usize, with_regions: &[usize]) -> RunState {
        fs::create_dir_all(&ctx.job.input_frames_dir).unwrap();
        fs::create_dir_all(&ctx.job.output_frames_dir).unwrap();
        let frames = (1..=count)
            .map(|n| {
                let path = ctx.job.input_frames_dir.join(frame_file_name(n));
                fs::write(&path, format!("frame {}", n)).unwrap();
                let regions = if with_regions.contains(&n) {
                    vec![Rect::new(10, 20, 30, 15).unwrap()]
                } else {
                    Vec::new()
                };
                AnalyzedFrame::new(n - 1, path, regions)
            })
            .collect();
        let mut state = RunState::new("clip");
        state.analysis = Some(AnalysisOutput {
            frames,
            engine: "test".to_string(),
        });
        state
    }

    fn setup(
        executor: FakeExecutor,
        settings: Settings,
    ) -> (tempfile::TempDir, Context, Arc<FakeExecutor>) {
        let executor = Arc::new(executor);
        let (dir, ctx) = context_with(executor.clone(), settings);
        (dir, ctx, executor)
    }

    #[test]
    fn masks_and_passes_through() {
        let (_dir, ctx, executor) = setup(FakeExecutor::ffmpeg(0), Settings::default());
        let mut state = analyzed_state(&ctx, 5, &[2, 4]);
        let step = MaskStep::new();

        step.validate_input(&ctx).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let masking = state.masking.as_ref().unwrap();
        assert_eq!((masking.masked(), masking.passed_through()), (2, 3));
        assert_eq!(executor.count_with("-filter_complex"), 2);

        let out = |n| {
            fs::read_to_string(ctx.job.output_frames_dir.join(frame_file_name(n))).unwrap()
        };
        assert_eq!(out(2), "frame 2+blurred");
        assert_eq!(out(1), "frame 1");
    }

    #[test]
    fn skips_unmasked_frames_without_pass_through() {
        let mut settings = Settings::default();
        settings.execution.pass_through_unmasked = false;
        let (_dir, ctx, _) = setup(FakeExecutor::ffmpeg(0), settings);
        let mut state = analyzed_state(&ctx, 3, &[3]);

        MaskStep::new().execute(&ctx, &mut state).unwrap();

        let masking = state.masking.as_ref().unwrap();
        assert_eq!((masking.masked(), masking.skipped()), (1, 2));
        let written = fs::read_dir(&ctx.job.output_frames_dir).unwrap().count();
        assert_eq!(written, 1);
    }

    #[test]
    fn report_policy_records_failures() {
        let executor = FakeExecutor::ffmpeg(0).failing_on("frame_0002.png");
        let (_dir, ctx, _) = setup(executor, Settings::default());
        let mut state = analyzed_state(&ctx, 3, &[1, 2, 3]);

        MaskStep::new().execute(&ctx, &mut state).unwrap();

        let masking = state.masking.as_ref().unwrap();
        assert_eq!((masking.masked(), masking.failed()), (2, 1));
        assert_eq!(state.tool_failures.len(), 1);
        assert_eq!(state.tool_failures[0].frame.as_deref(), Some("frame_0002.png"));
    }

    #[test]
    fn fail_policy_reports_lowest_failing_frame() {
        let mut settings = Settings::default();
        settings.execution.tool_failure = ToolFailurePolicy::Fail;
        let executor = FakeExecutor::ffmpeg(0)
            .failing_on("frame_0004.png")
            .failing_on("frame_0002.png");
        let (_dir, ctx, executor) = setup(executor, settings);
        let mut state = analyzed_state(&ctx, 5, &[1, 2, 3, 4, 5]);

        let err = MaskStep::new().execute(&ctx, &mut state).unwrap_err();
        assert_eq!(err.frame_index(), Some(1));
        // Every frame was still attempted
        assert_eq!(executor.count_with("-filter_complex"), 5);
        assert!(state.masking.is_none());
    }

    #[test]
    fn requires_analysis() {
        let (_dir, ctx, _) = setup(FakeExecutor::ffmpeg(0), Settings::default());
        let mut state = RunState::new("clip");
        assert!(MaskStep::new().execute(&ctx, &mut state).is_err());
    }
}
