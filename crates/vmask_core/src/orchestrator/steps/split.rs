//! Split step: decode the input video into numbered PNG frames.

use std::fs;
use std::path::{Path, PathBuf};

use super::run_tool;
use crate::models::FRAME_EXTENSION;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, SplitOutput, StepOutcome};
use crate::tools::ffmpeg::{split_invocation, version_invocation};

pub struct SplitStep;

impl SplitStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SplitStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame images in `dir`, sorted by file name.
pub(crate) fn list_frames(dir: &Path) -> StepResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| StepError::io_error(format!("reading {}", dir.display()), e))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| StepError::io_error(format!("reading {}", dir.display()), e))?
            .path();
        let is_frame = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION));
        if is_frame {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

impl PipelineStep for SplitStep {
    fn name(&self) -> &str {
        "Split"
    }

    fn description(&self) -> &str {
        "Splitting video into frames..."
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.job.input_frames_dir.is_dir() {
            return Err(StepError::precondition_failed(format!(
                "staging directory {} does not exist",
                ctx.job.input_frames_dir.display()
            )));
        }
        let probe = ctx.executor.execute(&version_invocation(ctx.ffmpeg()))?;
        ctx.logger.info(&format!("Using {}", probe.banner()));
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        ctx.logger.info(self.description());
        let invocation =
            split_invocation(ctx.ffmpeg(), &ctx.job.input_video, &ctx.job.input_pattern());
        run_tool(ctx, &invocation)?;

        let frames = list_frames(&ctx.job.input_frames_dir)?;
        ctx.logger.info(&format!("Extracted {} frames", frames.len()));
        state.split = Some(SplitOutput {
            frames,
            command: invocation.command_line(),
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.frame_paths().is_empty() {
            return Err(StepError::invalid_output(format!(
                "no frames were extracted from {}",
                ctx.job.input_video.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::orchestrator::test_support::context_with;
    use crate::tools::fake::FakeExecutor;
    use std::sync::Arc;

    fn prepared(frames: usize) -> (tempfile::TempDir, Context, Arc<FakeExecutor>) {
        let executor = Arc::new(FakeExecutor::ffmpeg(frames));
        let (dir, ctx) = context_with(executor.clone(), Settings::default());
        fs::create_dir_all(&ctx.job.input_frames_dir).unwrap();
        (dir, ctx, executor)
    }

    #[test]
    fn splits_into_sorted_frames() {
        let (_dir, ctx, executor) = prepared(12);
        let step = SplitStep::new();
        let mut state = RunState::new("clip");

        step.validate_input(&ctx).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let frames = state.frame_paths();
        assert_eq!(frames.len(), 12);
        assert!(frames[0].ends_with("frame_0001.png"));
        assert!(frames[11].ends_with("frame_0012.png"));

        let calls = executor.calls();
        assert_eq!(calls[0].arguments(), ["-version"]);
        assert_eq!(calls[1].arguments()[0], "-i");
        assert!(calls[1].arguments()[2].ends_with("frame_%04d.png"));
    }

    #[test]
    fn zero_frames_fails_output_validation() {
        let (_dir, ctx, _) = prepared(0);
        let step = SplitStep::new();
        let mut state = RunState::new("clip");
        step.execute(&ctx, &mut state).unwrap();
        assert!(matches!(
            step.validate_output(&ctx, &state),
            Err(StepError::InvalidOutput(_))
        ));
    }

    #[test]
    fn ffmpeg_failure_is_step_error() {
        let executor = Arc::new(FakeExecutor::ffmpeg(3).failing_on("test_input.webm"));
        let (_dir, ctx) = context_with(executor, Settings::default());
        fs::create_dir_all(&ctx.job.input_frames_dir).unwrap();

        let mut state = RunState::new("clip");
        let err = SplitStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::CommandFailed { exit_code: 1, .. }));
        assert!(!ctx.logger.get_tail().is_empty());
    }

    #[test]
    fn list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("frame_0002.png"), b"").unwrap();
        fs::write(dir.path().join("frame_0001.png"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let frames = list_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("frame_0001.png"));
    }
}
