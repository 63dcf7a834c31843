//! Prepare step: fresh staging directories and no stale output video.

use std::fs;
use std::path::{Path, PathBuf};

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Recreates both frame directories and removes the previous output.
///
/// Running the pipeline twice therefore starts from the same state.
pub struct PrepareStep;

impl PrepareStep {
    pub fn new() -> Self {
        Self
    }

    fn recreate_dir(ctx: &Context, dir: &Path) -> StepResult<()> {
        if dir.exists() {
            ctx.logger.debug(&format!("Removing {}", dir.display()));
            fs::remove_dir_all(dir)
                .map_err(|e| StepError::io_error(format!("removing {}", dir.display()), e))?;
        }
        fs::create_dir_all(dir)
            .map_err(|e| StepError::io_error(format!("creating {}", dir.display()), e))
    }
}

impl Default for PrepareStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` lies inside `dir`, comparing canonical paths when possible.
fn is_inside(path: &Path, dir: &Path) -> bool {
    let canon = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| PathBuf::from(p));
    canon(path).starts_with(canon(dir))
}

impl PipelineStep for PrepareStep {
    fn name(&self) -> &str {
        "Prepare"
    }

    fn description(&self) -> &str {
        "Preparing staging directories..."
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let job = &ctx.job;
        job.validate().map_err(StepError::invalid_input)?;

        if !job.input_video.is_file() {
            return Err(StepError::file_not_found(job.input_video.display().to_string()));
        }
        for dir in [&job.input_frames_dir, &job.output_frames_dir] {
            if is_inside(&job.input_video, dir) {
                return Err(StepError::invalid_input(format!(
                    "input video {} lies inside staging directory {}",
                    job.input_video.display(),
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, _state: &mut RunState) -> StepResult<StepOutcome> {
        let job = &ctx.job;

        Self::recreate_dir(ctx, &job.input_frames_dir)?;
        Self::recreate_dir(ctx, &job.output_frames_dir)?;
        ctx.report_progress(self.name(), 50, "staging directories ready");

        if job.output_video.exists() {
            ctx.logger
                .info(&format!("Removing previous output {}", job.output_video.display()));
            fs::remove_file(&job.output_video).map_err(|e| {
                StepError::io_error(format!("removing {}", job.output_video.display()), e)
            })?;
        }
        if let Some(parent) = job.output_video.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StepError::io_error("creating output directory", e))?;
            }
        }

        ctx.logger.info(&format!(
            "Staging: {} -> {}",
            job.input_frames_dir.display(),
            job.output_frames_dir.display()
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        for dir in [&ctx.job.input_frames_dir, &ctx.job.output_frames_dir] {
            let mut entries = fs::read_dir(dir)
                .map_err(|e| StepError::io_error(format!("reading {}", dir.display()), e))?;
            if entries.next().is_some() {
                return Err(StepError::invalid_output(format!(
                    "{} is not empty",
                    dir.display()
                )));
            }
        }
        if ctx.job.output_video.exists() {
            return Err(StepError::invalid_output("previous output video still present"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::context;

    #[test]
    fn recreates_staging_and_removes_output() {
        let (_dir, ctx) = context();
        fs::create_dir_all(&ctx.job.input_frames_dir).unwrap();
        fs::write(ctx.job.input_frames_dir.join("frame_0001.png"), b"old").unwrap();
        fs::write(&ctx.job.output_video, b"old video").unwrap();

        let step = PrepareStep::new();
        let mut state = RunState::new("clip");
        step.validate_input(&ctx).unwrap();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        assert!(ctx.job.output_frames_dir.is_dir());
        assert_eq!(fs::read_dir(&ctx.job.input_frames_dir).unwrap().count(), 0);
        assert!(!ctx.job.output_video.exists());
    }

    #[test]
    fn running_twice_is_idempotent() {
        let (_dir, ctx) = context();
        let step = PrepareStep::new();
        let mut state = RunState::new("clip");
        step.execute(&ctx, &mut state).unwrap();
        fs::write(ctx.job.output_frames_dir.join("frame_0001.png"), b"x").unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();
    }

    #[test]
    fn missing_input_video_fails_validation() {
        let (_dir, ctx) = context();
        fs::remove_file(&ctx.job.input_video).unwrap();
        assert!(matches!(
            PrepareStep::new().validate_input(&ctx),
            Err(StepError::FileNotFound { .. })
        ));
    }

    #[test]
    fn refuses_input_inside_staging() {
        let (dir, mut ctx) = context();
        ctx.job.input_frames_dir = dir.path().to_path_buf();
        assert!(matches!(
            PrepareStep::new().validate_input(&ctx),
            Err(StepError::InvalidInput(_))
        ));
    }
}
