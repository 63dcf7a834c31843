//! Pipeline runner that executes steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// Runs validation before and after each step, records per-step wall-clock
/// time in the state and honours cancellation at step boundaries.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Handle that stops the pipeline at the next step boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run every step in order against `ctx` and `state`.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Pipeline cancelled before step '{}'", step_name));
                return Err(PipelineError::cancelled(&ctx.run_name));
            }

            ctx.logger.phase(step_name);
            ctx.report_progress(step_name, 0, step.description());

            let started = Instant::now();
            let outcome = Self::run_step(step.as_ref(), ctx, state);
            let elapsed = started.elapsed().as_millis() as u64;
            state.record_timing(step_name, elapsed);

            match outcome? {
                StepOutcome::Success => {
                    ctx.logger.success(&format!(
                        "{} completed in {:.2}s",
                        step_name,
                        elapsed as f64 / 1000.0
                    ));
                    ctx.report_progress(step_name, 100, "done");
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");
        Ok(result)
    }

    fn run_step(
        step: &dyn PipelineStep,
        ctx: &Context,
        state: &mut RunState,
    ) -> PipelineResult<StepOutcome> {
        let step_name = step.name();
        let fail = |stage: &str, e: StepError| {
            ctx.logger.error(&format!("{} failed: {}", stage, e));
            PipelineError::step_failed(&ctx.run_name, step_name, e)
        };

        ctx.logger.debug(&format!("Validating input for '{}'", step_name));
        step.validate_input(ctx)
            .map_err(|e| fail("Input validation", e))?;

        let outcome = step.execute(ctx, state).map_err(|e| fail("Execution", e))?;

        if outcome == StepOutcome::Success {
            ctx.logger.debug(&format!("Validating output for '{}'", step_name));
            step.validate_output(ctx, state)
                .map_err(|e| fail("Output validation", e))?;
        }
        Ok(outcome)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running pipeline.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation; takes effect at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}
