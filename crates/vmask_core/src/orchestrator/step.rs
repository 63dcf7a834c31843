//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls, in order:
///
/// 1. `validate_input` - check preconditions (inputs exist, tools respond)
/// 2. `execute` - do the work and record results in `RunState`
/// 3. `validate_output` - verify what `execute` recorded
///
/// Each step is a barrier: the next step starts only after `execute`
/// returns, so all of a step's per-frame tasks are finished by then.
///
/// # Example
///
/// ```ignore
/// struct CountStep;
///
/// impl PipelineStep for CountStep {
///     fn name(&self) -> &str { "Count" }
///
///     fn validate_input(&self, _ctx: &Context) -> StepResult<()> { Ok(()) }
///
///     fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
///         ctx.logger.info(&format!("{} frames", state.frame_paths().len()));
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> { Ok(()) }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Step name (for logging, timings and error context).
    fn name(&self) -> &str;

    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Perform the step's work.
    ///
    /// Use `ctx.logger` for logging and `ctx.report_progress()` for progress.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    /// Called only after `execute` returned `Success`.
    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Console message shown when the step starts.
    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep {
        name: &'static str,
    }

    impl PipelineStep for MockStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut RunState) -> StepResult<StepOutcome> {
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(MockStep { name: "TestStep" });
        assert_eq!(step.name(), "TestStep");
        assert_eq!(step.description(), "TestStep");
    }
}
