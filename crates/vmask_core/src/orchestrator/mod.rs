//! Pipeline orchestrator for running a masking job.
//!
//! A run is a sequence of steps, each a full barrier: every frame task of
//! one step completes before the next step starts. Steps validate their
//! input, execute, validate their output and record their results in
//! [`RunState`].
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Prepare   recreate staging directories
//!     ├── Step: Split     ffmpeg, video -> frame_%04d.png
//!     ├── Step: Analyze   OCR per frame (worker pool)
//!     ├── Step: Mask      ffmpeg blur per frame (worker pool)
//!     └── Step: Merge     ffmpeg, frames -> video
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vmask_core::orchestrator::MaskRunner;
//!
//! let runner = MaskRunner::new(settings, ".logs", executor, engine);
//! let result = runner.run(job, None, None);
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod pool;
mod report;
mod runner;
mod step;
pub mod steps;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::ocr::OcrEngine;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use pool::{build_pool, fan_out, lowest_error, percent};
pub use report::{FrameIssue, RunReport};
pub use runner::{MaskRunner, RunResult};
pub use step::PipelineStep;
pub use steps::{AnalyzeStep, MaskStep, MergeStep, PrepareStep, SplitStep};
pub use types::{
    AnalysisOutput, Context, MaskOutput, MergeOutput, ProgressCallback, RunState, SplitOutput,
    StepOutcome, StepTiming, ToolFailure,
};

/// Create the standard pipeline with all steps in order.
///
/// 1. Prepare - recreate staging directories, drop the previous output
/// 2. Split - decode the input video into frames
/// 3. Analyze - locate the target word on every frame
/// 4. Mask - blur matched regions into the output directory
/// 5. Merge - encode the output frames into the final video
pub fn create_standard_pipeline(engine: Arc<dyn OcrEngine>) -> Pipeline {
    Pipeline::new()
        .with_step(PrepareStep::new())
        .with_step(SplitStep::new())
        .with_step(AnalyzeStep::new(engine))
        .with_step(MaskStep::new())
        .with_step(MergeStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::NoopOcrEngine;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline(Arc::new(NoopOcrEngine));
        assert_eq!(
            pipeline.step_names(),
            ["Prepare", "Split", "Analyze", "Mask", "Merge"]
        );
    }
}
