//! Analyze step: find the target word on every frame in parallel.

use std::sync::Arc;

use super::report_frames;
use crate::detect::RegionDetector;
use crate::ocr::OcrEngine;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pool::fan_out;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{AnalysisOutput, Context, RunState, StepOutcome};

/// Runs OCR detection on each split frame.
///
/// A detection failure is recorded on its frame and never aborts the run.
pub struct AnalyzeStep {
    engine: Arc<dyn OcrEngine>,
}

impl AnalyzeStep {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }
}

impl PipelineStep for AnalyzeStep {
    fn name(&self) -> &str {
        "Analyze"
    }

    fn description(&self) -> &str {
        "Detecting target word on frames..."
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let version = self.engine.warm_up().map_err(|e| {
            StepError::precondition_failed(format!(
                "OCR engine '{}' is not usable: {}",
                self.engine.name(),
                e
            ))
        })?;
        ctx.logger.info(&format!("OCR engine: {}", version));
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let frames = state.frame_paths();
        let total = frames.len();
        let detector = RegionDetector::new(Arc::clone(&self.engine), &ctx.job.word_to_mask);
        ctx.logger.info(&format!(
            "Looking for '{}' on {} frames",
            detector.target(),
            total
        ));

        let pool = ctx.worker_pool()?;
        let analyzed = fan_out(
            &pool,
            frames,
            |index, path| detector.analyze(index, path),
            |done| report_frames(ctx, self.name(), done, total),
        );

        let output = AnalysisOutput {
            frames: analyzed,
            engine: detector.engine_name().to_string(),
        };
        for frame in output.detection_failures() {
            ctx.logger
                .warn(&format!("Detection failed on {}", frame.filename));
        }
        ctx.logger.info(&format!(
            "Found {} region(s) on {} of {} frames",
            output.total_regions(),
            output.frames_with_regions(),
            total
        ));

        state.analysis = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let frames = state.analyzed_frames();
        if frames.len() != state.frame_paths().len() {
            return Err(StepError::invalid_output(format!(
                "analyzed {} of {} frames",
                frames.len(),
                state.frame_paths().len()
            )));
        }
        if let Some(frame) = frames.iter().enumerate().find(|(i, f)| f.index != *i) {
            return Err(StepError::invalid_output(format!(
                "frame {} is out of order",
                frame.1.filename
            )));
        }
        Ok(())
    }
}
