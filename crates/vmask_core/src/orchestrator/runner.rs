//! Runs one masking job end to end.
//!
//! `MaskRunner` owns the collaborators a run needs (settings, executor,
//! OCR engine), builds the per-run logger and context, drives the
//! standard pipeline and writes the JSON report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;

use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, RunLogger};
use crate::models::MaskJob;
use crate::ocr::OcrEngine;
use crate::tools::ToolExecutor;

use super::errors::PipelineError;
use super::pipeline::Pipeline;
use super::report::RunReport;
use super::types::{Context, ProgressCallback, RunState};
use super::create_standard_pipeline;

/// Result of running a single job.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,
    pub success: bool,
    /// Final video (if one was written).
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
    /// Everything the steps recorded, including partial results on failure.
    pub state: RunState,
    pub log_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

impl RunResult {
    /// Failure before any step ran.
    fn setup_failure(run_id: String, error: PipelineError) -> Self {
        tracing::error!("{}", error);
        Self {
            state: RunState::new(&run_id),
            run_id,
            success: false,
            output_path: None,
            error: Some(error.to_string()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
            log_path: None,
            report_path: None,
        }
    }
}

pub struct MaskRunner {
    settings: Settings,
    log_dir: PathBuf,
    executor: Arc<dyn ToolExecutor>,
    engine: Arc<dyn OcrEngine>,
    log_config: LogConfig,
}

impl MaskRunner {
    pub fn new(
        settings: Settings,
        log_dir: impl Into<PathBuf>,
        executor: Arc<dyn ToolExecutor>,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        let log_config = LogConfig::from_settings(&settings.logging);
        Self {
            settings,
            log_dir: log_dir.into(),
            executor,
            engine,
            log_config,
        }
    }

    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The pipeline `run` would use. Take its cancel handle before running.
    pub fn pipeline(&self) -> Pipeline {
        create_standard_pipeline(Arc::clone(&self.engine))
    }

    /// Run `job` through the standard pipeline.
    pub fn run(
        &self,
        job: MaskJob,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> RunResult {
        self.run_pipeline(&self.pipeline(), job, log_callback, progress_callback)
    }

    /// Run `job` through a caller-provided pipeline.
    pub fn run_pipeline(
        &self,
        pipeline: &Pipeline,
        job: MaskJob,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> RunResult {
        let run_id = format!("{}_{}", job.name(), Local::now().format("%Y%m%d_%H%M%S"));

        let logger = match RunLogger::new(
            &run_id,
            &self.log_dir,
            self.log_config.clone(),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                let error =
                    PipelineError::setup_failed(&run_id, format!("cannot create log file: {}", e));
                return RunResult::setup_failure(run_id, error);
            }
        };
        let log_path = logger.log_path().to_path_buf();

        let mut ctx = Context::new(
            job,
            self.settings.clone(),
            Arc::clone(&logger),
            Arc::clone(&self.executor),
        );
        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = RunState::new(&run_id);

        tracing::info!("Starting run {}", run_id);
        logger.section(&run_id);
        logger.info(&format!("Input:  {}", ctx.job.input_video.display()));
        logger.info(&format!("Output: {}", ctx.job.output_video.display()));
        logger.info(&format!(
            "Word: '{}', {} fps, {} workers",
            ctx.job.word_to_mask,
            ctx.job.output_frame_rate,
            ctx.settings.execution.worker_count()
        ));

        let outcome = pipeline.run(&ctx, &mut state);
        let error = outcome.as_ref().err().map(|e| e.to_string());

        let report_path = if self.settings.logging.write_report {
            let path = log_path.with_extension("json");
            let report = RunReport::from_state(&ctx.job, &state, error.clone());
            match report.write_json(&path) {
                Ok(()) => {
                    logger.info(&format!("Report written to {}", path.display()));
                    Some(path)
                }
                Err(e) => {
                    logger.warn(&format!("Could not write report: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let result = match outcome {
            Ok(run_result) => {
                let output_path = state.merge.as_ref().map(|m| m.output_path.clone());
                if let Some(ref path) = output_path {
                    logger.success(&format!("Run completed: {}", path.display()));
                }
                RunResult {
                    run_id,
                    success: true,
                    output_path,
                    error: None,
                    steps_completed: run_result.steps_completed,
                    steps_skipped: run_result.steps_skipped,
                    state,
                    log_path: Some(log_path),
                    report_path,
                }
            }
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                let failed_step = e.step_name();
                let steps_completed = state
                    .timings
                    .iter()
                    .filter(|t| Some(t.step.as_str()) != failed_step)
                    .map(|t| t.step.clone())
                    .collect();
                RunResult {
                    run_id,
                    success: false,
                    output_path: None,
                    error,
                    steps_completed,
                    steps_skipped: Vec::new(),
                    state,
                    log_path: Some(log_path),
                    report_path,
                }
            }
        };

        logger.flush();
        result
    }
}
