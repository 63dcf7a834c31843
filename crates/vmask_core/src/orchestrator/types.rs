//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use super::errors::StepResult;
use super::pool::build_pool;
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{AnalyzedFrame, MaskJob, MaskOutcome};
use crate::tools::ToolExecutor;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Holds the job and the shared collaborators. Mutable results go in
/// `RunState`. Shared by reference with every worker thread.
pub struct Context {
    pub job: MaskJob,
    pub settings: Settings,
    pub run_name: String,
    pub logger: Arc<RunLogger>,
    pub executor: Arc<dyn ToolExecutor>,
    progress_callback: Option<ProgressCallback>,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl Context {
    pub fn new(
        job: MaskJob,
        settings: Settings,
        logger: Arc<RunLogger>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            run_name: job.name(),
            job,
            settings,
            logger,
            executor,
            progress_callback: None,
            pool: Mutex::new(None),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    pub fn ffmpeg(&self) -> &str {
        &self.settings.tools.ffmpeg_path
    }

    /// Worker pool for per-frame fan-out, built on first use and reused
    /// for the rest of the run.
    pub fn worker_pool(&self) -> StepResult<Arc<ThreadPool>> {
        let mut slot = self.pool.lock();
        if let Some(ref pool) = *slot {
            return Ok(Arc::clone(pool));
        }
        let workers = self.settings.execution.worker_count();
        let pool = Arc::new(build_pool(workers)?);
        self.logger.debug(&format!("Worker pool: {} threads", workers));
        *slot = Some(Arc::clone(&pool));
        Ok(pool)
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Each step writes its own section once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masking: Option<MaskOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeOutput>,
    /// Tool failures tolerated under the `report` policy.
    #[serde(default)]
    pub tool_failures: Vec<ToolFailure>,
    /// Wall-clock time per step, in run order.
    #[serde(default)]
    pub timings: Vec<StepTiming>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Frame paths produced by the split step.
    pub fn frame_paths(&self) -> &[PathBuf] {
        self.split.as_ref().map(|s| s.frames.as_slice()).unwrap_or(&[])
    }

    pub fn analyzed_frames(&self) -> &[AnalyzedFrame] {
        self.analysis
            .as_ref()
            .map(|a| a.frames.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_analysis(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn has_masking(&self) -> bool {
        self.masking.is_some()
    }

    pub fn record_timing(&mut self, step: impl Into<String>, millis: u64) {
        self.timings.push(StepTiming {
            step: step.into(),
            millis,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutput {
    /// Extracted frame files, sorted by name.
    pub frames: Vec<PathBuf>,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// One entry per frame, in frame order.
    pub frames: Vec<AnalyzedFrame>,
    pub engine: String,
}

impl AnalysisOutput {
    pub fn total_regions(&self) -> usize {
        self.frames.iter().map(|f| f.regions.len()).sum()
    }

    pub fn frames_with_regions(&self) -> usize {
        self.frames.iter().filter(|f| f.has_regions()).count()
    }

    pub fn detection_failures(&self) -> impl Iterator<Item = &AnalyzedFrame> {
        self.frames.iter().filter(|f| f.status.is_failed())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskOutput {
    /// One outcome per analyzed frame, in frame order.
    pub outcomes: Vec<MaskOutcome>,
}

impl MaskOutput {
    pub fn count(&self, pred: impl Fn(&MaskOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    pub fn masked(&self) -> usize {
        self.count(|o| matches!(o, MaskOutcome::Masked { .. }))
    }

    pub fn passed_through(&self) -> usize {
        self.count(|o| matches!(o, MaskOutcome::PassedThrough { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MaskOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, MaskOutcome::Failed { .. }))
    }

    /// Position of the first frame without an output file when a later
    /// frame does have one. The numbered sequence ffmpeg reads stops there.
    pub fn sequence_break(&self) -> Option<usize> {
        let first_missing = self.outcomes.iter().position(|o| o.output().is_none())?;
        self.outcomes[first_missing..]
            .iter()
            .any(|o| o.output().is_some())
            .then_some(first_missing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutput {
    pub output_path: PathBuf,
    pub command: String,
}

/// An external tool failure that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    pub step: String,
    pub millis: u64,
}

impl StepTiming {
    pub fn seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Skipped (not an error).
    Skipped(String),
}
