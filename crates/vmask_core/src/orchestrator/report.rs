//! Machine-readable summary of one run, written next to the run log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{RunState, StepTiming, ToolFailure};
use crate::models::{DetectionStatus, MaskJob, MaskOutcome};

/// A frame the OCR engine could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameIssue {
    pub frame: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: Option<String>,
    pub finished_at: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub input_video: PathBuf,
    pub output_video: PathBuf,
    pub word_to_mask: String,

    pub frames: usize,
    pub frames_with_regions: usize,
    pub regions: usize,
    pub masked: usize,
    pub passed_through: usize,
    pub skipped: usize,
    /// Frames written without a blur (passed through or skipped).
    pub unmasked_frames: Vec<String>,
    pub detection_failures: Vec<FrameIssue>,
    pub tool_failures: Vec<ToolFailure>,
    pub timings: Vec<StepTiming>,
}

impl RunReport {
    /// Summarize `state` after the pipeline finished or stopped.
    pub fn from_state(job: &MaskJob, state: &RunState, error: Option<String>) -> Self {
        let analysis = state.analysis.as_ref();
        let masking = state.masking.as_ref();

        let detection_failures = state
            .analyzed_frames()
            .iter()
            .filter_map(|f| match f.status {
                DetectionStatus::Failed(ref message) => Some(FrameIssue {
                    frame: f.filename.clone(),
                    message: message.clone(),
                }),
                DetectionStatus::Detected => None,
            })
            .collect();

        let unmasked_frames = match masking {
            Some(m) => state
                .analyzed_frames()
                .iter()
                .zip(&m.outcomes)
                .filter(|(_, o)| {
                    matches!(o, MaskOutcome::Skipped | MaskOutcome::PassedThrough { .. })
                })
                .map(|(f, _)| f.filename.clone())
                .collect(),
            None => Vec::new(),
        };

        Self {
            run_id: state.run_id.clone(),
            started_at: state.started_at.clone(),
            finished_at: chrono::Local::now().to_rfc3339(),
            success: error.is_none(),
            error,
            input_video: job.input_video.clone(),
            output_video: job.output_video.clone(),
            word_to_mask: job.word_to_mask.clone(),
            frames: state.frame_paths().len(),
            frames_with_regions: analysis.map_or(0, |a| a.frames_with_regions()),
            regions: analysis.map_or(0, |a| a.total_regions()),
            masked: masking.map_or(0, |m| m.masked()),
            passed_through: masking.map_or(0, |m| m.passed_through()),
            skipped: masking.map_or(0, |m| m.skipped()),
            unmasked_frames,
            detection_failures,
            tool_failures: state.tool_failures.clone(),
            timings: state.timings.clone(),
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.timings.iter().map(StepTiming::seconds).sum()
    }

    /// Whether anything went wrong that the user should look at.
    pub fn has_issues(&self) -> bool {
        !self.detection_failures.is_empty() || !self.tool_failures.is_empty()
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::{AnalyzedFrame, Rect};
    use crate::orchestrator::types::{AnalysisOutput, MaskOutput};
    use tempfile::tempdir;

    fn finished_state() -> RunState {
        let mut state = RunState::new("clip_20260101");
        let frames = vec![
            AnalyzedFrame::new(0, "in/frame_0001.png", vec![Rect::new(1, 2, 3, 4).unwrap()]),
            AnalyzedFrame::new(1, "in/frame_0002.png", Vec::new()),
            AnalyzedFrame::failed(2, "in/frame_0003.png", "engine crashed"),
        ];
        state.analysis = Some(AnalysisOutput {
            frames,
            engine: "test".to_string(),
        });
        state.masking = Some(MaskOutput {
            outcomes: vec![
                MaskOutcome::Masked {
                    output: "out/frame_0001.png".into(),
                },
                MaskOutcome::PassedThrough {
                    output: "out/frame_0002.png".into(),
                },
                MaskOutcome::Skipped,
            ],
        });
        state.record_timing("Analyze", 1500);
        state.record_timing("Mask", 500);
        state
    }

    #[test]
    fn summarizes_state() {
        let job = Settings::default().mask_job("in.webm".into(), "out.webm".into());
        let report = RunReport::from_state(&job, &finished_state(), None);

        assert!(report.success);
        assert_eq!((report.regions, report.masked, report.passed_through), (1, 1, 1));
        assert_eq!(report.unmasked_frames, ["frame_0002.png", "frame_0003.png"]);
        assert_eq!(report.detection_failures[0].frame, "frame_0003.png");
        assert!(report.has_issues());
        assert!((report.total_seconds() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn writes_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let job = Settings::default().mask_job("in.webm".into(), "out.webm".into());
        let report = RunReport::from_state(&job, &finished_state(), Some("boom".to_string()));
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert_eq!(value["timings"][0]["step"], "Analyze");
    }
}
