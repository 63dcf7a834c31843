//! Per-frame analysis and masking records.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Outcome of running word detection on one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum DetectionStatus {
    /// The OCR engine ran; `regions` holds every match (possibly none).
    #[default]
    Detected,
    /// The OCR engine failed; the frame is treated as having no regions.
    Failed(String),
}

impl DetectionStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, DetectionStatus::Failed(_))
    }
}

/// One frame after detection, ready to be masked.
///
/// Produced by exactly one detection task and consumed by exactly one
/// masking task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedFrame {
    /// Position in the sorted frame list.
    pub index: usize,
    /// Source image location.
    pub path: PathBuf,
    /// Base name, reused for the masked output file.
    pub filename: String,
    /// Matching word boxes in OCR iteration order.
    pub regions: Vec<Rect>,
    /// Detection status.
    pub status: DetectionStatus,
}

impl AnalyzedFrame {
    /// Build a frame record from a source path, deriving the filename.
    pub fn new(index: usize, path: impl Into<PathBuf>, regions: Vec<Rect>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            index,
            path,
            filename,
            regions,
            status: DetectionStatus::Detected,
        }
    }

    /// Record a detection failure (the frame keeps zero regions).
    pub fn failed(index: usize, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let mut frame = Self::new(index, path, Vec::new());
        frame.status = DetectionStatus::Failed(message.into());
        frame
    }

    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }

    /// Output location for this frame inside `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.filename)
    }
}

/// What the masking phase did with a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MaskOutcome {
    /// A blurred copy was written.
    Masked { output: PathBuf },
    /// No regions; nothing written.
    Skipped,
    /// No regions; the original frame was copied unchanged.
    PassedThrough { output: PathBuf },
    /// The masking tool failed and the failure policy allowed the run to go on.
    Failed { message: String },
}

impl MaskOutcome {
    /// Path written by this outcome, if any.
    pub fn output(&self) -> Option<&Path> {
        match self {
            MaskOutcome::Masked { output } | MaskOutcome::PassedThrough { output } => {
                Some(output)
            }
            MaskOutcome::Skipped | MaskOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_filename_from_path() {
        let frame = AnalyzedFrame::new(0, "/tmp/in/frame_0007.png", Vec::new());
        assert_eq!(frame.filename, "frame_0007.png");
        assert_eq!(
            frame.output_path(Path::new("/tmp/out")),
            PathBuf::from("/tmp/out/frame_0007.png")
        );
        assert!(!frame.has_regions());
    }

    #[test]
    fn failed_frame_has_no_regions() {
        let frame = AnalyzedFrame::failed(3, "a/frame_0004.png", "engine crashed");
        assert!(frame.status.is_failed());
        assert!(frame.regions.is_empty());
        assert_eq!(frame.index, 3);
    }

    #[test]
    fn frame_serializes_status() {
        let frame = AnalyzedFrame::failed(0, "frame_0001.png", "boom");
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"message\":\"boom\""));
    }

    #[test]
    fn only_written_outcomes_have_output() {
        let masked = MaskOutcome::Masked {
            output: PathBuf::from("o.png"),
        };
        assert_eq!(masked.output(), Some(Path::new("o.png")));
        assert!(MaskOutcome::Skipped.output().is_none());
    }
}
