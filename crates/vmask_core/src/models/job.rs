//! The per-run masking job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// ffmpeg image-sequence pattern used for both staging directories.
pub const FRAME_PATTERN: &str = "frame_%04d.png";

/// Extension of staged frame images.
pub const FRAME_EXTENSION: &str = "png";

/// File name ffmpeg produces for the 1-based frame `number`.
pub fn frame_file_name(number: usize) -> String {
    format!("frame_{:04}.{}", number, FRAME_EXTENSION)
}

/// Immutable description of one masking run.
///
/// Built once (from settings and command line) and handed to the
/// orchestrator; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskJob {
    /// Video to read frames from.
    pub input_video: PathBuf,
    /// Final merged video, replaced if it exists.
    pub output_video: PathBuf,
    /// Frame rate used when reassembling (frames per second).
    pub output_frame_rate: u32,
    /// Staging directory for split frames.
    pub input_frames_dir: PathBuf,
    /// Staging directory for masked frames.
    pub output_frames_dir: PathBuf,
    /// Case-sensitive substring to redact.
    pub word_to_mask: String,
}

impl MaskJob {
    /// Check the job's own invariants (does not touch the filesystem).
    pub fn validate(&self) -> Result<(), String> {
        if self.word_to_mask.is_empty() {
            return Err("word to mask must not be empty".to_string());
        }
        if self.output_frame_rate == 0 {
            return Err("output frame rate must be at least 1".to_string());
        }
        if self.input_frames_dir == self.output_frames_dir {
            return Err(format!(
                "input and output frame directories must differ ({})",
                self.input_frames_dir.display()
            ));
        }
        if self.input_video == self.output_video {
            return Err(format!(
                "output video would overwrite the input ({})",
                self.input_video.display()
            ));
        }
        Ok(())
    }

    /// Split output pattern inside the input staging directory.
    pub fn input_pattern(&self) -> PathBuf {
        self.input_frames_dir.join(FRAME_PATTERN)
    }

    /// Merge input pattern inside the output staging directory.
    pub fn output_pattern(&self) -> PathBuf {
        self.output_frames_dir.join(FRAME_PATTERN)
    }

    /// Short display name used for log files and reports.
    pub fn name(&self) -> String {
        self.input_video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string())
    }
}
