//! Shared fixtures for step and pipeline tests.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::{tempdir, TempDir};

use super::types::Context;
use crate::config::Settings;
use crate::logging::{LogConfig, RunLogger};
use crate::models::frame_file_name;
use crate::ocr::{OcrEngine, OcrError, OcrWord};
use crate::tools::fake::FakeExecutor;
use crate::tools::ToolExecutor;

/// Context over a temp workspace with an existing input video.
pub(crate) fn context_with(
    executor: Arc<dyn ToolExecutor>,
    settings: Settings,
) -> (TempDir, Context) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("test_input.webm"), b"webm").unwrap();

    let mut settings = settings;
    settings.paths.input_frames_dir = root.join("input_frames").to_string_lossy().to_string();
    settings.paths.output_frames_dir = root.join("output_frames").to_string_lossy().to_string();
    if settings.execution.workers == 0 {
        settings.execution.workers = 2;
    }
    let job = settings.mask_job(root.join("test_input.webm"), root.join("output.webm"));

    let config = LogConfig {
        show_timestamps: false,
        ..LogConfig::default()
    };
    let logger = Arc::new(RunLogger::new("clip", root.join(".logs"), config, None).unwrap());

    (dir, Context::new(job, settings, logger, executor))
}

pub(crate) fn context() -> (TempDir, Context) {
    context_with(Arc::new(FakeExecutor::ffmpeg(3)), Settings::default())
}

/// OCR stub that reports the word "User" on the listed frame numbers and
/// fails on the ones listed in `broken`.
pub(crate) struct UserOnFrames {
    pub frames: Vec<usize>,
    pub broken: Vec<usize>,
}

impl UserOnFrames {
    pub(crate) fn new(frames: &[usize]) -> Self {
        Self {
            frames: frames.to_vec(),
            broken: Vec::new(),
        }
    }
}

impl OcrEngine for UserOnFrames {
    fn name(&self) -> &'static str {
        "user-on-frames"
    }

    fn recognize(&self, image: &Path) -> Result<Vec<OcrWord>, OcrError> {
        let is = |list: &[usize]| list.iter().any(|n| image.ends_with(frame_file_name(*n)));
        if is(&self.broken) {
            return Err(OcrError::backend("simulated OCR crash"));
        }
        if is(&self.frames) {
            return Ok(vec![
                OcrWord::new("Welcome", 5, 5, 60, 12),
                OcrWord::new("User:", 10, 20, 30, 15),
            ]);
        }
        Ok(Vec::new())
    }
}
