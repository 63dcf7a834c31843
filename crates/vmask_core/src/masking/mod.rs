//! Frame masking: run the compiled blur command for one analyzed frame.
//!
//! Each call touches only its own frame's input and output paths, so a
//! single [`FrameMasker`] can be shared by every worker thread.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::ToolFailurePolicy;
use crate::filtergraph::{compile, FilterGraphError};
use crate::logging::{LogLevel, MessagePrefix, RunLogger};
use crate::models::{AnalyzedFrame, MaskOutcome};
use crate::tools::{ToolError, ToolExecutor, ToolInvocation};

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("frame {index} has an empty filename")]
    EmptyFilename { index: usize },

    #[error("input frame not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error(transparent)]
    Graph(#[from] FilterGraphError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

pub struct FrameMasker {
    executor: Arc<dyn ToolExecutor>,
    ffmpeg: String,
    output_dir: PathBuf,
    policy: ToolFailurePolicy,
    logger: Option<Arc<RunLogger>>,
}

impl FrameMasker {
    pub fn new(
        executor: Arc<dyn ToolExecutor>,
        ffmpeg: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            ffmpeg: ffmpeg.into(),
            output_dir: output_dir.into(),
            policy: ToolFailurePolicy::default(),
            logger: None,
        }
    }

    pub fn with_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Also write commands and tool output to a run log.
    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Blur the frame's regions into `<output_dir>/<filename>`.
    ///
    /// A frame without regions is left alone and nothing is written.
    pub fn mask(&self, frame: &AnalyzedFrame) -> Result<MaskOutcome, MaskError> {
        let output = self.checked_output(frame)?;
        let Some(invocation) = self.invocation(frame, &output)? else {
            return Ok(MaskOutcome::Skipped);
        };

        if let Some(ref logger) = self.logger {
            logger.log(
                LogLevel::Debug,
                &MessagePrefix::Command.format(&invocation.command_line()),
            );
        }

        match self.executor.execute(&invocation) {
            Ok(_) => Ok(MaskOutcome::Masked { output }),
            Err(e) => self.handle_failure(frame, e),
        }
    }

    /// Copy an unmasked frame unchanged into the output directory.
    pub fn pass_through(&self, frame: &AnalyzedFrame) -> Result<MaskOutcome, MaskError> {
        let output = self.checked_output(frame)?;
        if !frame.path.is_file() {
            return Err(MaskError::MissingInput(frame.path.clone()));
        }
        fs::copy(&frame.path, &output).map_err(|source| MaskError::Io {
            operation: format!("copying {}", frame.filename),
            source,
        })?;
        Ok(MaskOutcome::PassedThrough { output })
    }

    /// The blur command for `frame`, or `None` when it has no regions.
    pub fn invocation(
        &self,
        frame: &AnalyzedFrame,
        output: &Path,
    ) -> Result<Option<ToolInvocation>, MaskError> {
        if !frame.has_regions() {
            return Ok(None);
        }
        if !frame.path.is_file() {
            return Err(MaskError::MissingInput(frame.path.clone()));
        }
        let command = compile(&frame.regions, &frame.path, output)?;
        Ok(Some(command.invocation(&self.ffmpeg)))
    }

    fn checked_output(&self, frame: &AnalyzedFrame) -> Result<PathBuf, MaskError> {
        if frame.filename.is_empty() {
            return Err(MaskError::EmptyFilename { index: frame.index });
        }
        Ok(frame.output_path(&self.output_dir))
    }

    fn handle_failure(
        &self,
        frame: &AnalyzedFrame,
        error: ToolError,
    ) -> Result<MaskOutcome, MaskError> {
        if let (Some(logger), ToolError::Failed { message, .. }) = (&self.logger, &error) {
            for line in message.lines() {
                logger.output_line(line, true);
            }
        }
        match self.policy {
            ToolFailurePolicy::Fail => Err(MaskError::Tool(error)),
            ToolFailurePolicy::Report => {
                tracing::warn!("Masking {} failed: {}", frame.filename, error);
                Ok(MaskOutcome::Failed {
                    message: error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;
    use crate::tools::fake::FakeExecutor;
    use tempfile::tempdir;

    struct Dirs {
        _root: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempdir().unwrap();
        let input = root.path().join("input_frames");
        let output = root.path().join("output_frames");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        Dirs {
            _root: root,
            input,
            output,
        }
    }

    fn frame(dir: &Path, name: &str, regions: Vec<Rect>) -> AnalyzedFrame {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        AnalyzedFrame::new(0, path, regions)
    }

    #[test]
    fn masks_frame_with_regions() {
        let d = dirs();
        let executor = Arc::new(FakeExecutor::ffmpeg(0));
        let masker = FrameMasker::new(executor.clone(), "ffmpeg", &d.output);

        let f = frame(&d.input, "frame_0001.png", vec![Rect::new(10, 20, 30, 15).unwrap()]);
        let outcome = masker.mask(&f).unwrap();

        let expected = d.output.join("frame_0001.png");
        assert_eq!(outcome, MaskOutcome::Masked { output: expected.clone() });
        assert!(expected.exists());

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments()[0], "-hide_banner");
        assert!(calls[0].flag_value("-filter_complex").unwrap().starts_with("split=1"));
    }

    #[test]
    fn empty_regions_write_nothing() {
        let d = dirs();
        let executor = Arc::new(FakeExecutor::ffmpeg(0));
        let masker = FrameMasker::new(executor.clone(), "ffmpeg", &d.output);

        let f = frame(&d.input, "frame_0002.png", Vec::new());
        assert_eq!(masker.mask(&f).unwrap(), MaskOutcome::Skipped);
        assert!(executor.calls().is_empty());
        assert_eq!(fs::read_dir(&d.output).unwrap().count(), 0);
    }

    #[test]
    fn pass_through_copies_unchanged() {
        let d = dirs();
        let masker = FrameMasker::new(Arc::new(FakeExecutor::ffmpeg(0)), "ffmpeg", &d.output);

        let f = frame(&d.input, "frame_0003.png", Vec::new());
        let outcome = masker.pass_through(&f).unwrap();
        let out = outcome.output().unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "frame_0003.png");
    }

    #[test]
    fn empty_filename_is_fatal() {
        let d = dirs();
        let masker = FrameMasker::new(Arc::new(FakeExecutor::ffmpeg(0)), "ffmpeg", &d.output);
        let mut f = frame(&d.input, "frame_0001.png", vec![Rect::new(0, 0, 5, 5).unwrap()]);
        f.filename.clear();
        f.index = 7;
        assert!(matches!(masker.mask(&f), Err(MaskError::EmptyFilename { index: 7 })));
        assert!(matches!(masker.pass_through(&f), Err(MaskError::EmptyFilename { .. })));
    }

    #[test]
    fn missing_input_is_fatal() {
        let d = dirs();
        let masker = FrameMasker::new(Arc::new(FakeExecutor::ffmpeg(0)), "ffmpeg", &d.output);
        let f = AnalyzedFrame::new(
            0,
            d.input.join("frame_0009.png"),
            vec![Rect::new(0, 0, 5, 5).unwrap()],
        );
        assert!(matches!(masker.mask(&f), Err(MaskError::MissingInput(_))));
    }

    #[test]
    fn tool_failure_follows_policy() {
        let d = dirs();
        let f = frame(&d.input, "frame_0004.png", vec![Rect::new(1, 1, 4, 4).unwrap()]);

        let report = FrameMasker::new(
            Arc::new(FakeExecutor::ffmpeg(0).failing_on("frame_0004")),
            "ffmpeg",
            &d.output,
        );
        match report.mask(&f).unwrap() {
            MaskOutcome::Failed { message } => assert!(message.contains("simulated failure")),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let fail = FrameMasker::new(
            Arc::new(FakeExecutor::ffmpeg(0).failing_on("frame_0004")),
            "ffmpeg",
            &d.output,
        )
        .with_policy(ToolFailurePolicy::Fail);
        assert!(matches!(fail.mask(&f), Err(MaskError::Tool(_))));
    }
}
