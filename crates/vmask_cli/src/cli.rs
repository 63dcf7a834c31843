use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use vmask_core::config::{Settings, ToolFailurePolicy};

#[derive(Debug, Parser)]
#[command(
    name = "video-mask",
    about = "Blur every occurrence of a word in a screen recording",
    version,
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Input video path (defaults to the last remembered input)
    pub input: Option<PathBuf>,

    /// Output video path (defaults to <input>_masked.<ext>)
    pub output: Option<PathBuf>,

    /// Word to blur; matched case-sensitively inside OCR tokens
    #[arg(short = 'w', long = "word")]
    pub word: Option<String>,

    /// Frame rate of the output video
    #[arg(long = "fps", value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: Option<u32>,

    /// Staging directory for extracted frames
    #[arg(long = "input-frames-dir", value_name = "DIR")]
    pub input_frames_dir: Option<PathBuf>,

    /// Staging directory for masked frames
    #[arg(long = "output-frames-dir", value_name = "DIR")]
    pub output_frames_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(long = "config", default_value = ".config/settings.toml")]
    pub config: PathBuf,

    /// Worker threads for detection and masking (0 = all cores)
    #[arg(short = 'j', long = "workers")]
    pub workers: Option<usize>,

    /// Abort the run when a per-frame ffmpeg call fails
    #[arg(long = "fail-on-tool-error")]
    pub fail_on_tool_error: bool,

    /// Leave frames without matches out of the output instead of copying them
    #[arg(long = "no-pass-through")]
    pub no_pass_through: bool,

    /// Tesseract language
    #[arg(long = "ocr-language", value_name = "LANG")]
    pub ocr_language: Option<String>,

    /// Tesseract data directory
    #[arg(long = "tessdata-dir", value_name = "DIR")]
    pub tessdata_dir: Option<PathBuf>,

    /// Store the input and output paths in the configuration file
    #[arg(long = "remember")]
    pub remember: bool,

    /// Log every command, tool output line and progress update
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Apply command line values on top of the file settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ref word) = self.word {
            settings.masking.word_to_mask = word.clone();
        }
        if let Some(fps) = self.fps {
            settings.video.output_frame_rate = fps;
        }
        if let Some(ref dir) = self.input_frames_dir {
            settings.paths.input_frames_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref dir) = self.output_frames_dir {
            settings.paths.output_frames_dir = dir.to_string_lossy().to_string();
        }
        if let Some(workers) = self.workers {
            settings.execution.workers = workers;
        }
        if self.fail_on_tool_error {
            settings.execution.tool_failure = ToolFailurePolicy::Fail;
        }
        if self.no_pass_through {
            settings.execution.pass_through_unmasked = false;
        }
        if let Some(ref language) = self.ocr_language {
            settings.ocr.language = language.clone();
        }
        if let Some(ref dir) = self.tessdata_dir {
            settings.ocr.tessdata_dir = dir.to_string_lossy().to_string();
        }
    }

    /// Input and output video paths, falling back to remembered values.
    pub fn resolve_paths(&self, settings: &Settings) -> anyhow::Result<(PathBuf, PathBuf)> {
        let remembered = |value: &str| (!value.is_empty()).then(|| PathBuf::from(value));

        let Some(input) = self
            .input
            .clone()
            .or_else(|| remembered(&settings.paths.last_input_video))
        else {
            bail!("no input video given and none remembered; pass one or use --remember");
        };

        let output = self
            .output
            .clone()
            .or_else(|| {
                // A remembered output only applies to the remembered input
                self.input
                    .is_none()
                    .then(|| remembered(&settings.paths.last_output_video))
                    .flatten()
            })
            .unwrap_or_else(|| default_output(&input));

        Ok((input, output))
    }
}

/// `<dir>/<stem>_masked.<ext>` next to the input.
fn default_output(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_masked.{}", stem, ext.to_string_lossy()),
        None => format!("{}_masked", stem),
    };
    input.with_file_name(name)
}
