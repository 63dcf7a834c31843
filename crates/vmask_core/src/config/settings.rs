//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::MaskJob;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Staging directories, logs and remembered paths.
    #[serde(default)]
    pub paths: PathSettings,

    /// Reassembly settings.
    #[serde(default)]
    pub video: VideoSettings,

    /// What to redact.
    #[serde(default)]
    pub masking: MaskingSettings,

    /// OCR engine settings.
    #[serde(default)]
    pub ocr: OcrSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Worker pool and failure policy.
    #[serde(default)]
    pub execution: ExecutionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Build the immutable job for one run from these settings.
    pub fn mask_job(&self, input_video: PathBuf, output_video: PathBuf) -> MaskJob {
        MaskJob {
            input_video,
            output_video,
            output_frame_rate: self.video.output_frame_rate,
            input_frames_dir: PathBuf::from(&self.paths.input_frames_dir),
            output_frames_dir: PathBuf::from(&self.paths.output_frames_dir),
            word_to_mask: self.masking.word_to_mask.clone(),
        }
    }
}

/// Path configuration for staging and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory the split frames are written to.
    #[serde(default = "default_input_frames_dir")]
    pub input_frames_dir: String,

    /// Directory the masked frames are written to.
    #[serde(default = "default_output_frames_dir")]
    pub output_frames_dir: String,

    /// Folder for log files and run reports.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last used input video.
    #[serde(default)]
    pub last_input_video: String,

    /// Last used output video.
    #[serde(default)]
    pub last_output_video: String,
}

fn default_input_frames_dir() -> String {
    "input_frames".to_string()
}

fn default_output_frames_dir() -> String {
    "output_frames".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_frames_dir: default_input_frames_dir(),
            output_frames_dir: default_output_frames_dir(),
            logs_folder: default_logs_folder(),
            last_input_video: String::new(),
            last_output_video: String::new(),
        }
    }
}

/// Reassembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Frame rate of the merged output (frames per second).
    #[serde(default = "default_frame_rate")]
    pub output_frame_rate: u32,
}

fn default_frame_rate() -> u32 {
    3
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            output_frame_rate: default_frame_rate(),
        }
    }
}

/// Redaction target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingSettings {
    /// Case-sensitive substring matched against each recognized word.
    #[serde(default = "default_word")]
    pub word_to_mask: String,
}

fn default_word() -> String {
    "User".to_string()
}

impl Default for MaskingSettings {
    fn default() -> Self {
        Self {
            word_to_mask: default_word(),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Language model passed to the engine.
    #[serde(default = "default_language")]
    pub language: String,

    /// Resolution hint for the engine.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Custom trained-data directory (engine default when empty).
    #[serde(default)]
    pub tessdata_dir: String,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_dpi() -> u32 {
    131
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            dpi: default_dpi(),
            tessdata_dir: String::new(),
        }
    }
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg binary (looked up on PATH by default).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// tesseract binary (looked up on PATH by default).
    #[serde(default = "default_tesseract")]
    pub tesseract_path: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_tesseract() -> String {
    "tesseract".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            tesseract_path: default_tesseract(),
        }
    }
}

/// How a failing external tool affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFailurePolicy {
    /// Log a warning, record the failure and keep going.
    #[default]
    Report,
    /// Abort the current step.
    Fail,
}

/// Worker pool and failure handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Worker threads for analysis and masking (0 = available parallelism).
    #[serde(default)]
    pub workers: usize,

    /// Failure policy for per-frame masking tool calls.
    #[serde(default)]
    pub tool_failure: ToolFailurePolicy,

    /// Copy frames without matches unchanged into the output directory.
    #[serde(default = "default_true")]
    pub pass_through_unmasked: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            tool_failure: ToolFailurePolicy::default(),
            pass_through_unmasked: true,
        }
    }
}

impl ExecutionSettings {
    /// Resolved worker count, never zero.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Write a JSON run report next to the log.
    #[serde(default = "default_true")]
    pub write_report: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            write_report: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Video,
    Masking,
    Ocr,
    Tools,
    Execution,
    Logging,
}

impl ConfigSection {
    /// Every section, in file order.
    pub const ALL: [ConfigSection; 7] = [
        ConfigSection::Paths,
        ConfigSection::Video,
        ConfigSection::Masking,
        ConfigSection::Ocr,
        ConfigSection::Tools,
        ConfigSection::Execution,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Video => "video",
            ConfigSection::Masking => "masking",
            ConfigSection::Ocr => "ocr",
            ConfigSection::Tools => "tools",
            ConfigSection::Execution => "execution",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment line written above the table.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Staging directories, logs and remembered paths",
            ConfigSection::Video => "Reassembly of the masked frames",
            ConfigSection::Masking => "Word to redact (case-sensitive substring)",
            ConfigSection::Ocr => "OCR engine options",
            ConfigSection::Tools => "External tool binaries",
            ConfigSection::Execution => {
                "Worker pool and failure policy (tool_failure: report | fail)"
            }
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
