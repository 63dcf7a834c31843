//! Configuration management for the video masking tool.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Automatic defaults for missing keys
//!
//! # Example
//!
//! ```no_run
//! use vmask_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Masking: {}", config.settings().masking.word_to_mask);
//!
//! config.settings_mut().paths.last_input_video = "clip.webm".into();
//! config.update_section(ConfigSection::Paths).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, ExecutionSettings, LoggingSettings, MaskingSettings, OcrSettings,
    PathSettings, Settings, ToolFailurePolicy, ToolSettings, VideoSettings,
};
