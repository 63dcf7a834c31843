//! vmask core - backend logic for masking a word in a screen recording
//!
//! Splits a video into frames, finds the target word on each frame with
//! OCR, blurs every occurrence with an ffmpeg filter graph and encodes the
//! frames back into a video. No UI dependencies; the CLI drives it through
//! [`orchestrator::MaskRunner`].

pub mod config;
pub mod detect;
pub mod filtergraph;
pub mod logging;
pub mod masking;
pub mod models;
pub mod ocr;
pub mod orchestrator;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
