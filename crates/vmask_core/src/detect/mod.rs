//! Region detection: where does the target word appear in a frame?
//!
//! Matching is a case-sensitive substring test against each OCR word
//! token, so `"User"` matches `"User:"` and `"Username"` but not `"user"`.
//! OCR failures never propagate: the frame simply has no regions and the
//! failure is recorded on the [`AnalyzedFrame`].

use std::path::Path;
use std::sync::Arc;

use crate::models::{AnalyzedFrame, Rect};
use crate::ocr::{OcrEngine, OcrError, OcrWord};

/// Boxes of every token containing `target`, in token order.
///
/// Tokens with an empty box are dropped.
pub fn matching_regions(words: &[OcrWord], target: &str) -> Vec<Rect> {
    if target.is_empty() {
        return Vec::new();
    }
    words
        .iter()
        .filter(|w| w.text.contains(target))
        .filter_map(|w| {
            let bounds = w.bounds();
            if bounds.is_none() {
                tracing::debug!("Dropping '{}' with empty box", w.text);
            }
            bounds
        })
        .collect()
}

/// Run OCR on `image` and return the matching regions.
pub fn try_detect(
    engine: &dyn OcrEngine,
    image: &Path,
    target: &str,
) -> Result<Vec<Rect>, OcrError> {
    let words = engine.recognize(image)?;
    Ok(matching_regions(&words, target))
}

/// Like [`try_detect`], but failures are logged and yield no regions.
pub fn detect(engine: &dyn OcrEngine, image: &Path, target: &str) -> Vec<Rect> {
    try_detect(engine, image, target).unwrap_or_else(|e| {
        tracing::warn!("OCR failed on {}: {}", image.display(), e);
        Vec::new()
    })
}

/// Detection bound to one engine and one target word.
#[derive(Clone)]
pub struct RegionDetector {
    engine: Arc<dyn OcrEngine>,
    target: String,
}

impl RegionDetector {
    pub fn new(engine: Arc<dyn OcrEngine>, target: impl Into<String>) -> Self {
        Self {
            engine,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Analyze the frame at `path`, recording any OCR failure in its status.
    pub fn analyze(&self, index: usize, path: &Path) -> AnalyzedFrame {
        match try_detect(self.engine.as_ref(), path, &self.target) {
            Ok(regions) => {
                if !regions.is_empty() {
                    tracing::debug!("{}: {} region(s)", path.display(), regions.len());
                }
                AnalyzedFrame::new(index, path, regions)
            }
            Err(e) => {
                tracing::warn!("OCR failed on {}: {}", path.display(), e);
                AnalyzedFrame::failed(index, path, e.to_string())
            }
        }
    }
}
