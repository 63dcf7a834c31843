use std::path::Path;

use super::error::OcrError;
use crate::models::Rect;

/// One recognized word token with its pixel box.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
    pub confidence: Option<f32>,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, value: f32) -> Self {
        self.confidence = Some(value);
        self
    }

    /// Box as a [`Rect`]; `None` when the engine reported an empty box.
    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_signed(self.left, self.top, self.width, self.height)
    }
}

/// Common interface for word-level OCR engines.
///
/// `recognize` must be callable from many worker threads at once; each call
/// owns whatever engine resources it needs.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check the engine is usable before a run. Returns a version string.
    fn warm_up(&self) -> Result<String, OcrError> {
        Ok(self.name().to_string())
    }

    /// Word tokens of the image, in the engine's native reading order.
    fn recognize(&self, image: &Path) -> Result<Vec<OcrWord>, OcrError>;
}

/// Engine that never finds any text.
#[derive(Debug, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &Path) -> Result<Vec<OcrWord>, OcrError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_has_no_bounds() {
        assert!(OcrWord::new("User", 1, 2, 0, 5).bounds().is_none());
        let rect = OcrWord::new("User", 1, 2, 3, 4).bounds().unwrap();
        assert_eq!((rect.x1(), rect.width()), (1, 3));
    }

    #[test]
    fn noop_finds_nothing() {
        let engine = NoopOcrEngine;
        assert!(engine.recognize(Path::new("missing.png")).unwrap().is_empty());
        assert_eq!(engine.warm_up().unwrap(), "noop");
    }
}
