//! Word-level OCR behind a small engine trait.

mod engine;
mod error;
mod tesseract;

pub use engine::{NoopOcrEngine, OcrEngine, OcrWord};
pub use error::OcrError;
pub use tesseract::{parse_tsv, TesseractEngine};
