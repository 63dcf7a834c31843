//! Data models shared across the crate.
//!
//! - `Rect`: the bounding-box value type
//! - `AnalyzedFrame`, `DetectionStatus`, `MaskOutcome`: per-frame records
//! - `MaskJob`: the immutable per-run configuration

mod frame;
mod geometry;
mod job;

pub use frame::{AnalyzedFrame, DetectionStatus, MaskOutcome};
pub use geometry::Rect;
pub use job::{frame_file_name, MaskJob, FRAME_EXTENSION, FRAME_PATTERN};
