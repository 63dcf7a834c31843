//! Blur filter graphs: typed representation, compiler and ffmpeg command.

mod compiler;
mod error;
mod graph;

pub use compiler::{compile, compile_graph, MaskCommand, BLUR_POWER, BLUR_RADIUS, CROP_PADDING};
pub use error::FilterGraphError;
pub use graph::{Filter, FilterGraph, Label, Stage};
