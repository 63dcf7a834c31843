//! External tool plumbing: the process executor seam and ffmpeg builders.

mod executor;
pub mod ffmpeg;

#[cfg(test)]
pub(crate) mod fake;

pub use executor::{SystemExecutor, ToolError, ToolExecutor, ToolInvocation, ToolOutput};
