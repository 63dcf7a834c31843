//! ffmpeg command builders for the split and merge steps.
//!
//! The per-frame blur command is built by the filter graph compiler.

use std::path::Path;

use super::executor::ToolInvocation;

/// `ffmpeg -i <video> <pattern>`: one PNG per decoded frame.
pub fn split_invocation(ffmpeg: &str, input_video: &Path, pattern: &Path) -> ToolInvocation {
    ToolInvocation::new(ffmpeg)
        .arg("-i")
        .path_arg(input_video)
        .path_arg(pattern)
}

/// `ffmpeg -r <fps> -i <pattern> -r <fps> <video>`: reassemble a sequence.
pub fn merge_invocation(
    ffmpeg: &str,
    frame_rate: u32,
    pattern: &Path,
    output_video: &Path,
) -> ToolInvocation {
    let rate = frame_rate.to_string();
    ToolInvocation::new(ffmpeg)
        .args(["-r", rate.as_str(), "-i"])
        .path_arg(pattern)
        .args(["-r", rate.as_str()])
        .path_arg(output_video)
}

/// `ffmpeg -version`, used to check the binary is usable.
pub fn version_invocation(ffmpeg: &str) -> ToolInvocation {
    ToolInvocation::new(ffmpeg).arg("-version")
}
