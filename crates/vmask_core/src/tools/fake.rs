//! In-memory executor that simulates ffmpeg for unit tests.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::executor::{ToolError, ToolExecutor, ToolInvocation, ToolOutput};
use crate::models::frame_file_name;

type Handler = Box<dyn Fn(&ToolInvocation) -> Result<ToolOutput, ToolError> + Send + Sync>;

pub struct FakeExecutor {
    handler: Handler,
    failing_on: Vec<String>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeExecutor {
    pub fn new(
        handler: impl Fn(&ToolInvocation) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            failing_on: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Simulated ffmpeg: split writes `frames` files, blur copies input to
    /// output, merge writes the output video.
    pub fn ffmpeg(frames: usize) -> Self {
        Self::new(move |inv| simulate_ffmpeg(inv, frames))
    }

    /// Exit with code 1 whenever the command line contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.failing_on.push(needle.into());
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls carrying `flag`.
    pub fn count_with(&self, flag: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.arguments().iter().any(|a| a == flag))
            .count()
    }
}

impl ToolExecutor for FakeExecutor {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push(invocation.clone());
        let line = invocation.command_line();
        if self.failing_on.iter().any(|n| line.contains(n.as_str())) {
            return Ok(ToolOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: "Error while filtering: simulated failure".to_string(),
            });
        }
        (self.handler)(invocation)
    }
}

fn simulate_ffmpeg(inv: &ToolInvocation, frames: usize) -> Result<ToolOutput, ToolError> {
    let args = inv.arguments();
    let io_err = |source| ToolError::Launch {
        tool: "ffmpeg".to_string(),
        source,
    };

    if args.iter().any(|a| a == "-version") {
        return Ok(ToolOutput::success("ffmpeg version test"));
    }

    let Some(last) = args.last().map(PathBuf::from) else {
        return Ok(ToolOutput::success(""));
    };

    if inv.flag_value("-filter_complex").is_some() {
        let input = inv.flag_value("-i").unwrap_or_default();
        let data = fs::read(input).map_err(io_err)?;
        fs::write(&last, [data.as_slice(), b"+blurred"].concat()).map_err(io_err)?;
    } else if args.first().map(String::as_str) == Some("-r") {
        let pattern = inv.flag_value("-i").unwrap_or_default();
        let dir = Path::new(pattern).parent().unwrap_or(Path::new("."));
        let count = fs::read_dir(dir).map_err(io_err)?.count();
        fs::write(&last, format!("video of {} frames", count)).map_err(io_err)?;
    } else {
        let dir = last.parent().unwrap_or(Path::new("."));
        for n in 1..=frames {
            fs::write(dir.join(frame_file_name(n)), format!("frame {}", n)).map_err(io_err)?;
        }
    }

    Ok(ToolOutput::success(""))
}
