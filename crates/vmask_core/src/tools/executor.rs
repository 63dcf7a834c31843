//! External process execution.
//!
//! Every ffmpeg and tesseract call goes through [`ToolExecutor`] so steps
//! and engines can be exercised without the real binaries.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors from running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with code {exit_code}: {message}")]
    Failed {
        tool: String,
        exit_code: i32,
        message: String,
    },
}

impl ToolError {
    pub fn tool(&self) -> &str {
        match self {
            ToolError::Launch { tool, .. } | ToolError::Failed { tool, .. } => tool,
        }
    }
}

/// A program plus its argument vector.
///
/// Arguments are passed to the process as-is; [`ToolInvocation::command_line`]
/// is only for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: String,
    args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Short tool name (file stem of the program) for messages.
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Arguments joined for display, double-quoting any that need it.
    pub fn args_line(&self) -> String {
        self.args
            .iter()
            .map(|a| quote_for_display(a))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full command line for display.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args_line())
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote_for_display(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '[' | ']' | '"' | '\''));
    if needs_quotes {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// First line of a version banner (stdout, or stderr when stdout is empty).
    pub fn banner(&self) -> &str {
        let text = if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        };
        text.lines().next().map(str::trim).unwrap_or("")
    }

    /// Last `lines` lines of stderr, oldest first.
    pub fn stderr_tail(&self, lines: usize) -> Vec<&str> {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].to_vec()
    }
}

/// Runs external programs to completion.
pub trait ToolExecutor: Send + Sync {
    /// Run the invocation and capture its output, whatever the exit code.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;

    /// Run and turn a non-zero exit into [`ToolError::Failed`].
    fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let output = self.run(invocation)?;
        if output.is_success() {
            return Ok(output);
        }
        let message = output.stderr_tail(5).join("\n");
        Err(ToolError::Failed {
            tool: invocation.tool_name(),
            exit_code: output.exit_code,
            message: if message.is_empty() {
                "no error output".to_string()
            } else {
                message
            },
        })
    }
}

/// Executor backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl ToolExecutor for SystemExecutor {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        tracing::debug!("Running: {}", invocation);

        let output = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Launch {
                tool: invocation.tool_name(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
