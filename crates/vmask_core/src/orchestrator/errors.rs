//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Frame → Operation

use std::io;

use thiserror::Error;

use crate::masking::MaskError;
use crate::tools::ToolError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    #[error("Run '{run_name}' was cancelled")]
    Cancelled { run_name: String },

    /// Failed to set up the run (logger, directories).
    #[error("Run '{run_name}' setup failed: {message}")]
    SetupFailed { run_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(run_name: impl Into<String>) -> Self {
        Self::Cancelled {
            run_name: run_name.into(),
        }
    }

    /// Name of the failed step, if the error came from one.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            PipelineError::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("Could not run {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A per-frame task failed; carries the frame it failed on.
    #[error("Frame {filename} (index {index}): {source}")]
    FrameFailed {
        index: usize,
        filename: String,
        #[source]
        source: Box<StepError>,
    },

    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    Other(String),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// I/O error with the operation that was attempted.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn frame_failed(index: usize, filename: impl Into<String>, source: StepError) -> Self {
        Self::FrameFailed {
            index,
            filename: filename.into(),
            source: Box::new(source),
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Frame index for per-frame failures.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            StepError::FrameFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<ToolError> for StepError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Launch { tool, source } => Self::ToolUnavailable { tool, source },
            ToolError::Failed {
                tool,
                exit_code,
                message,
            } => Self::CommandFailed {
                tool,
                exit_code,
                message,
            },
        }
    }
}

impl From<MaskError> for StepError {
    fn from(err: MaskError) -> Self {
        match err {
            MaskError::Tool(e) => e.into(),
            MaskError::MissingInput(path) => Self::file_not_found(path.display().to_string()),
            MaskError::Io { operation, source } => Self::IoError { operation, source },
            other @ (MaskError::EmptyFilename { .. } | MaskError::Graph(_)) => {
                Self::PreconditionFailed(other.to_string())
            }
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
