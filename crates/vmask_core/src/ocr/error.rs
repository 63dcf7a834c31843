use std::path::PathBuf;

use thiserror::Error;

use crate::tools::ToolError;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),
    #[error("OCR tool failed: {0}")]
    Tool(#[from] ToolError),
    #[error("unparsable OCR output at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
