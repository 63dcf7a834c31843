use thiserror::Error;

/// Errors from compiling or validating a filter graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterGraphError {
    #[error("cannot build a blur graph without regions")]
    NoRegions,

    #[error("stage {stage} consumes [{label}] before it is produced")]
    UnproducedLabel { stage: usize, label: String },

    #[error("label [{label}] is produced more than once")]
    DuplicateLabel { label: String },

    #[error("label [{label}] is consumed more than once")]
    ReusedLabel { label: String },

    #[error("label [{label}] is produced but never consumed")]
    DanglingLabel { label: String },

    #[error("stage {stage} has no inputs and is not a split")]
    MissingInput { stage: usize },

    #[error("expected exactly one terminal stage, found {count}")]
    TerminalCount { count: usize },
}
