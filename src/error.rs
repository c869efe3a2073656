use thiserror::Error;

/// Errors raised by the encoding/regression core.
///
/// Every variant is scoped to a single fit/predict call; callers decide how to
/// present it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A required field is missing or malformed.
    #[error("invalid field `{field}`: {reason}")]
    Schema { field: String, reason: String },

    /// A categorical value was not seen during fit (only under the `error` policy).
    #[error("unknown category for `{field}`: '{value}'")]
    UnknownCategory { field: String, value: String },

    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Artifact unreadable, corrupt, or incompatible with this build.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("model has not been fitted")]
    NotFitted,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl PipelineError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code used when this error reaches `main`.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Schema { .. }
            | PipelineError::UnknownCategory { .. }
            | PipelineError::InvalidParams(_) => 2,
            PipelineError::EmptyDataset => 3,
            PipelineError::DimensionMismatch { .. }
            | PipelineError::Persistence(_)
            | PipelineError::NotFitted => 4,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
