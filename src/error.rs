use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Input too large: {bytes} bytes exceeds the {limit}-byte limit")]
    InputTooLarge { bytes: usize, limit: usize },

    #[error("Too many lines: {lines} lines exceeds the {limit}-line limit")]
    TooManyLines { lines: usize, limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for FormatError {
    fn from(err: anyhow::Error) -> Self {
        FormatError::Internal(err.to_string())
    }
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Extension trait for converting errors to FormatError with context
pub trait IntoFormatError<T> {
    fn format_context(self, context: &str) -> FormatResult<T>;
}

impl<T, E: std::fmt::Display> IntoFormatError<T> for Result<T, E> {
    fn format_context(self, context: &str) -> FormatResult<T> {
        self.map_err(|e| FormatError::Internal(format!("{}: {}", context, e)))
    }
}
