//! Error types for the document pipeline and agents

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing template, model binding, credentials, bad sizes)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language-model or embedding provider failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// A specialist agent or tool failed at runtime
    #[error("Execution error: {0}")]
    Execution(String),

    /// Unknown section, tool or file
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vectors of different length were compared or stored together
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector with zero magnitude (similarity undefined)
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Input rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persisted vector index could not be read back
    #[error("Corrupt vector index '{path}': {message}")]
    CorruptIndex { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a corrupt index error
    pub fn corrupt_index(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry might succeed.
    ///
    /// Only provider and transport failures qualify; configuration and
    /// precondition errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Llm(_) => true,
            Error::Http(err) => !err.is_builder(),
            _ => false,
        }
    }

    /// Short stable label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Llm(_) | Error::Http(_) => "provider",
            Error::Execution(_) => "execution",
            Error::NotFound(_) => "not_found",
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::InvalidVector(_) => "invalid_vector",
            Error::InvalidInput(_) => "invalid_input",
            Error::CorruptIndex { .. } => "corrupt_index",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Toml(_) => "toml",
            Error::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(Error::llm("503").is_retryable());
        assert!(!Error::config("no template").is_retryable());
        assert!(!Error::DimensionMismatch { expected: 3, actual: 4 }.is_retryable());
        assert_eq!(Error::execution("boom").kind(), "execution");
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = Error::DimensionMismatch { expected: 768, actual: 384 };
        assert_eq!(err.to_string(), "Vector dimension mismatch: expected 768, got 384");
    }
}
