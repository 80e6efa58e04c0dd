//! Language-model clients and prompt construction

pub mod ollama;
pub mod openai;
pub mod prompt;

pub use ollama::OllamaClient;
pub use openai::{OpenAiClient, UsageStats};
pub use prompt::PromptBuilder;

use reqwest::StatusCode;

use crate::error::Error;

/// Map a non-success HTTP status to an error.
///
/// Throttling and server-side failures are retryable provider errors;
/// rejected credentials or unknown models/deployments are configuration
/// errors that fail the same way every time.
pub(crate) fn status_error(operation: &str, status: StatusCode, body: &str) -> Error {
    let message = format!("{} failed: HTTP {} - {}", operation, status, body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => Error::Llm(message),
        s if s.is_server_error() => Error::Llm(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            Error::Config(message)
        }
        _ => Error::Execution(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(status_error("Chat", StatusCode::SERVICE_UNAVAILABLE, "").is_retryable());
        assert!(status_error("Chat", StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(matches!(
            status_error("Chat", StatusCode::UNAUTHORIZED, "bad key"),
            Error::Config(_)
        ));
        assert!(matches!(
            status_error("Chat", StatusCode::BAD_REQUEST, "bad json"),
            Error::Execution(_)
        ));
    }
}
