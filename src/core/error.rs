//! Custom error types for Itinera
//!
//! Provides a unified error handling system across all modules.
//!
//! Tool-side failures (unknown tool, bad arguments, failed search) are not
//! errors: they become `ToolInvocationResult::Failure` values and flow back to
//! the model. Everything in this enum either aborts an episode or is reported
//! to the caller outside of one.

use thiserror::Error;

/// Main error type for Itinera operations
#[derive(Error, Debug)]
pub enum ItineraError {
    /// A tool with this name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Registry lookup for a tool that does not exist
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool result references a call that was never requested or was already answered
    #[error("Tool result for '{0}' does not match any pending tool call")]
    DanglingToolResult(String),

    /// The same tool call id was requested twice in one episode
    #[error("Tool call id '{0}' was already used in this episode")]
    DuplicateToolCallId(String),

    /// Transient failure of the language model call (rate limit, timeout, outage)
    #[error("Reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    /// Non-transient language model provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Search provider errors
    #[error("Search error: {0}")]
    Search(String),

    /// Email delivery errors
    #[error("Email error: {0}")]
    Email(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model not available at the provider
    #[error("Model '{0}' not available from the configured provider")]
    ModelNotFound(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Itinera operations
pub type Result<T> = std::result::Result<T, ItineraError>;

impl ItineraError {
    /// Create a transient reasoning error
    pub fn reasoning_unavailable(msg: impl Into<String>) -> Self {
        Self::ReasoningUnavailable(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create an email error
    pub fn email(msg: impl Into<String>) -> Self {
        Self::Email(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Variant name, reported to API clients as the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateTool(_) => "DuplicateTool",
            Self::UnknownTool(_) => "UnknownTool",
            Self::DanglingToolResult(_) => "DanglingToolResult",
            Self::DuplicateToolCallId(_) => "DuplicateToolCallId",
            Self::ReasoningUnavailable(_) => "ReasoningUnavailable",
            Self::Provider(_) => "Provider",
            Self::Search(_) => "Search",
            Self::Email(_) => "Email",
            Self::Config(_) => "Config",
            Self::ModelNotFound(_) => "ModelNotFound",
            Self::Json(_) => "Json",
            Self::Http(_) => "Http",
            Self::Io(_) => "Io",
            Self::Other(_) => "Other",
        }
    }

    /// Whether retrying the same model call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ReasoningUnavailable(_) => true,
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .map(|s| s.as_u16() == 429 || s.is_server_error())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ItineraError::reasoning_unavailable("rate limited").is_transient());
        assert!(!ItineraError::provider("bad request").is_transient());
        assert!(!ItineraError::DanglingToolResult("call_1".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = ItineraError::DuplicateTool("search_flights".into());
        assert_eq!(err.to_string(), "Tool 'search_flights' is already registered");
    }
}
