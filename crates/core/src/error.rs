//! Error types for the vibeforge domain.
//!
//! Each boundary (model, tool bridge) has its own `thiserror` enum.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The model endpoint answered with a non-success status.
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("{tool_name} is not available: {reason}")]
    NotConfigured { tool_name: String, reason: String },

    /// The bridge itself could not be reached or answered with a failure status.
    #[error("Bridge error: {0}")]
    Bridge(String),
}

impl ToolError {
    pub fn invalid(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_names_the_tool() {
        let err = ToolError::NotFound("launch_rockets".into());
        assert_eq!(err.to_string(), "Unknown tool: launch_rockets");
    }

    #[test]
    fn invalid_arguments_mentions_tool_and_reason() {
        let err = ToolError::invalid("save_page", "ast must be an object");
        assert!(err.to_string().contains("save_page"));
        assert!(err.to_string().contains("ast must be an object"));
    }
}
