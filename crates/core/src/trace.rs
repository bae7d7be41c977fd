//! Trace events: one human-readable line per orchestrator step.
//!
//! These lines are the only thing a caller sees: the streaming reporter
//! writes each one, newline-terminated, as soon as it is produced.

use crate::text::truncate_chars;
use crate::tool::ToolResult;

/// Upper bound on the characters of a tool result shown in a trace line.
pub const RESULT_PREVIEW_CHARS: usize = 2000;

/// A single step of the planning loop, as reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// The model's final message; `None` when it carried no text.
    Assistant(Option<String>),

    /// The model requested a tool.
    ToolCall {
        name: String,
        arguments: serde_json::Value,
    },

    /// Preview of a tool's result, already truncated.
    ToolResult { preview: String },

    /// The model endpoint answered with a non-success status.
    UpstreamError { provider: String, message: String },

    /// A model response with neither a final message nor a tool call.
    Unrecognized(serde_json::Value),

    /// The loop gave up after this many model calls.
    IterationLimit { limit: u32 },

    /// Any other failure that ends the run.
    Error(String),
}

impl TraceEvent {
    /// Build a result preview, truncated to [`RESULT_PREVIEW_CHARS`].
    pub fn tool_result(result: &ToolResult) -> Self {
        let rendered = result.output.to_string();
        Self::ToolResult {
            preview: truncate_chars(&rendered, RESULT_PREVIEW_CHARS).to_string(),
        }
    }

    /// Render as one line (without the trailing newline).
    pub fn render(&self) -> String {
        let line = match self {
            Self::Assistant(text) => {
                format!("ASSISTANT: {}", text.as_deref().unwrap_or("[no text]"))
            }
            Self::ToolCall { name, arguments } => format!("TOOL_CALL: {name}({arguments})"),
            Self::ToolResult { preview } => format!("TOOL_RESULT: {preview}"),
            Self::UpstreamError { provider, message } => format!("{provider} error: {message}"),
            Self::Unrecognized(raw) => raw.to_string(),
            Self::IterationLimit { limit } => {
                format!("LIMIT: stopped after {limit} model calls without a final answer")
            }
            Self::Error(message) => format!("ERROR: {message}"),
        };
        // One event, one line: embedded newlines would split a frame.
        line.replace(['\r', '\n'], " ")
    }
}

impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
