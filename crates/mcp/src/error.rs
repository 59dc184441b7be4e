//! Tool call errors.

use crate::protocol::error_codes;
use aidmcp_core::RequestError;
use aidmcp_execution::JobError;

/// Why a `tools/call` did not produce a payload.
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    /// No tool with this name is registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidParams {
        /// Tool being called
        tool: String,
        /// What was wrong
        message: String,
    },

    /// Arguments were well-formed but do not describe a valid request
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The queued `aid` invocation failed
    #[error(transparent)]
    Job(#[from] JobError),

    /// `aid` succeeded but printed nothing
    #[error("No output received from aid command. {subject} may not exist or aid binary may have issues.")]
    EmptyOutput {
        /// What the call was about ("File", "Directory", ...)
        subject: &'static str,
    },

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolCallError {
    /// Whether this is reported as a JSON-RPC error rather than an `isError` result.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            ToolCallError::UnknownTool(_)
                | ToolCallError::InvalidParams { .. }
                | ToolCallError::Request(_)
        )
    }

    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            ToolCallError::UnknownTool(_)
            | ToolCallError::InvalidParams { .. }
            | ToolCallError::Request(_) => error_codes::INVALID_PARAMS,
            ToolCallError::Job(e) => e.code(),
            ToolCallError::EmptyOutput { .. } => aidmcp_execution::error_codes::BUSINESS_ERROR,
            ToolCallError::Io(_) | ToolCallError::Json(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_protocol_errors() {
        assert!(ToolCallError::UnknownTool("x".into()).is_protocol_error());
        assert!(ToolCallError::Request(RequestError::EmptyTarget).is_protocol_error());
        assert!(!ToolCallError::EmptyOutput { subject: "File" }.is_protocol_error());
        assert!(!ToolCallError::Job(JobError::QueueClosed).is_protocol_error());
    }

    #[test]
    fn test_codes() {
        assert_eq!(ToolCallError::UnknownTool("x".into()).code(), -32602);
        assert_eq!(
            ToolCallError::Job(JobError::Timeout(Duration::from_secs(5))).code(),
            -32003
        );
        assert_eq!(ToolCallError::EmptyOutput { subject: "File" }.code(), -32000);
    }

    #[test]
    fn test_empty_output_message() {
        let err = ToolCallError::EmptyOutput {
            subject: "Directory",
        };
        assert_eq!(
            err.to_string(),
            "No output received from aid command. Directory may not exist or aid binary may have issues."
        );
    }
}
