//! Executor abstraction and process outcomes.

use aidmcp_core::ArgumentVector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runs one external process for an argument vector.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute once and capture both output channels.
    ///
    /// A non-zero exit is still `Ok`; only failures to create the process
    /// or read its pipes are errors.
    async fn execute(&self, argv: &ArgumentVector) -> Result<ExecutionOutcome, ExecError>;
}

/// Errors from the environment rather than from the tool itself.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The process could not be created (missing binary, permission denied)
    #[error("failed to start {}: {source}", binary.display())]
    Spawn {
        /// Binary that was invoked
        binary: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The process started but its output could not be collected
    #[error("failed to capture output of {}: {source}", binary.display())]
    Capture {
        /// Binary that was invoked
        binary: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by the tool through a non-zero exit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ToolFailure {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Human-readable reason
    pub message: String,
}

/// Everything a terminated process produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Wall-clock duration
    pub duration: std::time::Duration,
}

impl ExecutionOutcome {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Classify into a payload or a tool-reported failure.
    ///
    /// On success, non-blank stderr (progress text) is placed ahead of
    /// stdout, separated by a blank line. On failure any stderr at all is
    /// the message; only empty stderr falls back to a generated one.
    pub fn classify(self) -> Result<String, ToolFailure> {
        match self.exit_code {
            Some(0) => {
                if self.stderr.trim().is_empty() {
                    Ok(self.stdout)
                } else {
                    Ok(format!("{}\n\n{}", self.stderr, self.stdout))
                }
            }
            Some(code) => Err(ToolFailure {
                exit_code: Some(code),
                message: if self.stderr.is_empty() {
                    format!("aid exited with code {}", code)
                } else {
                    self.stderr
                },
            }),
            None => Err(ToolFailure {
                exit_code: None,
                message: if self.stderr.is_empty() {
                    "aid terminated by signal".to_string()
                } else {
                    self.stderr
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(exit_code: Option<i32>, stdout: &str, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_success_with_stderr_prefixes_progress() {
        let payload = outcome(Some(0), "RESULT", "note").classify().unwrap();
        assert_eq!(payload, "note\n\nRESULT");
    }

    #[test]
    fn test_success_without_stderr() {
        let payload = outcome(Some(0), "RESULT", "").classify().unwrap();
        assert_eq!(payload, "RESULT");
    }

    #[test]
    fn test_whitespace_stderr_ignored() {
        let payload = outcome(Some(0), "RESULT", " \n").classify().unwrap();
        assert_eq!(payload, "RESULT");
    }

    #[test]
    fn test_failure_uses_stderr() {
        let failure = outcome(Some(2), "", "bad file").classify().unwrap_err();
        assert_eq!(failure.message, "bad file");
        assert_eq!(failure.exit_code, Some(2));
    }

    #[test]
    fn test_failure_without_stderr_names_exit_code() {
        let failure = outcome(Some(3), "partial", "").classify().unwrap_err();
        assert_eq!(failure.to_string(), "aid exited with code 3");
    }

    #[test]
    fn test_failure_keeps_whitespace_stderr() {
        let failure = outcome(Some(1), "", "\n").classify().unwrap_err();
        assert_eq!(failure.message, "\n");
        assert_eq!(failure.exit_code, Some(1));
    }

    #[test]
    fn test_signal_is_failure() {
        let failure = outcome(None, "", "").classify().unwrap_err();
        assert_eq!(failure.exit_code, None);
        assert!(failure.message.contains("signal"));
    }

    #[test]
    fn test_empty_success_is_still_ok() {
        // The empty-output check belongs to the caller.
        let payload = outcome(Some(0), "", "").classify().unwrap();
        assert!(payload.is_empty());
    }
}
