//! Process Execution
//!
//! Runs the external `aid` binary and classifies what it produced.

#![warn(missing_docs)]

pub mod r#trait;
pub mod aid;

pub use r#trait::{ExecError, ExecutionOutcome, Executor, ToolFailure};
pub use aid::AidExecutor;
