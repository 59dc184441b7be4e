//! Execution layer - serialized scheduling of external tool invocations.

#![warn(missing_docs)]

pub mod job;
pub mod queue;

pub use job::{error_codes, JobError, JobId, JobRecord, JobStatus};
pub use queue::{ExecutionQueue, JobHandle, QueueConfig, QueueState, QueueStatus};
