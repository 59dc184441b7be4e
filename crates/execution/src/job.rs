//! Jobs tracked by the execution queue.

use aidmcp_tools::{ExecError, ToolFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Job ID type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl JobId {
    /// Create a new job ID
    pub fn new() -> Self {
        Self(format!("job_{}", ulid::Ulid::new()))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting behind earlier jobs
    Pending,
    /// Owns the process slot
    Running,
    /// Settled with a payload
    Succeeded,
    /// Settled with an error
    Failed,
}

impl JobStatus {
    /// Whether the job has been settled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle timestamps of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Enqueued timestamp
    pub queued_at: chrono::DateTime<chrono::Utc>,
    /// Started timestamp (None while pending)
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Settled timestamp (None until terminal)
    pub settled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl JobRecord {
    pub(crate) fn pending(id: JobId, queued_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            queued_at,
            started_at: None,
            settled_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(chrono::Utc::now());
    }

    pub(crate) fn settle(&mut self, succeeded: bool) {
        self.status = if succeeded {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        self.settled_at = Some(chrono::Utc::now());
    }
}

/// Why a job was rejected.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The process could not be started or its output read
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The tool exited unsuccessfully
    #[error(transparent)]
    Tool(#[from] ToolFailure),

    /// The job's deadline passed; the process was killed
    #[error("aid did not finish within {0:?}")]
    Timeout(Duration),

    /// The executor panicked
    #[error("job aborted: {0}")]
    Aborted(String),

    /// The queue worker is gone
    #[error("execution queue is closed")]
    QueueClosed,
}

impl JobError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            JobError::Timeout(_) => error_codes::JOB_TIMEOUT,
            _ => error_codes::BUSINESS_ERROR,
        }
    }

    /// Whether the external binary could not be started at all.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, JobError::Exec(ExecError::Spawn { .. }))
    }
}

/// Error codes reported for failed jobs
pub mod error_codes {
    /// Generic business error
    pub const BUSINESS_ERROR: i32 = -32000;
    /// Job deadline exceeded
    pub const JOB_TIMEOUT: i32 = -32003;
}
