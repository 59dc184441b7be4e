//! Process executor for the `aid` binary.

use super::r#trait::{ExecError, ExecutionOutcome, Executor};
use aidmcp_core::ArgumentVector;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, trace};

const CHUNK_SIZE: usize = 8 * 1024;

/// Spawns the external binary directly, without a shell.
#[derive(Debug, Clone)]
pub struct AidExecutor {
    binary: PathBuf,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl AidExecutor {
    /// Create an executor for a binary path or a name resolved via `PATH`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: None,
            env: HashMap::new(),
        }
    }

    /// Run the process in this directory instead of the current one.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn capture_error(&self, source: std::io::Error) -> ExecError {
        ExecError::Capture {
            binary: self.binary.clone(),
            source,
        }
    }
}

#[async_trait]
impl Executor for AidExecutor {
    async fn execute(&self, argv: &ArgumentVector) -> Result<ExecutionOutcome, ExecError> {
        let start = std::time::Instant::now();

        let mut cmd = Command::new(&self.binary);
        cmd.args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        debug!(binary = %self.binary.display(), args = %argv, "Spawning process");

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::try_join!(
            drain(stdout, "stdout"),
            drain(stderr, "stderr"),
            child.wait(),
        )
        .map_err(|e| self.capture_error(e))?;

        let outcome = ExecutionOutcome {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            duration: start.elapsed(),
        };

        debug!(
            exit_code = ?outcome.exit_code,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            elapsed_ms = outcome.duration.as_millis() as u64,
            "Process exited"
        );

        Ok(outcome)
    }
}

/// Read a pipe to EOF, chunk by chunk.
async fn drain<R>(reader: Option<R>, channel: &'static str) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut collected = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(collected);
    };

    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        trace!(channel, bytes = n, "Received chunk");
        collected.extend_from_slice(&chunk[..n]);
    }

    Ok(collected)
}
