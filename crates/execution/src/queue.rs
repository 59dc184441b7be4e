//! Strict FIFO execution queue.
//!
//! All submissions go through a channel to one worker task. The worker owns
//! the job list and the process slot: it runs one job, settles it, and only
//! then looks at the next one.

use aidmcp_core::ArgumentVector;
use aidmcp_tools::Executor;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::job::{JobError, JobId, JobRecord};

/// Queue configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueConfig {
    /// Deadline applied to jobs submitted without one; `None` waits forever
    pub default_deadline: Option<Duration>,
}

impl QueueConfig {
    /// Create a configuration without deadlines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default per-job deadline.
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }
}

/// Queue-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueState {
    /// Nothing queued or running
    #[default]
    Idle,
    /// Working through queued jobs
    Draining,
}

/// Snapshot published by the worker after every transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Queue-level state
    pub state: QueueState,
    /// Job currently owning the process slot
    pub current: Option<JobId>,
    /// Jobs taken off the channel so far
    pub accepted: u64,
    /// Jobs settled with a payload
    pub succeeded: u64,
    /// Jobs settled with an error
    pub failed: u64,
    /// Most recently settled job
    pub last_settled: Option<JobRecord>,
}

impl QueueStatus {
    /// Jobs settled so far.
    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed
    }
}

struct QueuedJob {
    id: JobId,
    argv: ArgumentVector,
    deadline: Option<Duration>,
    reply: oneshot::Sender<Result<String, JobError>>,
    queued_at: chrono::DateTime<chrono::Utc>,
}

/// Pending result of a queued job.
///
/// The job's position is fixed when the handle is created; awaiting it only
/// waits for settlement.
pub struct JobHandle {
    id: JobId,
    reply: oneshot::Receiver<Result<String, JobError>>,
}

impl JobHandle {
    /// ID of the queued job.
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

impl Future for JobHandle {
    type Output = Result<String, JobError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.reply)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(JobError::QueueClosed)))
    }
}

/// Handle to the execution queue. Cheap to clone.
///
/// The worker stops once every handle is dropped and the jobs already
/// queued have settled.
#[derive(Clone)]
pub struct ExecutionQueue {
    jobs: mpsc::UnboundedSender<QueuedJob>,
    status: watch::Receiver<QueueStatus>,
    default_deadline: Option<Duration>,
}

impl ExecutionQueue {
    /// Start a queue without deadlines.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(executor: Arc<dyn Executor>) -> Self {
        Self::with_config(executor, QueueConfig::default())
    }

    /// Start a queue with custom configuration.
    pub fn with_config(executor: Arc<dyn Executor>, config: QueueConfig) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(QueueStatus::default());

        let worker = Worker {
            executor,
            jobs: receiver,
            status: status_tx,
            snapshot: QueueStatus::default(),
        };
        tokio::spawn(worker.run());

        Self {
            jobs,
            status,
            default_deadline: config.default_deadline,
        }
    }

    /// Append a job to the tail of the queue.
    pub fn enqueue(&self, argv: ArgumentVector) -> Result<JobHandle, JobError> {
        self.enqueue_with(argv, self.default_deadline)
    }

    /// Append a job that fails with [`JobError::Timeout`] if it runs longer than `deadline`.
    pub fn enqueue_with_deadline(
        &self,
        argv: ArgumentVector,
        deadline: Duration,
    ) -> Result<JobHandle, JobError> {
        self.enqueue_with(argv, Some(deadline))
    }

    /// Queue a job and wait for its result.
    pub async fn submit(&self, argv: ArgumentVector) -> Result<String, JobError> {
        self.enqueue(argv)?.await
    }

    /// Queue a job with a deadline and wait for its result.
    pub async fn submit_with_deadline(
        &self,
        argv: ArgumentVector,
        deadline: Duration,
    ) -> Result<String, JobError> {
        self.enqueue_with_deadline(argv, deadline)?.await
    }

    /// Latest published status.
    pub fn status(&self) -> QueueStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<QueueStatus> {
        self.status.clone()
    }

    fn enqueue_with(
        &self,
        argv: ArgumentVector,
        deadline: Option<Duration>,
    ) -> Result<JobHandle, JobError> {
        let (reply, receiver) = oneshot::channel();
        let id = JobId::new();

        debug!(job_id = %id, args = %argv, "Job queued");

        self.jobs
            .send(QueuedJob {
                id: id.clone(),
                argv,
                deadline,
                reply,
                queued_at: chrono::Utc::now(),
            })
            .map_err(|_| JobError::QueueClosed)?;

        Ok(JobHandle {
            id,
            reply: receiver,
        })
    }
}

struct Worker {
    executor: Arc<dyn Executor>,
    jobs: mpsc::UnboundedReceiver<QueuedJob>,
    status: watch::Sender<QueueStatus>,
    snapshot: QueueStatus,
}

impl Worker {
    async fn run(mut self) {
        debug!("Execution queue worker started");

        let mut next = self.jobs.recv().await;
        while let Some(job) = next {
            self.process(job).await;

            next = match self.jobs.try_recv() {
                Ok(job) => Some(job),
                Err(TryRecvError::Empty) => {
                    self.snapshot.state = QueueState::Idle;
                    self.publish();
                    self.jobs.recv().await
                }
                Err(TryRecvError::Disconnected) => None,
            };
        }

        self.snapshot.state = QueueState::Idle;
        self.publish();
        info!(
            succeeded = self.snapshot.succeeded,
            failed = self.snapshot.failed,
            "Execution queue closed"
        );
    }

    async fn process(&mut self, job: QueuedJob) {
        let QueuedJob {
            id,
            argv,
            deadline,
            reply,
            queued_at,
        } = job;

        let mut record = JobRecord::pending(id, queued_at);
        record.start();

        self.snapshot.state = QueueState::Draining;
        self.snapshot.accepted += 1;
        self.snapshot.current = Some(record.id.clone());
        self.publish();

        debug!(job_id = %record.id, deadline = ?deadline, "Job running");

        let result = self.run_guarded(&argv, deadline).await;

        // Terminal transition and reply happen on every path.
        record.settle(result.is_ok());
        match &result {
            Ok(payload) => {
                self.snapshot.succeeded += 1;
                debug!(job_id = %record.id, bytes = payload.len(), "Job succeeded");
            }
            Err(e) => {
                self.snapshot.failed += 1;
                warn!(job_id = %record.id, error = %e, "Job failed");
            }
        }

        let id = record.id.clone();
        self.snapshot.current = None;
        self.snapshot.last_settled = Some(record);
        self.publish();

        if reply.send(result).is_err() {
            debug!(job_id = %id, "Caller went away before settlement");
        }
    }

    async fn run_guarded(
        &self,
        argv: &ArgumentVector,
        deadline: Option<Duration>,
    ) -> Result<String, JobError> {
        let attempt = async {
            let outcome = self.executor.execute(argv).await?;
            Ok::<_, JobError>(outcome.classify()?)
        };
        let guarded = AssertUnwindSafe(attempt).catch_unwind();

        let settled = match deadline {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(settled) => settled,
                Err(_) => return Err(JobError::Timeout(limit)),
            },
            None => guarded.await,
        };

        settled.unwrap_or_else(|panic| Err(JobError::Aborted(panic_message(panic.as_ref()))))
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot.clone());
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "executor panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidmcp_tools::{ExecError, ExecutionOutcome};
    use async_trait::async_trait;
    use futures::stream::{FuturesUnordered, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Scripted executor: `argv[0]` is the job label, `argv[1]` its
    /// latency in milliseconds, `argv[2]` (optional) a behaviour.
    #[derive(Default)]
    struct ScriptedExecutor {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        spans: Mutex<Vec<(String, Instant, Instant)>>,
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn execute(&self, argv: &ArgumentVector) -> Result<ExecutionOutcome, ExecError> {
            let args = argv.as_slice();
            let label = args[0].clone();
            let latency: u64 = args[1].parse().unwrap();
            let behaviour = args.get(2).map(String::as_str);

            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            let started = Instant::now();

            tokio::time::sleep(Duration::from_millis(latency)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.spans
                .lock()
                .unwrap()
                .push((label.clone(), started, Instant::now()));

            match behaviour {
                Some("panic") => panic!("scripted panic in {}", label),
                Some("spawn") => Err(ExecError::Spawn {
                    binary: "aid".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
                Some("fail") => Ok(ExecutionOutcome {
                    exit_code: Some(2),
                    stdout: String::new(),
                    stderr: format!("{} failed", label),
                    duration: Duration::from_millis(latency),
                }),
                _ => Ok(ExecutionOutcome {
                    exit_code: Some(0),
                    stdout: label,
                    stderr: String::new(),
                    duration: Duration::from_millis(latency),
                }),
            }
        }
    }

    fn job(label: &str, latency_ms: u64, behaviour: Option<&str>) -> ArgumentVector {
        let mut args = vec![label.to_string(), latency_ms.to_string()];
        if let Some(b) = behaviour {
            args.push(b.to_string());
        }
        ArgumentVector::from(args)
    }

    /// Small deterministic generator for varied latencies.
    fn latencies(seed: u64, n: usize) -> Vec<u64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                1 + (state >> 33) % 50
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_matches_submission_order() {
        for (seed, n) in [(7, 1), (11, 5), (42, 25)] {
            let executor = Arc::new(ScriptedExecutor::default());
            let queue = ExecutionQueue::start(executor.clone());

            let mut pending = FuturesUnordered::new();
            for (i, latency) in latencies(seed, n).into_iter().enumerate() {
                let handle = queue.enqueue(job(&format!("job-{}", i), latency, None)).unwrap();
                pending.push(async move { (i, handle.await) });
            }

            let mut completed = Vec::new();
            while let Some((i, result)) = pending.next().await {
                assert_eq!(result.unwrap(), format!("job-{}", i));
                completed.push(i);
            }

            assert_eq!(completed, (0..n).collect::<Vec<_>>());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_job_running() {
        let executor = Arc::new(ScriptedExecutor::default());
        let queue = ExecutionQueue::start(executor.clone());

        let handles: Vec<_> = latencies(3, 30)
            .into_iter()
            .enumerate()
            .map(|(i, latency)| queue.enqueue(job(&format!("j{}", i), latency, None)).unwrap())
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(executor.max_in_flight.load(Ordering::SeqCst), 1);

        let spans = executor.spans.lock().unwrap();
        assert_eq!(spans.len(), 30);
        for pair in spans.windows(2) {
            // Each job starts no earlier than the previous one finished.
            assert!(pair[1].1 >= pair[0].2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stall_queue() {
        let executor = Arc::new(ScriptedExecutor::default());
        let queue = ExecutionQueue::start(executor.clone());

        let a = queue.enqueue(job("A", 5, Some("fail"))).unwrap();
        let b = queue.enqueue(job("B", 5, None)).unwrap();

        let labelled = |label: &'static str, handle: JobHandle| async move { (label, handle.await) };
        let mut pending = FuturesUnordered::new();
        pending.push(labelled("A", a));
        pending.push(labelled("B", b));

        let (first, first_result) = pending.next().await.unwrap();
        assert_eq!(first, "A");
        match first_result {
            Err(JobError::Tool(failure)) => assert_eq!(failure.message, "A failed"),
            other => panic!("expected tool failure, got {:?}", other),
        }

        let (second, second_result) = pending.next().await.unwrap();
        assert_eq!(second, "B");
        assert_eq!(second_result.unwrap(), "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_failure_rejects_only_its_job() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));

        let first = queue.enqueue(job("missing", 1, Some("spawn"))).unwrap();
        let second = queue.enqueue(job("ok", 1, None)).unwrap();

        let err = first.await.unwrap_err();
        assert!(err.is_spawn_failure());
        assert_eq!(second.await.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_executor_is_contained() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));

        let first = queue.enqueue(job("boom", 1, Some("panic"))).unwrap();
        let second = queue.enqueue(job("after", 1, None)).unwrap();

        match first.await {
            Err(JobError::Aborted(message)) => assert!(message.contains("scripted panic in boom")),
            other => panic!("expected aborted job, got {:?}", other),
        }
        assert_eq!(second.await.unwrap(), "after");
        assert_eq!(queue.status().failed, 1);
        assert_eq!(queue.status().succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires_and_queue_continues() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));

        let slow = queue
            .enqueue_with_deadline(job("slow", 10_000, None), Duration::from_secs(1))
            .unwrap();
        let fast = queue.enqueue(job("fast", 1, None)).unwrap();

        match slow.await {
            Err(JobError::Timeout(limit)) => assert_eq!(limit, Duration::from_secs(1)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(fast.await.unwrap(), "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_from_config() {
        let queue = ExecutionQueue::with_config(
            Arc::new(ScriptedExecutor::default()),
            QueueConfig::new().with_default_deadline(Duration::from_millis(100)),
        );

        let err = queue.submit(job("slow", 5_000, None)).await.unwrap_err();
        assert_eq!(err.code(), crate::error_codes::JOB_TIMEOUT);
        assert_eq!(queue.submit(job("quick", 10, None)).await.unwrap(), "quick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_deadline_waits_for_slow_jobs() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));
        let result = queue.submit(job("glacial", 600_000, None)).await;
        assert_eq!(result.unwrap(), "glacial");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_queue_still_settles_queued_jobs() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));
        let handles: Vec<_> = (0..3)
            .map(|i| queue.enqueue(job(&format!("j{}", i), 5, None)).unwrap())
            .collect();
        drop(queue);

        let results = futures::future::join_all(handles).await;
        let payloads: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(payloads, vec!["j0", "j1", "j2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_transitions() {
        let queue = ExecutionQueue::start(Arc::new(ScriptedExecutor::default()));
        let mut status = queue.subscribe();
        assert_eq!(queue.status().state, QueueState::Idle);

        let handle = queue.enqueue(job("watched", 20, None)).unwrap();
        let id = handle.id().clone();

        status
            .wait_for(|s| s.state == QueueState::Draining && s.current.as_ref() == Some(&id))
            .await
            .unwrap();

        handle.await.unwrap();
        let settled = status.wait_for(|s| s.state == QueueState::Idle).await.unwrap().clone();

        assert_eq!(settled.accepted, 1);
        assert_eq!(settled.settled(), 1);
        assert!(settled.current.is_none());
        let record = settled.last_settled.unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.status, crate::JobStatus::Succeeded);
    }
}
