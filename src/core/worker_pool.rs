//! Worker pool running task runners on dedicated OS threads.
//!
//! Edit work blocks for arbitrary durations, so every runner executes on a
//! worker thread owned by the pool instead of on the caller's thread. The
//! caller gets a [`TaskHandle`] for the job's record and final outcome.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_edit_scheduler::config::WorkerPoolConfig;
//! use async_edit_scheduler::core::{TaskRunner, WorkerPool};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(4))?;
//! let handle = pool.submit(TaskRunner::new(task, session, owner, "//set", dispatcher, job))?;
//! let outcome = handle.wait_timeout(Duration::from_secs(60))??;
//! ```

mod native;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::core::{EditError, JobId, JobRecord, PoolError, TaskOutcome};

pub use native::WorkerPool;

/// Final result of a runner as delivered to its [`TaskHandle`].
pub type RunResult = Result<TaskOutcome, EditError>;

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Runners currently executing.
    pub active_tasks: u64,
    /// Runners waiting for a worker.
    pub queued_tasks: u64,
    /// Runners that finished without an unclassified error.
    pub completed_tasks: u64,
    /// Runners that returned an unclassified error.
    pub failed_tasks: u64,
    /// Runners accepted by the pool.
    pub submitted_tasks: u64,
    /// Runners retired without running (queue full or shutdown).
    pub abandoned_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub abandoned_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            abandoned_tasks: self.abandoned_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A runner packaged for a worker thread.
///
/// `run(true)` executes the runner and reports whether it succeeded;
/// `run(false)` retires it without executing.
pub(crate) struct WorkItem {
    pub job_id: JobId,
    pub run: Box<dyn FnOnce(bool) -> bool + Send>,
}

/// Caller's view of a submitted runner.
#[derive(Debug)]
pub struct TaskHandle {
    job: Arc<JobRecord>,
    rx: Receiver<RunResult>,
}

impl TaskHandle {
    pub(crate) const fn new(job: Arc<JobRecord>, rx: Receiver<RunResult>) -> Self {
        Self { job, rx }
    }

    /// The job record, for status queries, listeners or cancellation.
    pub const fn job(&self) -> &Arc<JobRecord> {
        &self.job
    }

    /// Block until the runner finishes.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolShutdown` if the runner was retired without running.
    pub fn wait(self) -> Result<RunResult, PoolError> {
        self.rx.recv().map_err(|_| PoolError::PoolShutdown)
    }

    /// Block until the runner finishes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// `PoolError::Timeout` on timeout, `PoolError::PoolShutdown` if the runner
    /// was retired without running.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<RunResult, PoolError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PoolError::Timeout,
            RecvTimeoutError::Disconnected => PoolError::PoolShutdown,
        })
    }

    /// Non-blocking check for the result.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolShutdown` if the runner was retired without running.
    pub fn try_result(&self) -> Result<Option<RunResult>, PoolError> {
        match self.rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(PoolError::PoolShutdown),
        }
    }
}
