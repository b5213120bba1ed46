//! Error types for edit jobs and the worker pool.

use thiserror::Error;

/// Errors surfaced by an edit task's work body or post-run hook.
///
/// `ChangeLimitExceeded` and `Canceled` are recovered by the task runner and
/// reported to the job owner. Every other variant is unclassified and is
/// propagated to the host after teardown.
#[derive(Debug, Error)]
pub enum EditError {
    /// The work body attempted more changes than the resource permits.
    #[error("change limit exceeded: {limit}")]
    ChangeLimitExceeded {
        /// Configured maximum number of changes.
        limit: usize,
    },
    /// The resource was canceled while the work body was running.
    #[error("session canceled")]
    Canceled,
    /// The work body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// Any other failure from the work body.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EditError {
    /// Whether this failure is recovered locally by the task runner.
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        matches!(self, Self::ChangeLimitExceeded { .. } | Self::Canceled)
    }
}

/// Errors that can occur when submitting work to a `WorkerPool`.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The task queue is full; no more tasks can be accepted.
    #[error("task queue is full")]
    QueueFull,
    /// The pool has been shut down.
    #[error("pool has been shut down")]
    PoolShutdown,
    /// The caller's wait for a result timed out.
    #[error("operation timed out")]
    Timeout,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal error (worker thread spawn failure, channel closed, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
