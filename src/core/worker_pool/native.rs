//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on the channel; callers block on a
//!   per-runner result channel
//! - **Lock-free counters**: statistics are plain atomics
//! - **Clean shutdown**: dropping the sender unblocks workers naturally; runners
//!   still queued at shutdown are retired instead of silently dropped

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::{EditTask, PoolError, TaskRunner};

use super::{PoolCounters, PoolStats, TaskHandle, WorkItem};

/// Worker pool with dedicated OS threads for blocking edit work.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Work sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<WorkItem>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: Arc<AtomicBool>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a new worker pool, spawning `config.worker_count` OS threads.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid and
    /// `PoolError::Internal` if a worker thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<WorkItem>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                task_rx.clone(),
                Arc::clone(&counters),
                Arc::clone(&shutdown),
                config.thread_stack_size,
            )
            .map_err(|e| PoolError::Internal(format!("failed to spawn worker {worker_id}: {e}")))?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Queue `runner` for execution on a worker thread.
    ///
    /// A rejected runner is retired on the spot: its job is deregistered from
    /// the resource and the dispatcher and marked done.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the queue is full
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn submit<T>(&self, runner: TaskRunner<T>) -> Result<TaskHandle, PoolError>
    where
        T: EditTask + 'static,
    {
        let job = Arc::clone(runner.job());
        let job_id = job.id();
        let (result_tx, result_rx) = bounded(1);

        let item = WorkItem {
            job_id,
            run: Box::new(move |execute: bool| {
                if !execute {
                    runner.abandon();
                    return false;
                }
                let result = runner.run();
                let ok = result.is_ok();
                // The caller may have dropped its handle.
                let _ = result_tx.send(result);
                ok
            }),
        };

        if self.shutdown.load(Ordering::Acquire) {
            (item.run)(false);
            self.counters.abandoned_tasks.fetch_add(1, Ordering::Relaxed);
            return Err(PoolError::PoolShutdown);
        }

        let task_tx_guard = self.task_tx.lock();
        let Some(task_tx) = task_tx_guard.as_ref() else {
            drop(task_tx_guard);
            (item.run)(false);
            self.counters.abandoned_tasks.fetch_add(1, Ordering::Relaxed);
            return Err(PoolError::PoolShutdown);
        };

        // Count before sending so a fast worker never sees a zero queue.
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        match task_tx.try_send(item) {
            Ok(()) => {
                self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(job_id = job_id, "runner submitted to worker pool");
                Ok(TaskHandle::new(job, result_rx))
            }
            Err(TrySendError::Full(item)) => {
                drop(task_tx_guard);
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                (item.run)(false);
                self.counters.abandoned_tasks.fetch_add(1, Ordering::Relaxed);
                warn!(job_id = job_id, "worker pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err(TrySendError::Disconnected(item)) => {
                drop(task_tx_guard);
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                (item.run)(false);
                self.counters.abandoned_tasks.fetch_add(1, Ordering::Relaxed);
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Pool configuration.
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Shut down the pool gracefully with timeout.
    ///
    /// Runners already executing finish normally; runners still queued are
    /// retired. Workers that don't exit within 2 seconds are detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
        }

        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            // Join on a helper thread so a stuck work body cannot hang shutdown.
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }

            let _ = join_thread.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown but don't join workers in Drop; explicit shutdown()
        // is required for graceful cleanup.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    task_rx: Receiver<WorkItem>,
    counters: Arc<PoolCounters>,
    shutdown: Arc<AtomicBool>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("edit-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // recv() keeps returning queued items after the sender is dropped
            // and errors only once the channel is empty.
            while let Ok(item) = task_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);

                if shutdown.load(Ordering::Acquire) {
                    debug!(worker_id = worker_id, job_id = item.job_id, "retiring queued runner");
                    (item.run)(false);
                    counters.abandoned_tasks.fetch_add(1, Ordering::Relaxed);
                    continue;
                }

                counters.active_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(worker_id = worker_id, job_id = item.job_id, "Worker executing runner");

                let run = item.run;
                let ok = catch_unwind(AssertUnwindSafe(move || run(true))).unwrap_or_else(|_| {
                    error!(
                        worker_id = worker_id,
                        job_id = item.job_id,
                        "runner panicked outside its task"
                    );
                    false
                });

                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
                if ok {
                    counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                } else {
                    error!(worker_id = worker_id, job_id = item.job_id, "runner failed");
                    counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}
