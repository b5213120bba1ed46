//! Tokio runtime adapter.
//!
//! Runs task runners on tokio's blocking pool and the dispatcher maintenance
//! pass on a tokio interval, for hosts that already live inside tokio.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::{EditTask, JobDispatcher, RunResult, TaskRunner};

/// Tokio-based spawner for runners and maintenance.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Create a spawner for the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Run `runner` on the blocking thread pool.
    ///
    /// The join handle resolves to the runner's result; a join error means
    /// the blocking task was aborted by runtime shutdown.
    pub fn spawn_runner<T>(&self, runner: TaskRunner<T>) -> JoinHandle<RunResult>
    where
        T: EditTask + 'static,
    {
        self.handle.spawn_blocking(move || runner.run())
    }

    /// Run the dispatcher maintenance pass every `interval` until the returned
    /// handle is aborted.
    pub fn spawn_maintenance(
        &self,
        dispatcher: Arc<JobDispatcher>,
        interval: Duration,
    ) -> JoinHandle<()> {
        self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                dispatcher.run_maintenance();
            }
        })
    }
}
