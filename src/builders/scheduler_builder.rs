//! Builds a ready-to-use scheduler from configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::core::{
    EditResource, EditTask, JobDispatcher, MaintenanceHandle, OwnerId, OwnerNotifier, PoolError,
    TaskHandle, TaskRunner, WorkerPool,
};

/// Dispatcher, worker pool and maintenance thread wired together.
pub struct EditScheduler {
    dispatcher: Arc<JobDispatcher>,
    pool: WorkerPool,
    maintenance: Option<MaintenanceHandle>,
}

impl EditScheduler {
    /// Shared dispatcher.
    pub const fn dispatcher(&self) -> &Arc<JobDispatcher> {
        &self.dispatcher
    }

    /// Worker pool.
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Create a job for `command`, linked to `resource` for cancellation, and
    /// queue it on the worker pool.
    ///
    /// # Errors
    ///
    /// Propagates the pool's submission errors.
    pub fn submit<T>(
        &self,
        task: T,
        resource: Arc<dyn EditResource>,
        owner: OwnerId,
        command: &str,
    ) -> Result<TaskHandle, PoolError>
    where
        T: EditTask + 'static,
    {
        let job = self
            .dispatcher
            .create_cancelable_job(owner, command, &resource);
        let runner = TaskRunner::new(
            task,
            resource,
            owner,
            command,
            Arc::clone(&self.dispatcher),
            job,
        );
        self.pool.submit(runner)
    }

    /// Stop maintenance and shut the pool down.
    pub fn shutdown(mut self) {
        if let Some(maintenance) = self.maintenance.take() {
            maintenance.shutdown();
        }
        self.pool.shutdown();
    }
}

/// Build an [`EditScheduler`] from configuration.
///
/// # Errors
///
/// `PoolError::InvalidConfig` when the configuration fails validation and
/// `PoolError::Internal` when a thread cannot be spawned.
pub fn build_scheduler(
    cfg: &SchedulerConfig,
    notifier: Arc<dyn OwnerNotifier>,
) -> Result<EditScheduler, PoolError> {
    cfg.validate().map_err(PoolError::InvalidConfig)?;

    let dispatcher = Arc::new(JobDispatcher::new(cfg.dispatcher.clone(), notifier));
    let pool = WorkerPool::new(cfg.workers.clone())?;
    let maintenance = dispatcher
        .spawn_maintenance(Duration::from_millis(cfg.dispatcher.maintenance_interval_ms))
        .map_err(|e| PoolError::Internal(format!("failed to spawn maintenance thread: {e}")))?;

    Ok(EditScheduler {
        dispatcher,
        pool,
        maintenance: Some(maintenance),
    })
}
