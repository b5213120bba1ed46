//! Capability interface for the mutable resource an edit job works against.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{JobId, JobRecord};

/// A resource handle under edit.
///
/// Handles lacking a capability keep the default no-op implementation, so the
/// task runner can drive every handle through the same calls. All methods must
/// tolerate concurrent use from several runners.
pub trait EditResource: Send + Sync {
    /// Whether changes are buffered until [`flush_queue`](Self::flush_queue).
    fn is_queueing_enabled(&self) -> bool {
        false
    }

    /// Drain buffered changes into the resource. May block.
    fn flush_queue(&self) {}

    /// Reset async bookkeeping when queueing is disabled. Idempotent.
    fn reset_async(&self) {}

    /// Whether cancellation was requested.
    fn is_canceled(&self) -> bool {
        false
    }

    /// Request cancellation.
    fn cancel(&self) {}

    /// Register a job as active against this resource. Idempotent.
    fn add_async(&self, _job: &Arc<JobRecord>) {}

    /// Deregister a job. Removing an unknown job is a no-op.
    fn remove_async(&self, _job: &JobRecord) {}
}

/// A resource handle with no queueing, cancellation or job tracking.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainResource;

impl EditResource for PlainResource {}

/// Registry of jobs currently active against a resource.
#[derive(Debug, Default)]
pub struct ActiveJobs {
    jobs: Mutex<HashMap<JobId, Arc<JobRecord>>>,
}

impl ActiveJobs {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job`; returns `false` if it was already present.
    pub fn add(&self, job: &Arc<JobRecord>) -> bool {
        self.jobs.lock().insert(job.id(), Arc::clone(job)).is_none()
    }

    /// Deregister `job`; returns `false` if it was not present.
    pub fn remove(&self, job: &JobRecord) -> bool {
        self.jobs.lock().remove(&job.id()).is_some()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.lock().contains_key(&id)
    }

    /// Number of active jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether no job is active.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Point-in-time copy of the active jobs.
    pub fn snapshot(&self) -> Vec<Arc<JobRecord>> {
        self.jobs.lock().values().cloned().collect()
    }
}
