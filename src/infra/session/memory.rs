//! In-memory edit session for development and testing.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{ActiveJobs, EditError, EditResource, JobRecord};

/// Edit session keeping changes in memory.
///
/// With queueing enabled, recorded changes stay pending until
/// [`flush_queue`](EditResource::flush_queue); otherwise they apply at once.
/// [`record_change`](Self::record_change) checks cancellation and the change
/// limit on every call, the way a real edit engine checks at fine granularity.
pub struct InMemoryEditSession<C> {
    queueing: AtomicBool,
    canceled: AtomicBool,
    change_limit: Option<usize>,
    change_count: AtomicUsize,
    pending: Mutex<Vec<C>>,
    applied: Mutex<Vec<C>>,
    flush_count: AtomicU64,
    reset_count: AtomicU64,
    active: ActiveJobs,
}

impl<C> InMemoryEditSession<C> {
    /// Create a session with queueing disabled and no change limit.
    pub fn new() -> Self {
        Self {
            queueing: AtomicBool::new(false),
            canceled: AtomicBool::new(false),
            change_limit: None,
            change_count: AtomicUsize::new(0),
            pending: Mutex::new(Vec::new()),
            applied: Mutex::new(Vec::new()),
            flush_count: AtomicU64::new(0),
            reset_count: AtomicU64::new(0),
            active: ActiveJobs::new(),
        }
    }

    /// Builder-style setter for queueing.
    #[must_use]
    pub fn with_queueing(self, enabled: bool) -> Self {
        self.queueing.store(enabled, Ordering::Release);
        self
    }

    /// Builder-style setter for the maximum number of changes.
    #[must_use]
    pub const fn with_change_limit(mut self, limit: usize) -> Self {
        self.change_limit = Some(limit);
        self
    }

    /// Toggle queueing at runtime.
    pub fn set_queueing(&self, enabled: bool) {
        self.queueing.store(enabled, Ordering::Release);
    }

    /// Record one change.
    ///
    /// # Errors
    ///
    /// `EditError::Canceled` once the session was canceled and
    /// `EditError::ChangeLimitExceeded` when the limit would be exceeded.
    pub fn record_change(&self, change: C) -> Result<(), EditError> {
        if self.canceled.load(Ordering::Acquire) {
            return Err(EditError::Canceled);
        }
        if let Some(limit) = self.change_limit {
            let reserved = self
                .change_count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1));
            if reserved.is_err() {
                return Err(EditError::ChangeLimitExceeded { limit });
            }
        } else {
            self.change_count.fetch_add(1, Ordering::AcqRel);
        }

        if self.queueing.load(Ordering::Acquire) {
            self.pending.lock().push(change);
        } else {
            self.applied.lock().push(change);
        }
        Ok(())
    }

    /// Changes accepted so far, applied or pending.
    pub fn change_count(&self) -> usize {
        self.change_count.load(Ordering::Acquire)
    }

    /// Number of changes waiting for a flush.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of applied changes.
    pub fn applied_len(&self) -> usize {
        self.applied.lock().len()
    }

    /// Copy of the applied changes.
    pub fn applied(&self) -> Vec<C>
    where
        C: Clone,
    {
        self.applied.lock().clone()
    }

    /// Times the queue was flushed.
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Acquire)
    }

    /// Times async bookkeeping was reset.
    pub fn reset_count(&self) -> u64 {
        self.reset_count.load(Ordering::Acquire)
    }

    /// Jobs currently registered against this session.
    pub const fn active_jobs(&self) -> &ActiveJobs {
        &self.active
    }
}

impl<C> Default for InMemoryEditSession<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send> EditResource for InMemoryEditSession<C> {
    fn is_queueing_enabled(&self) -> bool {
        self.queueing.load(Ordering::Acquire)
    }

    fn flush_queue(&self) {
        let drained: Vec<C> = std::mem::take(&mut *self.pending.lock());
        let count = drained.len();
        self.applied.lock().extend(drained);
        self.flush_count.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(changes = count, "session queue flushed");
    }

    fn reset_async(&self) {
        let dropped = std::mem::take(&mut *self.pending.lock()).len();
        self.reset_count.fetch_add(1, Ordering::AcqRel);
        if dropped > 0 {
            tracing::warn!(changes = dropped, "pending changes dropped by async reset");
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        if !self.canceled.swap(true, Ordering::AcqRel) {
            tracing::info!(active_jobs = self.active.len(), "edit session canceled");
        }
    }

    fn add_async(&self, job: &Arc<JobRecord>) {
        self.active.add(job);
    }

    fn remove_async(&self, job: &JobRecord) {
        self.active.remove(job);
    }
}
