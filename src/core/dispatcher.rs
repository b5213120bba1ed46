//! Per-owner job tracking and the periodic maintenance pass.
//!
//! The dispatcher never runs edit work itself. It keeps the set of in-flight
//! [`JobRecord`]s for each owner, lets callers look them up or cancel them, and
//! periodically advances every tracked job one step so that each job reaches
//! `Done` and is reaped even if its runner never reports back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::core::notifier::messages;
use crate::core::{EditResource, JobId, JobRecord, JobStatus, OwnerId, OwnerNotifier};

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Jobs moved to `PlacingBlocks`.
    pub advanced: usize,
    /// Jobs removed from tracking.
    pub retired: usize,
}

/// Tracks in-flight jobs per owner.
///
/// Two sets are kept. The progress set holds jobs the maintenance pass
/// advances and reaps. The running set holds every job whose runner has not
/// torn down yet, so lookup and cancellation keep working after the
/// maintenance pass has retired a job whose work body is still going.
pub struct JobDispatcher {
    config: DispatcherConfig,
    notifier: Arc<dyn OwnerNotifier>,
    jobs: RwLock<HashMap<OwnerId, Vec<Arc<JobRecord>>>>,
    running: RwLock<HashMap<JobId, Arc<JobRecord>>>,
    next_id: AtomicU64,
}

impl JobDispatcher {
    /// Create a dispatcher reporting to `notifier`.
    pub fn new(config: DispatcherConfig, notifier: Arc<dyn OwnerNotifier>) -> Self {
        Self {
            config,
            notifier,
            jobs: RwLock::new(HashMap::new()),
            running: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Dispatcher configuration.
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Whether progress messages go to owners.
    pub const fn is_talkative(&self) -> bool {
        self.config.talkative
    }

    /// Owner-facing message sink.
    pub fn notifier(&self) -> &Arc<dyn OwnerNotifier> {
        &self.notifier
    }

    /// Send `message` to `owner` when talkative mode is on.
    pub fn say_talkative(&self, owner: OwnerId, message: &str) {
        if self.config.talkative {
            self.notifier.say(owner, message);
        }
    }

    /// Allocate the next job identifier.
    pub fn next_job_id(&self) -> JobId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a record with a fresh id. The record is not tracked until
    /// [`add_tasks`](Self::add_tasks) is called for it.
    pub fn create_job(&self, owner: OwnerId, name: impl Into<String>) -> Arc<JobRecord> {
        Arc::new(JobRecord::new(owner, self.next_job_id(), name))
    }

    /// Create a record whose cancel requests are forwarded to `session`.
    pub fn create_cancelable_job(
        &self,
        owner: OwnerId,
        name: impl Into<String>,
        session: &Arc<dyn EditResource>,
    ) -> Arc<JobRecord> {
        Arc::new(JobRecord::with_session(owner, self.next_job_id(), name, session))
    }

    /// Track `job` for `owner`. Calling this again for a tracked job is a no-op.
    pub fn add_tasks(&self, owner: OwnerId, job: &Arc<JobRecord>) {
        let mut jobs = self.jobs.write();
        let owned = jobs.entry(owner).or_default();
        if owned.iter().any(|j| j.id() == job.id()) {
            return;
        }
        owned.push(Arc::clone(job));
        debug!(job_id = job.id(), owner = %owner, "job tracked");
    }

    /// Stop tracking `job`. Returns `false` if it was not tracked for `owner`.
    pub fn remove_job(&self, owner: OwnerId, job: &JobRecord) -> bool {
        let mut jobs = self.jobs.write();
        let Some(owned) = jobs.get_mut(&owner) else {
            return false;
        };
        let before = owned.len();
        owned.retain(|j| j.id() != job.id());
        let removed = owned.len() != before;
        if owned.is_empty() {
            jobs.remove(&owner);
        }
        if removed {
            debug!(job_id = job.id(), owner = %owner, "job retired");
        }
        removed
    }

    /// Jobs currently tracked for `owner`, in registration order.
    pub fn jobs_for(&self, owner: OwnerId) -> Vec<Arc<JobRecord>> {
        self.jobs.read().get(&owner).cloned().unwrap_or_default()
    }

    /// Look up a job of `owner` by id, in the progress set or among jobs
    /// whose runner is still active.
    pub fn find_job(&self, owner: OwnerId, id: JobId) -> Option<Arc<JobRecord>> {
        let tracked = self
            .jobs
            .read()
            .get(&owner)
            .and_then(|owned| owned.iter().find(|j| j.id() == id).cloned());
        tracked.or_else(|| {
            self.running
                .read()
                .get(&id)
                .filter(|j| j.owner() == owner)
                .cloned()
        })
    }

    /// Record that a runner owns `job` until it calls
    /// [`runner_finished`](Self::runner_finished).
    pub fn runner_started(&self, job: &Arc<JobRecord>) {
        self.running.write().insert(job.id(), Arc::clone(job));
    }

    /// Drop `job` from the running set. Unknown jobs are ignored.
    pub fn runner_finished(&self, job: &JobRecord) {
        self.running.write().remove(&job.id());
    }

    /// Number of jobs whose runner has not torn down yet.
    pub fn running_count(&self) -> usize {
        self.running.read().len()
    }

    /// Owners with at least one tracked job.
    pub fn owners(&self) -> Vec<OwnerId> {
        self.jobs.read().keys().copied().collect()
    }

    /// Total number of tracked jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.read().values().map(Vec::len).sum()
    }

    /// Forward a cancel request to one of `owner`'s jobs.
    ///
    /// Returns `false` if the job is unknown or has no live cancelable resource.
    pub fn cancel_job(&self, owner: OwnerId, id: JobId) -> bool {
        match self.find_job(owner, id) {
            Some(job) => job.cancel(),
            None => {
                warn!(job_id = id, owner = %owner, "cancel requested for unknown job");
                false
            }
        }
    }

    /// Cancel every job of `owner`, tracked or still running; returns how many
    /// accepted it.
    pub fn cancel_all(&self, owner: OwnerId) -> usize {
        let mut targets = self.jobs_for(owner);
        for job in self.running.read().values() {
            if job.owner() == owner && !targets.iter().any(|j| j.id() == job.id()) {
                targets.push(Arc::clone(job));
            }
        }
        targets.iter().filter(|job| job.cancel()).count()
    }

    /// Advance `job` by one maintenance step.
    ///
    /// `Done` jobs are removed; `PlacingBlocks` jobs are marked `Done` and
    /// removed; anything earlier moves to `PlacingBlocks`. The progress line
    /// goes out only when this step advanced or retired the job.
    pub fn process_job(&self, job: &JobRecord) -> MaintenanceReport {
        let owner = job.owner();
        let mut report = MaintenanceReport::default();

        let changed = match job.status() {
            JobStatus::Done => {
                if self.remove_job(owner, job) {
                    report.retired += 1;
                }
                return report;
            }
            JobStatus::PlacingBlocks => {
                job.set_status(JobStatus::Done);
                if !job.is_task_done() {
                    debug!(job_id = job.id(), "job retired before its task reported done");
                }
                // A concurrent pass may have retired it first.
                let removed = self.remove_job(owner, job);
                if removed {
                    report.retired += 1;
                }
                removed
            }
            JobStatus::Initializing | JobStatus::Preparing | JobStatus::Waiting => {
                let advanced = job.set_status(JobStatus::PlacingBlocks);
                if advanced {
                    report.advanced += 1;
                }
                advanced
            }
        };

        if changed {
            self.say_talkative(owner, &messages::progress(job));
        }
        report
    }

    /// Run one maintenance pass over a snapshot of all tracked jobs.
    pub fn run_maintenance(&self) -> MaintenanceReport {
        let snapshot: Vec<Arc<JobRecord>> = self.jobs.read().values().flatten().cloned().collect();

        let mut total = MaintenanceReport::default();
        for job in &snapshot {
            let step = self.process_job(job);
            total.advanced += step.advanced;
            total.retired += step.retired;
        }
        if total != MaintenanceReport::default() {
            debug!(
                advanced = total.advanced,
                retired = total.retired,
                "maintenance pass"
            );
        }
        total
    }

    /// Run the maintenance pass every `interval` on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        interval: Duration,
    ) -> std::io::Result<MaintenanceHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let dispatcher = Arc::clone(self);

        let handle = thread::Builder::new()
            .name("edit-maintenance".into())
            .spawn(move || {
                let ticker = tick(interval);
                info!(interval = ?interval, "maintenance thread started");
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            dispatcher.run_maintenance();
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
                info!("maintenance thread stopped");
            })?;

        Ok(MaintenanceHandle {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// Handle to a running maintenance thread; stops it on drop.
pub struct MaintenanceHandle {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Stop the maintenance thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the select.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("maintenance thread panicked");
            }
        }
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
