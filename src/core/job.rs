//! Job records and their monotonic status state machine.
//!
//! A [`JobRecord`] is created before any work begins and is then shared
//! (`Arc<JobRecord>`) between the task runner driving it, the dispatcher
//! tracking it and any resource it is registered with. Status only ever moves
//! forward; out-of-order updates from concurrent callers are dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::EditResource;

/// Job identifier, unique within the dispatcher that allocated it.
pub type JobId = u64;

/// Identity of the actor on whose behalf a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random owner identity.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a job, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Record created, runner not started.
    Initializing,
    /// Runner is computing the edit.
    Preparing,
    /// Work body finished; waiting for the dispatcher.
    Waiting,
    /// Dispatcher is applying the job.
    PlacingBlocks,
    /// Terminal.
    Done,
}

impl JobStatus {
    /// All statuses in rank order.
    pub const ALL: [Self; 5] = [
        Self::Initializing,
        Self::Preparing,
        Self::Waiting,
        Self::PlacingBlocks,
        Self::Done,
    ];

    /// Position in the total order.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Initializing => 0,
            Self::Preparing => 1,
            Self::Waiting => 2,
            Self::PlacingBlocks => 3,
            Self::Done => 4,
        }
    }

    /// Inverse of [`rank`](Self::rank).
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Initializing),
            1 => Some(Self::Preparing),
            2 => Some(Self::Waiting),
            3 => Some(Self::PlacingBlocks),
            4 => Some(Self::Done),
            _ => None,
        }
    }

    /// Resolve a requested transition: the result is `new` unless that would
    /// move backwards, in which case `current` is kept.
    #[must_use]
    pub const fn advance(current: Self, new: Self) -> Self {
        if new.rank() < current.rank() {
            current
        } else {
            new
        }
    }

    /// Human-readable label shown to owners.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Preparing => "preparing",
            Self::Waiting => "waiting",
            Self::PlacingBlocks => "placing blocks",
            Self::Done => "done",
        }
    }

    /// Label for a raw rank. Unknown ranks render as an empty string, meaning
    /// the status is not displayable yet.
    #[must_use]
    pub const fn label_for_rank(rank: u8) -> &'static str {
        match Self::from_rank(rank) {
            Some(status) => status.label(),
            None => "",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl PartialOrd for JobStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JobStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives a callback whenever a job's status changes or its task finishes.
///
/// Callbacks run synchronously on the thread that caused the change, with no
/// job lock held, so a listener may read the record or (un)register itself.
pub trait JobListener: Send + Sync {
    /// Called after a status change or after `task_done`.
    fn job_state_changed(&self, job: &JobRecord);
}

/// A schedulable unit of edit work.
pub struct JobRecord {
    id: JobId,
    owner: OwnerId,
    name: String,
    status: Mutex<JobStatus>,
    task_done: AtomicBool,
    session: Option<Weak<dyn EditResource>>,
    listeners: Mutex<Vec<Arc<dyn JobListener>>>,
}

impl JobRecord {
    /// Create a record with no cancelable resource attached.
    pub fn new(owner: OwnerId, id: JobId, name: impl Into<String>) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            status: Mutex::new(JobStatus::Initializing),
            task_done: AtomicBool::new(false),
            session: None,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Create a record whose [`cancel`](Self::cancel) is forwarded to `session`.
    ///
    /// Only a weak reference is kept; the record never owns the resource.
    pub fn with_session(
        owner: OwnerId,
        id: JobId,
        name: impl Into<String>,
        session: &Arc<dyn EditResource>,
    ) -> Self {
        Self {
            session: Some(Arc::downgrade(session)),
            ..Self::new(owner, id, name)
        }
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Owner identity.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        *self.status.lock()
    }

    /// Label of the current status.
    pub fn status_label(&self) -> &'static str {
        self.status().label()
    }

    /// Move to `new` unless it ranks below the current status.
    ///
    /// Returns `false` (and notifies nobody) when the update was rejected.
    pub fn set_status(&self, new: JobStatus) -> bool {
        {
            let mut status = self.status.lock();
            let next = JobStatus::advance(*status, new);
            if next != new {
                tracing::debug!(
                    job_id = self.id,
                    current = %*status,
                    requested = %new,
                    "rejected backward status transition"
                );
                return false;
            }
            *status = next;
        }
        self.notify_listeners();
        true
    }

    /// Whether the driving task has fully finished, post-processing included.
    pub fn is_task_done(&self) -> bool {
        self.task_done.load(Ordering::Acquire)
    }

    /// Mark the driving task finished. Listeners are notified on the first call
    /// only; later calls have no effect.
    pub fn task_done(&self) {
        if self.task_done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.notify_listeners();
    }

    /// Whether the status reached `Done` and the task reported completion.
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal() && self.is_task_done()
    }

    /// Forward a cancel request to the linked resource, if any.
    ///
    /// Returns `true` when a live resource received the request.
    pub fn cancel(&self) -> bool {
        match self.session.as_ref().and_then(Weak::upgrade) {
            Some(session) => {
                tracing::info!(job_id = self.id, owner = %self.owner, "cancel requested");
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a cancelable resource was linked at construction.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        self.session.is_some()
    }

    /// Register a listener. Adding the same listener twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn JobListener>) {
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener. Removing an absent listener is a no-op.
    pub fn remove_listener(&self, listener: &Arc<dyn JobListener>) {
        self.listeners.lock().retain(|l| !same_listener(l, listener));
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn notify_listeners(&self) {
        let snapshot = self.listeners.lock().clone();
        for listener in &snapshot {
            listener.job_state_changed(self);
        }
    }
}

fn same_listener(a: &Arc<dyn JobListener>, b: &Arc<dyn JobListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.name)
    }
}

impl fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRecord")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("status", &self.status())
            .field("task_done", &self.is_task_done())
            .field("cancelable", &self.is_cancelable())
            .finish_non_exhaustive()
    }
}
