//! Bridges job state changes from worker threads into a per-owner event stream.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::core::{JobId, JobListener, JobRecord, JobStatus, OwnerId};

/// Snapshot of a job taken at notification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    /// Job identifier.
    pub job_id: JobId,
    /// Job owner.
    pub owner: OwnerId,
    /// Status at the moment of the change.
    pub status: JobStatus,
    /// Whether the driving task had finished.
    pub task_done: bool,
}

impl JobEvent {
    /// Capture the current state of `job`.
    pub fn capture(job: &JobRecord) -> Self {
        Self {
            job_id: job.id(),
            owner: job.owner(),
            status: job.status(),
            task_done: job.is_task_done(),
        }
    }
}

/// Listener that forwards every change as a [`JobEvent`] over a channel.
///
/// Register the same listener on several jobs to get one merged stream, e.g.
/// all jobs of an owner. Sends never block; events are dropped once the
/// receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<JobEvent>,
    owner: Option<OwnerId>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its stream.
    #[must_use]
    pub fn channel() -> (Arc<Self>, Receiver<JobEvent>) {
        let (tx, rx) = unbounded();
        (Arc::new(Self { tx, owner: None }), rx)
    }

    /// Like [`channel`](Self::channel), but only forwards jobs of `owner`.
    #[must_use]
    pub fn for_owner(owner: OwnerId) -> (Arc<Self>, Receiver<JobEvent>) {
        let (tx, rx) = unbounded();
        (Arc::new(Self { tx, owner: Some(owner) }), rx)
    }
}

impl JobListener for ChannelListener {
    fn job_state_changed(&self, job: &JobRecord) {
        if self.owner.is_some_and(|owner| owner != job.owner()) {
            return;
        }
        if self.tx.send(JobEvent::capture(job)).is_err() {
            tracing::trace!(job_id = job.id(), "event receiver dropped");
        }
    }
}
