//! Owner-facing progress and status messages.

use crate::core::{JobRecord, OwnerId};

/// Delivers plain-text status lines to a job owner.
pub trait OwnerNotifier: Send + Sync {
    /// Send `message` to `owner`.
    fn say(&self, owner: OwnerId, message: &str);
}

/// Notifier that writes owner messages to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl OwnerNotifier for TracingNotifier {
    fn say(&self, owner: OwnerId, message: &str) {
        tracing::info!(owner = %owner, "{message}");
    }
}

/// Message texts shared by the runner and the dispatcher.
pub mod messages {
    use super::JobRecord;

    /// Shown when a work body exceeds the resource's change limit.
    pub const CHANGE_LIMIT: &str = "Maximum change limit reached.";

    /// Shown when a job stops because its resource was canceled.
    pub const CANCELED: &str = "Job canceled.";

    /// Announces that a command started running off-thread.
    #[must_use]
    pub fn started(command: &str) -> String {
        format!("Running {command} in full async mode.")
    }

    /// Progress line for a job advance.
    #[must_use]
    pub fn progress(job: &JobRecord) -> String {
        format!("Job {job} - {}", job.status_label())
    }

    /// Completion line for a job whose task finished normally.
    #[must_use]
    pub fn finished(job: &JobRecord) -> String {
        format!("Job {job} finished.")
    }
}
