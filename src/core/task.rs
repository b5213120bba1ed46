//! Task runner driving one unit of edit work off the caller's thread.
//!
//! A [`TaskRunner`] owns the caller's [`EditTask`] and the [`JobRecord`] it
//! reports through. [`TaskRunner::run`] walks the job through its lifecycle,
//! runs the work body, settles the resource queue and always finishes with the
//! same teardown: finalization hook, `task_done`, deregistration. Panics in
//! the work body, the queue settlement or the finalization hook are captured
//! and reported after teardown. A runner dropped before it ran retires its job
//! the same way [`TaskRunner::abandon`] does.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, info_span, warn};

use crate::core::notifier::messages;
use crate::core::{EditError, EditResource, JobDispatcher, JobRecord, JobStatus, OwnerId};

/// Caller-supplied work executed by a [`TaskRunner`].
pub trait EditTask: Send {
    /// Value handed from the work body to the post-run hook.
    type Output: Send;

    /// Compute and apply the edit. May block for a long time.
    ///
    /// # Errors
    ///
    /// `ChangeLimitExceeded` and `Canceled` are reported to the owner; any
    /// other error is propagated by [`TaskRunner::run`] after teardown.
    fn do_run(&mut self) -> Result<Self::Output, EditError>;

    /// Consume the work body's result. `None` when the work body was skipped
    /// because the resource was already canceled.
    ///
    /// # Errors
    ///
    /// Classified the same way as [`do_run`](Self::do_run).
    fn do_post_run(&mut self, result: Option<Self::Output>) -> Result<(), EditError>;

    /// Resource-specific finalization, run on every path before the job is
    /// marked done.
    fn post_process(&mut self) {}
}

/// How a runner finished when no unclassified error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Work body and post-run hook succeeded.
    Completed,
    /// Resource was canceled before the work body started.
    Skipped,
    /// Work body exceeded the resource's change limit.
    ChangeLimitExceeded,
    /// Work body observed cancellation.
    Canceled,
}

/// Classified result of the work body or post-run hook.
#[derive(Debug)]
pub enum WorkOutcome<T> {
    /// Work produced a value.
    Success(T),
    /// Work was not started.
    Skipped,
    /// Change limit hit.
    ChangeLimitExceeded,
    /// Cancellation observed.
    Canceled,
    /// Unclassified failure.
    Failure(EditError),
}

impl<T> From<Result<T, EditError>> for WorkOutcome<T> {
    fn from(result: Result<T, EditError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(EditError::ChangeLimitExceeded { .. }) => Self::ChangeLimitExceeded,
            Err(EditError::Canceled) => Self::Canceled,
            Err(other) => Self::Failure(other),
        }
    }
}

/// Drives one [`EditTask`] through the job lifecycle.
pub struct TaskRunner<T: EditTask> {
    task: T,
    resource: Arc<dyn EditResource>,
    owner: OwnerId,
    command: String,
    dispatcher: Arc<JobDispatcher>,
    job: Arc<JobRecord>,
    started: bool,
    released: bool,
}

impl<T: EditTask> TaskRunner<T> {
    /// Create a runner and register `job` with the resource's active jobs and
    /// the dispatcher's running set.
    pub fn new(
        task: T,
        resource: Arc<dyn EditResource>,
        owner: OwnerId,
        command: impl Into<String>,
        dispatcher: Arc<JobDispatcher>,
        job: Arc<JobRecord>,
    ) -> Self {
        resource.add_async(&job);
        dispatcher.runner_started(&job);
        Self {
            task,
            resource,
            owner,
            command: command.into(),
            dispatcher,
            job,
            started: false,
            released: false,
        }
    }

    /// The job this runner drives.
    pub const fn job(&self) -> &Arc<JobRecord> {
        &self.job
    }

    /// Command label.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Execute the full protocol on the current thread.
    ///
    /// # Errors
    ///
    /// Returns the first unclassified error (including a captured panic from
    /// the work body, queue settlement or finalization hook) after teardown
    /// has run.
    pub fn run(mut self) -> Result<TaskOutcome, EditError> {
        let span = info_span!("edit_task", job_id = self.job.id(), command = %self.command);
        let _guard = span.enter();
        self.started = true;

        self.job.set_status(JobStatus::Preparing);
        self.dispatcher
            .say_talkative(self.owner, &messages::started(&self.command));
        self.dispatcher.add_tasks(self.owner, &self.job);

        let work = if self.resource.is_canceled() {
            debug!("resource already canceled, skipping work body");
            WorkOutcome::Skipped
        } else {
            WorkOutcome::from(guarded(|| self.task.do_run()))
        };

        let settled = guarded(|| {
            self.settle_queue();
            Ok(())
        });
        let work = match (work, settled) {
            (failed @ WorkOutcome::Failure(_), _) => failed,
            (_, Err(err)) => WorkOutcome::Failure(err),
            (work, Ok(())) => work,
        };

        let outcome = match work {
            WorkOutcome::Success(value) => self.post_run(Some(value), TaskOutcome::Completed),
            WorkOutcome::Skipped => self.post_run(None, TaskOutcome::Skipped),
            WorkOutcome::ChangeLimitExceeded => WorkOutcome::ChangeLimitExceeded,
            WorkOutcome::Canceled => WorkOutcome::Canceled,
            WorkOutcome::Failure(err) => WorkOutcome::Failure(err),
        };

        let result = self.report(outcome);
        let finalized = self.teardown();
        match (result, finalized) {
            (Err(err), _) | (Ok(_), Err(err)) => Err(err),
            (Ok(done), Ok(())) => Ok(done),
        }
    }

    /// Run [`run`](Self::run) on a dedicated, named thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Result<TaskOutcome, EditError>>>
    where
        T: 'static,
    {
        thread::Builder::new()
            .name(format!("edit-task-{}", self.job.id()))
            .spawn(move || self.run())
    }

    /// Retire the job without running the work body, e.g. when the runner
    /// could not be scheduled.
    pub fn abandon(mut self) {
        self.retire();
    }

    fn retire(&mut self) {
        warn!(job_id = self.job.id(), command = %self.command, "edit task abandoned before start");
        self.resource.remove_async(&self.job);
        self.job.set_status(JobStatus::Done);
        self.job.task_done();
        self.dispatcher.remove_job(self.owner, &self.job);
        self.dispatcher.runner_finished(&self.job);
        self.released = true;
    }

    fn settle_queue(&self) {
        if self.resource.is_queueing_enabled() {
            debug!("flushing resource queue");
            self.resource.flush_queue();
        } else {
            self.resource.reset_async();
        }
    }

    fn post_run(
        &mut self,
        result: Option<T::Output>,
        on_success: TaskOutcome,
    ) -> WorkOutcome<TaskOutcome> {
        self.job.set_status(JobStatus::Waiting);
        self.dispatcher.add_tasks(self.owner, &self.job);
        match WorkOutcome::from(guarded(|| self.task.do_post_run(result))) {
            WorkOutcome::Success(()) => WorkOutcome::Success(on_success),
            WorkOutcome::Skipped => WorkOutcome::Skipped,
            WorkOutcome::ChangeLimitExceeded => WorkOutcome::ChangeLimitExceeded,
            WorkOutcome::Canceled => WorkOutcome::Canceled,
            WorkOutcome::Failure(err) => WorkOutcome::Failure(err),
        }
    }

    fn report(&self, outcome: WorkOutcome<TaskOutcome>) -> Result<TaskOutcome, EditError> {
        let notifier = self.dispatcher.notifier();
        match outcome {
            WorkOutcome::Success(done) => {
                info!(outcome = ?done, "edit task finished");
                self.dispatcher
                    .say_talkative(self.owner, &messages::finished(&self.job));
                Ok(done)
            }
            WorkOutcome::Skipped => Ok(TaskOutcome::Skipped),
            WorkOutcome::ChangeLimitExceeded => {
                info!("edit task hit the change limit");
                notifier.say(self.owner, messages::CHANGE_LIMIT);
                Ok(TaskOutcome::ChangeLimitExceeded)
            }
            WorkOutcome::Canceled => {
                info!("edit task canceled");
                notifier.say(self.owner, messages::CANCELED);
                Ok(TaskOutcome::Canceled)
            }
            WorkOutcome::Failure(err) => {
                error!(error = %err, "edit task failed");
                Err(err)
            }
        }
    }

    fn teardown(&mut self) -> Result<(), EditError> {
        let finalized = guarded(|| {
            self.task.post_process();
            Ok(())
        });
        if let Err(err) = &finalized {
            error!(error = %err, "edit task finalization failed");
        }
        self.release();
        debug!("edit task torn down");
        finalized
    }

    fn release(&mut self) {
        self.job.task_done();
        self.resource.remove_async(&self.job);
        self.dispatcher.runner_finished(&self.job);
        self.released = true;
    }
}

impl<T: EditTask> Drop for TaskRunner<T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if self.started {
            warn!(job_id = self.job.id(), "edit task unwound before teardown");
            self.release();
        } else {
            self.retire();
        }
    }
}

fn guarded<R>(f: impl FnOnce() -> Result<R, EditError>) -> Result<R, EditError> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|panic| Err(EditError::Panicked(panic_message(&*panic))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
