//! Core job abstractions: records, dispatcher, task runner and worker pool.

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod job;
pub mod notifier;
pub mod resource;
pub mod task;
pub mod worker_pool;

pub use dispatcher::{JobDispatcher, MaintenanceHandle, MaintenanceReport};
pub use error::{AppResult, EditError, PoolError};
pub use events::{ChannelListener, JobEvent};
pub use job::{JobId, JobListener, JobRecord, JobStatus, OwnerId};
pub use notifier::{OwnerNotifier, TracingNotifier};
pub use resource::{ActiveJobs, EditResource, PlainResource};
pub use task::{EditTask, TaskOutcome, TaskRunner, WorkOutcome};
pub use worker_pool::{PoolStats, RunResult, TaskHandle, WorkerPool};
