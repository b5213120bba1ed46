//! Configuration models for the dispatcher and worker pool.

pub mod scheduler;

pub use scheduler::{DispatcherConfig, SchedulerConfig, WorkerPoolConfig};
