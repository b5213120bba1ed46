//! # Async Edit Scheduler
//!
//! Runs long-running, potentially very large edit operations off the caller's
//! thread, keeps the caller informed about their progress and lets them cancel
//! work in flight without corrupting the resource being edited.
//!
//! ## Core Pieces
//!
//! - **`JobRecord`**: identity, owner and a monotonic status
//!   (`Initializing → Preparing → Waiting → PlacingBlocks → Done`) with
//!   status-change listeners
//! - **`JobDispatcher`**: tracks in-flight jobs per owner and periodically
//!   advances and retires them
//! - **`TaskRunner`**: wraps caller-supplied work (`EditTask`) so it runs on a
//!   worker thread, drives the job's status and always tears down
//! - **`EditResource`**: capability interface of the resource under edit
//!   (queue flush, async reset, cancellation, active-job bookkeeping)
//! - **`WorkerPool`**: dedicated OS threads for blocking edit work
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use async_edit_scheduler::builders::build_scheduler;
//! use async_edit_scheduler::config::SchedulerConfig;
//! use async_edit_scheduler::core::{OwnerId, TracingNotifier};
//! use async_edit_scheduler::infra::InMemoryEditSession;
//!
//! let scheduler = build_scheduler(&SchedulerConfig::from_env()?, Arc::new(TracingNotifier))?;
//! let session = Arc::new(InMemoryEditSession::<u32>::new().with_queueing(true));
//! let handle = scheduler.submit(my_task, session, OwnerId::random(), "//replace")?;
//! let outcome = handle.wait()??;
//! ```
//!
//! For complete examples, see `tests/task_runner_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core job abstractions: records, dispatcher, task runner and worker pool.
pub mod core;
/// Configuration models for the dispatcher and worker pool.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// In-memory collaborator implementations.
pub mod infra;
/// Async runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
