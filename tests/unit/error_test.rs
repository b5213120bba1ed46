//! Tests for error types

use async_edit_scheduler::core::{EditError, PoolError};

#[test]
fn test_change_limit_error() {
    let err = EditError::ChangeLimitExceeded { limit: 4096 };
    assert_eq!(format!("{}", err), "change limit exceeded: 4096");
    assert!(err.is_classified());
}

#[test]
fn test_canceled_error() {
    let err = EditError::Canceled;
    assert_eq!(format!("{}", err), "session canceled");
    assert!(err.is_classified());
}

#[test]
fn test_panicked_error_is_unclassified() {
    let err = EditError::Panicked("boom".to_string());
    assert_eq!(format!("{}", err), "task panicked: boom");
    assert!(!err.is_classified());
}

#[test]
fn test_other_error_is_transparent() {
    let err: EditError = anyhow::anyhow!("disk full").into();
    assert_eq!(format!("{}", err), "disk full");
    assert!(!err.is_classified());
}

#[test]
fn test_pool_errors() {
    assert_eq!(format!("{}", PoolError::QueueFull), "task queue is full");
    assert_eq!(format!("{}", PoolError::PoolShutdown), "pool has been shut down");
    assert_eq!(
        format!("{}", PoolError::InvalidConfig("worker_count".into())),
        "invalid configuration: worker_count"
    );
}
