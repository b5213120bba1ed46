//! Tests for the in-memory edit session

use async_edit_scheduler::core::{EditError, EditResource, JobRecord, OwnerId};
use async_edit_scheduler::infra::InMemoryEditSession;
use std::sync::Arc;
use std::thread;

#[test]
fn test_reset_drops_pending_changes() {
    let session = InMemoryEditSession::new().with_queueing(true);
    session.record_change(1u32).unwrap();
    session.record_change(2).unwrap();

    session.reset_async();

    assert_eq!(session.pending_len(), 0);
    assert_eq!(session.applied_len(), 0);
    assert_eq!(session.reset_count(), 1);
}

#[test]
fn test_queueing_toggle_at_runtime() {
    let session = InMemoryEditSession::new();
    session.record_change(1u32).unwrap();
    session.set_queueing(true);
    assert!(session.is_queueing_enabled());
    session.record_change(2).unwrap();

    assert_eq!(session.applied(), vec![1]);
    assert_eq!(session.pending_len(), 1);
}

#[test]
fn test_cancel_is_idempotent() {
    let session = InMemoryEditSession::<u8>::new();
    session.cancel();
    session.cancel();
    assert!(session.is_canceled());
}

#[test]
fn test_change_limit_holds_under_contention() {
    let session = Arc::new(InMemoryEditSession::new().with_change_limit(100));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                (0..50)
                    .filter(|i| session.record_change(t * 50 + i).is_ok())
                    .count()
            })
        })
        .collect();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(accepted, 100);
    assert_eq!(session.change_count(), 100);
    assert!(matches!(
        session.record_change(0),
        Err(EditError::ChangeLimitExceeded { limit: 100 })
    ));
}

#[test]
fn test_active_job_registration() {
    let session = InMemoryEditSession::<u8>::new();
    let job = Arc::new(JobRecord::new(OwnerId::random(), 3, "//copy"));

    session.add_async(&job);
    session.add_async(&job);
    assert_eq!(session.active_jobs().len(), 1);
    assert!(session.active_jobs().contains(3));

    session.remove_async(&job);
    session.remove_async(&job);
    assert!(session.active_jobs().is_empty());
}
