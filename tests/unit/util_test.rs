//! Tests for utility functions and shared identifiers

use async_edit_scheduler::core::{JobStatus, OwnerId};
use async_edit_scheduler::util::{init_tracing, now_ms};
use uuid::Uuid;

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_init_tracing_twice() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_owner_id_roundtrip() {
    let uuid = Uuid::new_v4();
    let owner = OwnerId::from_uuid(uuid);
    assert_eq!(owner.as_uuid(), &uuid);
    assert_eq!(owner.to_string(), uuid.to_string());
    assert_ne!(OwnerId::random(), owner);
}

#[test]
fn test_status_rank_table() {
    for (rank, status) in JobStatus::ALL.iter().enumerate() {
        assert_eq!(usize::from(status.rank()), rank);
        assert_eq!(JobStatus::from_rank(status.rank()), Some(*status));
    }
    assert_eq!(JobStatus::from_rank(5), None);
    assert!(JobStatus::Done.is_terminal());
    assert!(!JobStatus::PlacingBlocks.is_terminal());
}

#[test]
fn test_advance_is_max_by_rank() {
    assert_eq!(
        JobStatus::advance(JobStatus::Waiting, JobStatus::Preparing),
        JobStatus::Waiting
    );
    assert_eq!(
        JobStatus::advance(JobStatus::Waiting, JobStatus::Done),
        JobStatus::Done
    );
}

#[test]
fn test_status_serde() {
    let json = serde_json::to_string(&JobStatus::PlacingBlocks).unwrap();
    assert_eq!(json, "\"placing_blocks\"");
}
