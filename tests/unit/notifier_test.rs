//! Tests for owner notifiers and message texts

use async_edit_scheduler::core::notifier::messages;
use async_edit_scheduler::core::{JobRecord, JobStatus, OwnerId, OwnerNotifier, TracingNotifier};
use async_edit_scheduler::infra::InMemoryNotifier;

#[test]
fn test_messages_are_kept_per_owner() {
    let notifier = InMemoryNotifier::new();
    let alice = OwnerId::random();
    let bob = OwnerId::random();

    notifier.say(alice, "first");
    notifier.say(bob, "other");
    notifier.say(alice, "second");

    assert_eq!(notifier.texts_for(alice), vec!["first", "second"]);
    assert_eq!(notifier.texts_for(bob), vec!["other"]);
    assert_eq!(notifier.len(), 3);
    assert_eq!(notifier.count_text(alice, "first"), 1);
    assert_eq!(notifier.count_text(bob, "first"), 0);
}

#[test]
fn test_message_timestamps_are_ordered() {
    let notifier = InMemoryNotifier::new();
    let owner = OwnerId::random();
    notifier.say(owner, "a");
    notifier.say(owner, "b");

    let msgs = notifier.messages_for(owner);
    assert!(msgs[0].created_at_ms <= msgs[1].created_at_ms);
}

#[test]
fn test_unknown_owner_has_no_messages() {
    let notifier = InMemoryNotifier::new();
    assert!(notifier.is_empty());
    assert!(notifier.texts_for(OwnerId::random()).is_empty());
}

#[test]
fn test_tracing_notifier_accepts_messages() {
    TracingNotifier.say(OwnerId::random(), messages::CANCELED);
}

#[test]
fn test_message_texts() {
    let job = JobRecord::new(OwnerId::random(), 7, "//walls");
    assert_eq!(messages::CHANGE_LIMIT, "Maximum change limit reached.");
    assert_eq!(messages::CANCELED, "Job canceled.");
    assert_eq!(messages::started("//walls"), "Running //walls in full async mode.");
    assert_eq!(messages::finished(&job), "Job [7] //walls finished.");

    job.set_status(JobStatus::Done);
    assert_eq!(messages::progress(&job), "Job [7] //walls - done");
}
