//! Tests for configuration validation and loading

use async_edit_scheduler::config::{DispatcherConfig, SchedulerConfig, WorkerPoolConfig};
use std::collections::HashMap;

#[test]
fn test_defaults_are_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert!(!cfg.dispatcher.talkative);
    assert_eq!(cfg.dispatcher.maintenance_interval_ms, 500);
    assert_eq!(cfg.workers.max_queue_depth, 256);
    assert!(cfg.workers.worker_count > 0);
}

#[test]
fn test_dispatcher_zero_interval_invalid() {
    let cfg = DispatcherConfig::default().with_maintenance_interval_ms(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_worker_pool_invalid_values() {
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(WorkerPoolConfig::new()
        .with_thread_stack_size(1024)
        .validate()
        .is_err());
}

#[test]
fn test_from_json_partial() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{ "dispatcher": { "talkative": true }, "workers": { "worker_count": 3 } }"#,
    )
    .unwrap();
    assert!(cfg.dispatcher.talkative);
    assert_eq!(cfg.dispatcher.maintenance_interval_ms, 500);
    assert_eq!(cfg.workers.worker_count, 3);
}

#[test]
fn test_from_json_rejects_invalid() {
    let err = SchedulerConfig::from_json_str(r#"{ "workers": { "worker_count": 0 } }"#).unwrap_err();
    assert!(err.contains("workers invalid"));
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("EDIT_TALKATIVE", "yes"),
        ("EDIT_MAINTENANCE_INTERVAL_MS", "50"),
        ("EDIT_WORKER_COUNT", "6"),
        ("EDIT_MAX_QUEUE_DEPTH", " 32 "),
    ]
    .into_iter()
    .collect();

    let cfg = SchedulerConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
    assert!(cfg.dispatcher.talkative);
    assert_eq!(cfg.dispatcher.maintenance_interval_ms, 50);
    assert_eq!(cfg.workers.worker_count, 6);
    assert_eq!(cfg.workers.max_queue_depth, 32);
}

#[test]
fn test_from_lookup_bad_values() {
    let err = SchedulerConfig::from_lookup(|k| (k == "EDIT_TALKATIVE").then(|| "maybe".to_string()))
        .unwrap_err();
    assert!(err.contains("EDIT_TALKATIVE"));

    let err = SchedulerConfig::from_lookup(|k| (k == "EDIT_WORKER_COUNT").then(|| "-1".to_string()))
        .unwrap_err();
    assert!(err.contains("EDIT_WORKER_COUNT"));
}

#[test]
fn test_config_serializes() {
    let cfg = SchedulerConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let back = SchedulerConfig::from_json_str(&json).unwrap();
    assert_eq!(back, cfg);
}
