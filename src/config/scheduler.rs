//! Dispatcher, worker pool and scheduler configuration structures.

use serde::{Deserialize, Serialize};

/// Default maintenance interval in milliseconds.
pub const DEFAULT_MAINTENANCE_INTERVAL_MS: u64 = 500;

/// Default bound on runners waiting for a worker.
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 256;

/// Default worker thread stack size (8 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Dispatcher behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Emit progress and status messages to job owners.
    pub talkative: bool,
    /// Period of the maintenance pass in milliseconds.
    pub maintenance_interval_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            talkative: false,
            maintenance_interval_ms: DEFAULT_MAINTENANCE_INTERVAL_MS,
        }
    }
}

impl DispatcherConfig {
    /// Builder-style setter for `talkative`.
    #[must_use]
    pub const fn with_talkative(mut self, talkative: bool) -> Self {
        self.talkative = talkative;
        self
    }

    /// Builder-style setter for the maintenance interval.
    #[must_use]
    pub const fn with_maintenance_interval_ms(mut self, interval_ms: u64) -> Self {
        self.maintenance_interval_ms = interval_ms;
        self
    }

    /// Validate dispatcher configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.maintenance_interval_ms == 0 {
            return Err("maintenance_interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of dedicated worker threads.
    pub worker_count: usize,
    /// Maximum runners waiting for a free worker.
    pub max_queue_depth: usize,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration sized to the host's CPU count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Builder-style setter for the queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Builder-style setter for the thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Validate worker pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Dispatcher settings.
    pub dispatcher: DispatcherConfig,
    /// Worker pool settings.
    pub workers: WorkerPoolConfig,
}

impl SchedulerConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.dispatcher
            .validate()
            .map_err(|e| format!("dispatcher invalid: {e}"))?;
        self.workers
            .validate()
            .map_err(|e| format!("workers invalid: {e}"))?;
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `EDIT_*` environment variables, loading a
    /// `.env` file first when present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the same keys as
    /// [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("EDIT_TALKATIVE") {
            cfg.dispatcher.talkative = parse_bool("EDIT_TALKATIVE", &v)?;
        }
        if let Some(v) = lookup("EDIT_MAINTENANCE_INTERVAL_MS") {
            cfg.dispatcher.maintenance_interval_ms = parse_num("EDIT_MAINTENANCE_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("EDIT_WORKER_COUNT") {
            cfg.workers.worker_count = parse_num("EDIT_WORKER_COUNT", &v)?;
        }
        if let Some(v) = lookup("EDIT_MAX_QUEUE_DEPTH") {
            cfg.workers.max_queue_depth = parse_num("EDIT_MAX_QUEUE_DEPTH", &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{key}: expected a boolean, got `{other}`")),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}: {e}"))
}
