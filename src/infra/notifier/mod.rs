//! Owner notifier backends.

pub mod memory;

pub use memory::{InMemoryNotifier, OwnerMessage};
