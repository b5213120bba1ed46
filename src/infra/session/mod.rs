//! Edit session backends.

pub mod memory;

pub use memory::InMemoryEditSession;
