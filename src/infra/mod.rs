//! In-memory implementations of the collaborator interfaces.

pub mod notifier;
pub mod session;

pub use notifier::InMemoryNotifier;
pub use session::InMemoryEditSession;
