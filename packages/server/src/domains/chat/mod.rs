//! Chat domain: conversation history and consolidation.

pub mod consolidate;
pub mod model;
pub mod store;

pub use consolidate::consolidate;
pub use model::{DisplayTurn, MessageRole, StoredMessage};
pub use store::MessageStore;
