//! Conversation sessions and their persistence.

pub mod store;
pub mod types;

pub use store::{InMemorySessionStore, SessionStore};
pub use types::{ChatTurn, ConversationSession, TurnRole};
