//! Natural-language understanding.
//!
//! The agent consumes NLU through the narrow [`NluProvider`] trait:
//! intent classification, booking-field extraction, and freeform
//! completion. Two implementations ship here:
//!
//! - [`LlmNlu`]: chat-completions client against a configured LLM endpoint
//! - [`PatternNlu`]: offline keyword/regex provider, useful without an
//!   API key and as the deterministic backend for tests

pub mod llm;
pub mod pattern;
pub mod provider;
pub mod types;

pub use llm::LlmNlu;
pub use pattern::PatternNlu;
pub use provider::NluProvider;
pub use types::{ExtractedFields, Intent, IntentClassification};
