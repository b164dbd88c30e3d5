//! Conversation state machine.
//!
//! - `intent`: pure classification of inbound text
//! - `state`: per-user single-slot pending-choice store
//! - `reply`: user-facing message rendering
//! - `resolver`: the per-message state machine driving the matcher

pub mod intent;
mod reply;
mod resolver;
mod state;

pub use resolver::DialogueResolver;
pub use state::{ConversationEntry, ConversationStore, InMemoryConversationStore, PendingStage};
