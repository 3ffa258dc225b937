//! Core domain and conversation logic for the EDMS Assistant client.
//!
//! # Module Structure
//!
//! - `message`: conversation message types (`MessageRole`, `ConversationMessage`)
//! - `interrupt`: interruption state (`InterruptMode`, `Candidate`, `HitlDecision`)
//! - `reply`: normalized backend reply (`AgentReply`)
//! - `backend`: transport trait (`AssistantBackend`) and request types
//! - `store`: persisted client state (`KeyValueStore`, `ClientState`)
//! - `controller`: the conversation state machine (`ChatController`)
//! - `error`: shared error type (`AssistantError`)

pub mod backend;
pub mod controller;
pub mod error;
pub mod interrupt;
pub mod message;
pub mod reply;
pub mod store;

// Re-export common error type
pub use error::{AssistantError, Result};

pub use backend::{AssistantBackend, Attachment, OutgoingMessage, ResumeRequest};
pub use controller::ChatController;
pub use interrupt::{Candidate, HitlDecision, InterruptMode};
pub use message::{ConversationMessage, MessageRole};
pub use reply::AgentReply;
pub use store::{ClientState, KeyValueStore};
