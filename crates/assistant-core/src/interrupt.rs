//! Interruption state for a conversation.
//!
//! The backend can pause a conversation in two ways before a normal reply
//! resumes turn-taking: it can ask the user to disambiguate among named
//! entities (clarification) or require explicit approval of a pending agent
//! action (HITL). The two are mutually exclusive by construction.

use serde::{Deserialize, Serialize};

/// A disambiguation option surfaced by the backend during clarification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Backend-side entity identifier.
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub post: Option<String>,
}

impl Candidate {
    /// Full display name: "Last First Middle".
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.last_name, self.first_name, self.middle_name
        )
        .trim()
        .to_string()
    }
}

/// The current interruption mode of a conversation.
///
/// Exactly one mode is active at a time. Transitions are driven exclusively
/// by classified backend replies; the mode resets to `None` whenever a
/// normal (non-interrupting) reply arrives, and on session reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InterruptMode {
    /// Normal turn-taking.
    #[default]
    None,
    /// The backend requires the user to disambiguate among candidates.
    AwaitingClarification {
        /// Options to choose from, in backend order.
        candidates: Vec<Candidate>,
    },
    /// The backend requires explicit approval of a pending agent action.
    AwaitingHitlDecision,
}

impl InterruptMode {
    /// Returns true in normal turn-taking mode.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns true while a clarification is pending.
    pub fn is_awaiting_clarification(&self) -> bool {
        matches!(self, Self::AwaitingClarification { .. })
    }

    /// Returns true while a HITL decision is pending.
    pub fn is_awaiting_hitl_decision(&self) -> bool {
        matches!(self, Self::AwaitingHitlDecision)
    }
}

/// A user decision resolving a HITL pause.
///
/// Exactly one decision accompanies each resume call: the backend protocol
/// accepts a batch, but this client always submits a single-element batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitlDecision {
    /// Approve the pending action as proposed.
    Approve,
    /// Reject the pending action. `message` is forwarded to the backend;
    /// when absent the controller substitutes a default rejection text.
    Reject {
        #[serde(default)]
        message: Option<String>,
    },
    /// Replace the pending action's arguments before execution continues.
    /// `content` must be non-empty; a blank edit is treated as no decision.
    Edit {
        action_name: String,
        content: String,
    },
}
