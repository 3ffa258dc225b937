//! Normalized backend reply.

use serde::{Deserialize, Serialize};

use crate::interrupt::Candidate;

/// The normalized shape every transport returns for both remote operations
/// (send message, resume conversation).
///
/// The wire format varies across backend revisions; transports are expected
/// to tolerate missing optional fields and decode into this shape with
/// defaults rather than fail. Interpretation precedence, highest first:
/// HITL requirement > clarification requirement > normal response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentReply {
    /// The assistant's response text for a normal turn.
    #[serde(default)]
    pub response: Option<String>,
    /// Prompt text accompanying an interruption.
    #[serde(default)]
    pub message: Option<String>,
    /// The backend requires the user to disambiguate among `candidates`.
    #[serde(default)]
    pub requires_clarification: bool,
    /// The backend requires explicit approval of a pending action.
    #[serde(default)]
    pub requires_hitl_decision: bool,
    /// Disambiguation options (empty unless clarification is required).
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Thread identity assigned or confirmed by the backend.
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl AgentReply {
    /// Text to show for an interruption prompt, preferring the dedicated
    /// prompt field over the response body.
    pub fn prompt_text(&self) -> Option<&str> {
        self.message.as_deref().or(self.response.as_deref())
    }

    /// Text to show for a normal turn, preferring the response body.
    pub fn response_text(&self) -> Option<&str> {
        self.response.as_deref().or(self.message.as_deref())
    }
}
