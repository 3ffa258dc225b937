//! Assistant backend trait.
//!
//! Defines the interface for the remote conversational-agent backend,
//! decoupling the controller from the specific transport (HTTP client,
//! test double).

use async_trait::async_trait;

use crate::error::Result;
use crate::interrupt::HitlDecision;
use crate::reply::AgentReply;

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, used for the multipart part and MIME guessing.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// An outgoing user message with session identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// User identity in the EDMS.
    pub user_id: String,
    /// Service token authenticating the user.
    pub service_token: String,
    /// Message text. May be empty when an attachment carries the intent.
    pub text: String,
    /// Optional document context for the request.
    pub document_id: Option<String>,
    /// Optional file attachment.
    pub attachment: Option<Attachment>,
    /// Thread identity; absent only before the first reply of a session.
    pub thread_id: Option<String>,
}

/// A request to resume a conversation paused on a HITL interruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRequest {
    pub user_id: String,
    pub service_token: String,
    /// Thread identity. Required: a paused conversation cannot be resumed
    /// without one.
    pub thread_id: String,
    /// Decision batch. This client always submits exactly one element.
    pub decisions: Vec<HitlDecision>,
}

/// An abstract remote conversational-agent backend.
///
/// Implementations translate the two logical remote operations into their
/// transport (HTTP multipart in production) and decode responses into the
/// normalized [`AgentReply`], substituting defaults for absent fields.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Sends a user message and returns the classified reply.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error on network failure or a non-2xx status.
    async fn send_message(&self, message: OutgoingMessage) -> Result<AgentReply>;

    /// Resumes a paused conversation with the user's decisions.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error on network failure or a non-2xx status.
    async fn resume(&self, request: ResumeRequest) -> Result<AgentReply>;
}
