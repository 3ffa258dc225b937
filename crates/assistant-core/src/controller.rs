//! Conversation controller.
//!
//! `ChatController` owns the dialogue state of a single conversation
//! (message log, thread identity, pending interruption mode) and mediates
//! between user intents and the remote agent backend. Interruption signals
//! from the backend become UI-visible modes; user resolutions of those
//! interruptions become backend calls.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::backend::{AssistantBackend, Attachment, OutgoingMessage, ResumeRequest};
use crate::error::{AssistantError, Result};
use crate::interrupt::{HitlDecision, InterruptMode};
use crate::message::{ConversationMessage, MessageRole};
use crate::reply::AgentReply;
use crate::store::ClientState;

/// Prompt shown when a clarification reply carries no text.
const DEFAULT_CLARIFICATION_PROMPT: &str = "Требуется уточнение";
/// Prompt shown when a HITL reply carries no text.
const DEFAULT_HITL_PROMPT: &str = "Требуется подтверждение действия";
/// Text shown when a normal reply carries no response.
const DEFAULT_EMPTY_RESPONSE: &str = "Нет ответа.";
/// Rejection message sent to the backend when the user gives none.
pub const DEFAULT_REJECT_MESSAGE: &str = "Действие отклонено пользователем";

const SUBMIT_FAILED: &str = "Ошибка: не удалось отправить сообщение.";
const CLARIFY_FAILED: &str = "Ошибка: не удалось уточнить выбор.";
const DECIDE_FAILED: &str = "Ошибка: не удалось отправить решение.";

/// The conversation state machine.
///
/// States map onto [`InterruptMode`]: `Idle` (`None`),
/// `AwaitingClarification`, `AwaitingHitlDecision`. All transitions happen
/// inside the intent methods (`submit`, `select_candidate`, `decide`,
/// `cancel_*`, `reset`); the presentation layer only reads snapshots and
/// issues intents.
///
/// Concurrency contract: there is one logical writer. While a request is
/// outstanding [`ChatController::is_busy`] is true and the presentation
/// layer is expected to gate further input; the controller itself does not
/// queue or reject concurrent calls. There is no cancellation: a reset
/// issued while a request is in flight does not stop the eventual reply
/// from appending its message.
pub struct ChatController {
    backend: Arc<dyn AssistantBackend>,
    state: ClientState,
    messages: Arc<RwLock<Vec<ConversationMessage>>>,
    mode: Arc<RwLock<InterruptMode>>,
    thread_id: Arc<RwLock<Option<String>>>,
    document_id: Arc<RwLock<Option<String>>>,
    pending_attachment: Arc<RwLock<Option<Attachment>>>,
    busy: Arc<RwLock<bool>>,
}

impl ChatController {
    /// Creates a controller, restoring the persisted thread id so a reload
    /// resumes the same conversation.
    pub async fn new(backend: Arc<dyn AssistantBackend>, state: ClientState) -> Self {
        let thread_id = state.thread_id().await;

        Self {
            backend,
            state,
            messages: Arc::new(RwLock::new(Vec::new())),
            mode: Arc::new(RwLock::new(InterruptMode::None)),
            thread_id: Arc::new(RwLock::new(thread_id)),
            document_id: Arc::new(RwLock::new(None)),
            pending_attachment: Arc::new(RwLock::new(None)),
            busy: Arc::new(RwLock::new(false)),
        }
    }

    /// Submits a user message.
    ///
    /// A blank text with no pending attachment is a silent no-op: no network
    /// call is issued and the message log is untouched.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when identity fields are unset. Transport
    /// failures are never propagated: they degrade to an assistant-role
    /// error message in the log and the state returns to idle.
    pub async fn submit(&self, text: &str) -> Result<()> {
        let (user_id, service_token) = self.require_identity().await?;

        let attachment = self.pending_attachment.write().await.take();
        if text.trim().is_empty() && attachment.is_none() {
            debug!("submit skipped: empty input and no attachment");
            return Ok(());
        }

        self.push_message(MessageRole::User, text).await;
        self.set_busy(true).await;

        let message = OutgoingMessage {
            user_id,
            service_token,
            text: text.to_string(),
            document_id: self.document_id.read().await.clone(),
            attachment,
            thread_id: self.thread_id.read().await.clone(),
        };

        match self.backend.send_message(message).await {
            Ok(reply) => self.apply_reply(reply).await,
            Err(e) => {
                error!("send_message failed: {e}");
                self.fail_turn(SUBMIT_FAILED).await;
            }
        }

        self.set_busy(false).await;
        Ok(())
    }

    /// Resolves a pending clarification by resubmitting the user's selection
    /// as a normal message on the current thread.
    ///
    /// The selection may be a candidate id or free text; the backend is
    /// authoritative on interpretation.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when no clarification is pending or identity
    /// fields are unset.
    pub async fn select_candidate(&self, selection: &str) -> Result<()> {
        if !self.mode.read().await.is_awaiting_clarification() {
            warn!("select_candidate called outside clarification mode");
            return Err(AssistantError::validation("no clarification is pending"));
        }
        let (user_id, service_token) = self.require_identity().await?;

        // Clarification state is discarded before the call; the reply
        // decides the next mode.
        *self.mode.write().await = InterruptMode::None;

        self.push_message(MessageRole::User, selection).await;
        self.set_busy(true).await;

        let message = OutgoingMessage {
            user_id,
            service_token,
            text: selection.to_string(),
            document_id: self.document_id.read().await.clone(),
            attachment: None,
            thread_id: self.thread_id.read().await.clone(),
        };

        match self.backend.send_message(message).await {
            Ok(reply) => self.apply_reply(reply).await,
            Err(e) => {
                error!("clarification send failed: {e}");
                self.fail_turn(CLARIFY_FAILED).await;
            }
        }

        self.set_busy(false).await;
        Ok(())
    }

    /// Discards a pending clarification without a network call.
    pub async fn cancel_clarification(&self) {
        let mut mode = self.mode.write().await;
        if mode.is_awaiting_clarification() {
            *mode = InterruptMode::None;
        }
    }

    /// Resolves a pending HITL pause with a single decision and resumes the
    /// conversation.
    ///
    /// An `Edit` with blank content carries no decision: the call is skipped
    /// with a logged fault and the pause stays in place. A `Reject` without
    /// a message is sent with [`DEFAULT_REJECT_MESSAGE`].
    ///
    /// # Errors
    ///
    /// Returns `Validation` when no decision is pending or identity fields
    /// are unset, and `MissingThread` when the conversation has no thread
    /// id; it cannot be resumed without one.
    pub async fn decide(&self, decision: HitlDecision) -> Result<()> {
        if !self.mode.read().await.is_awaiting_hitl_decision() {
            warn!("decide called outside HITL mode");
            return Err(AssistantError::validation("no HITL decision is pending"));
        }

        if let HitlDecision::Edit { content, .. } = &decision
            && content.trim().is_empty()
        {
            warn!("empty edit content; decision skipped");
            return Err(AssistantError::validation("edit content must not be empty"));
        }

        let (user_id, service_token) = self.require_identity().await?;

        let Some(thread_id) = self.thread_id.read().await.clone() else {
            error!("cannot resume conversation: no thread id");
            return Err(AssistantError::MissingThread);
        };

        let decision = match decision {
            HitlDecision::Reject { message } => HitlDecision::Reject {
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| Some(DEFAULT_REJECT_MESSAGE.to_string())),
            },
            other => other,
        };

        self.set_busy(true).await;

        let request = ResumeRequest {
            user_id,
            service_token,
            thread_id,
            decisions: vec![decision],
        };

        match self.backend.resume(request).await {
            Ok(reply) => self.apply_reply(reply).await,
            Err(e) => {
                error!("resume failed: {e}");
                self.fail_turn(DECIDE_FAILED).await;
            }
        }

        self.set_busy(false).await;
        Ok(())
    }

    /// Discards a pending HITL pause without a network call.
    pub async fn cancel_decision(&self) {
        let mut mode = self.mode.write().await;
        if mode.is_awaiting_hitl_decision() {
            *mode = InterruptMode::None;
        }
    }

    /// Starts a fresh conversation: clears the message log, attachment,
    /// document context and interruption state, and establishes a brand-new
    /// thread identity distinct from the prior one.
    pub async fn reset(&self) -> Result<()> {
        self.messages.write().await.clear();
        *self.mode.write().await = InterruptMode::None;
        *self.pending_attachment.write().await = None;
        *self.document_id.write().await = None;

        let fresh = uuid::Uuid::new_v4().to_string();
        *self.thread_id.write().await = Some(fresh.clone());
        if let Err(e) = self.state.set_thread_id(Some(&fresh)).await {
            warn!("failed to persist thread id: {e}");
        }

        Ok(())
    }

    /// Stages a file to be sent with the next `submit`. Passing `None`
    /// discards a previously staged file.
    pub async fn set_attachment(&self, attachment: Option<Attachment>) {
        *self.pending_attachment.write().await = attachment;
    }

    /// File name of the staged attachment, if any.
    pub async fn attachment_name(&self) -> Option<String> {
        self.pending_attachment
            .read()
            .await
            .as_ref()
            .map(|a| a.file_name.clone())
    }

    /// Sets or clears the document context sent with subsequent messages.
    pub async fn set_document_id(&self, document_id: Option<String>) {
        *self.document_id.write().await = document_id;
    }

    pub async fn document_id(&self) -> Option<String> {
        self.document_id.read().await.clone()
    }

    /// Snapshot of the message log.
    pub async fn messages(&self) -> Vec<ConversationMessage> {
        self.messages.read().await.clone()
    }

    /// Snapshot of the current interruption mode.
    pub async fn interrupt_mode(&self) -> InterruptMode {
        self.mode.read().await.clone()
    }

    pub async fn thread_id(&self) -> Option<String> {
        self.thread_id.read().await.clone()
    }

    /// True while a request is outstanding. The presentation layer is
    /// expected to disable submission while this is set.
    pub async fn is_busy(&self) -> bool {
        *self.busy.read().await
    }

    /// Classifies a backend reply and applies the resulting transition.
    ///
    /// Precedence, highest first: HITL requirement > clarification
    /// requirement > normal response. The thread id is updated when the
    /// backend supplied one, retained otherwise.
    async fn apply_reply(&self, reply: AgentReply) {
        if let Some(thread) = &reply.thread_id {
            *self.thread_id.write().await = Some(thread.clone());
            if let Err(e) = self.state.set_thread_id(Some(thread)).await {
                warn!("failed to persist thread id: {e}");
            }
        }

        let (next_mode, content) = if reply.requires_hitl_decision {
            (
                InterruptMode::AwaitingHitlDecision,
                reply
                    .prompt_text()
                    .unwrap_or(DEFAULT_HITL_PROMPT)
                    .to_string(),
            )
        } else if reply.requires_clarification {
            (
                InterruptMode::AwaitingClarification {
                    candidates: reply.candidates.clone(),
                },
                reply
                    .prompt_text()
                    .unwrap_or(DEFAULT_CLARIFICATION_PROMPT)
                    .to_string(),
            )
        } else {
            (
                InterruptMode::None,
                reply
                    .response_text()
                    .unwrap_or(DEFAULT_EMPTY_RESPONSE)
                    .to_string(),
            )
        };

        *self.mode.write().await = next_mode;
        self.push_message(MessageRole::Assistant, &content).await;
    }

    /// Degrades a transport fault to a visible chat message and returns the
    /// conversation to normal turn-taking.
    async fn fail_turn(&self, text: &str) {
        self.push_message(MessageRole::Assistant, text).await;
        *self.mode.write().await = InterruptMode::None;
    }

    async fn require_identity(&self) -> Result<(String, String)> {
        let Some(user_id) = self.state.user_id().await else {
            warn!("intent refused: user id is not set");
            return Err(AssistantError::validation("user id is not set"));
        };
        let Some(service_token) = self.state.service_token().await else {
            warn!("intent refused: service token is not set");
            return Err(AssistantError::validation("service token is not set"));
        };
        Ok((user_id, service_token))
    }

    async fn push_message(&self, role: MessageRole, content: &str) {
        self.messages
            .write()
            .await
            .push(ConversationMessage::new(role, content));
    }

    async fn set_busy(&self, value: bool) {
        *self.busy.write().await = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::Candidate;
    use crate::store::KeyValueStore;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Backend double that replays scripted replies and records every call.
    struct MockBackend {
        replies: Mutex<VecDeque<Result<AgentReply>>>,
        sent_messages: Mutex<Vec<OutgoingMessage>>,
        resume_requests: Mutex<Vec<ResumeRequest>>,
    }

    impl MockBackend {
        fn new(replies: Vec<Result<AgentReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent_messages: Mutex::new(Vec::new()),
                resume_requests: Mutex::new(Vec::new()),
            }
        }

        fn next_reply(&self) -> Result<AgentReply> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left")
        }

        fn call_count(&self) -> usize {
            self.sent_messages.lock().unwrap().len() + self.resume_requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl AssistantBackend for MockBackend {
        async fn send_message(&self, message: OutgoingMessage) -> Result<AgentReply> {
            self.sent_messages.lock().unwrap().push(message);
            self.next_reply()
        }

        async fn resume(&self, request: ResumeRequest) -> Result<AgentReply> {
            self.resume_requests.lock().unwrap().push(request);
            self.next_reply()
        }
    }

    struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn normal_reply(text: &str) -> AgentReply {
        AgentReply {
            response: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn clarification_reply(prompt: &str, candidates: Vec<Candidate>) -> AgentReply {
        AgentReply {
            response: Some(prompt.to_string()),
            requires_clarification: true,
            candidates,
            ..Default::default()
        }
    }

    fn hitl_reply(prompt: &str) -> AgentReply {
        AgentReply {
            message: Some(prompt.to_string()),
            requires_hitl_decision: true,
            ..Default::default()
        }
    }

    fn candidate(id: &str, first_name: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            last_name: "Иванов".to_string(),
            first_name: first_name.to_string(),
            middle_name: "Иванович".to_string(),
            department: None,
            post: None,
        }
    }

    async fn controller_with(
        replies: Vec<Result<AgentReply>>,
    ) -> (ChatController, Arc<MockBackend>, ClientState) {
        let backend = Arc::new(MockBackend::new(replies));
        let state = ClientState::new(Arc::new(MemoryStore::new()));
        state.set_user_id("u-1").await.unwrap();
        state.set_service_token("tok-1").await.unwrap();

        let controller = ChatController::new(backend.clone(), state.clone()).await;
        (controller, backend, state)
    }

    #[tokio::test]
    async fn submit_appends_user_then_assistant_per_turn() {
        let (controller, _, _) = controller_with(vec![
            Ok(normal_reply("Добрый день")),
            Ok(normal_reply("Готово")),
        ])
        .await;

        controller.submit("Привет").await.unwrap();
        controller.submit("Создай документ").await.unwrap();

        let log = controller.messages().await;
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].role, MessageRole::User);
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert_eq!(log[1].content, "Добрый день");
        assert_eq!(log[2].role, MessageRole::User);
        assert_eq!(log[3].role, MessageRole::Assistant);
        assert!(controller.interrupt_mode().await.is_none());
        assert!(!controller.is_busy().await);
    }

    #[tokio::test]
    async fn blank_submit_is_a_silent_no_op() {
        let (controller, backend, _) = controller_with(vec![]).await;

        controller.submit("   ").await.unwrap();

        assert_eq!(backend.call_count(), 0);
        assert!(controller.messages().await.is_empty());
    }

    #[tokio::test]
    async fn submit_without_identity_is_refused() {
        let backend = Arc::new(MockBackend::new(vec![]));
        let state = ClientState::new(Arc::new(MemoryStore::new()));
        let controller = ChatController::new(backend.clone(), state).await;

        let err = controller.submit("Привет").await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(backend.call_count(), 0);
        assert!(controller.messages().await.is_empty());
    }

    #[tokio::test]
    async fn blank_submit_with_attachment_is_sent() {
        let (controller, backend, _) = controller_with(vec![Ok(normal_reply("Файл принят"))]).await;

        controller
            .set_attachment(Some(Attachment::new("report.pdf", vec![1, 2, 3])))
            .await;
        controller.submit("").await.unwrap();

        let sent = backend.sent_messages.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].attachment.as_ref().unwrap().file_name,
            "report.pdf"
        );
        drop(sent);
        // The attachment is consumed by the submit.
        assert_eq!(controller.attachment_name().await, None);
    }

    #[tokio::test]
    async fn hitl_requirement_wins_over_clarification() {
        let mut reply = hitl_reply("Требуется подтверждение");
        reply.requires_clarification = true;
        reply.candidates = vec![candidate("1", "Иван")];
        let (controller, _, _) = controller_with(vec![Ok(reply)]).await;

        controller.submit("Удали документ").await.unwrap();

        let mode = controller.interrupt_mode().await;
        assert!(mode.is_awaiting_hitl_decision());
        assert!(!mode.is_awaiting_clarification());
    }

    #[tokio::test]
    async fn clarification_reply_enters_mode_with_candidates() {
        let candidates = vec![candidate("42", "Иван"), candidate("43", "Пётр")];
        let (controller, _, _) = controller_with(vec![Ok(clarification_reply(
            "Уточните сотрудника",
            candidates.clone(),
        ))])
        .await;

        controller.submit("Кто директор?").await.unwrap();

        match controller.interrupt_mode().await {
            InterruptMode::AwaitingClarification { candidates: got } => {
                assert_eq!(got, candidates);
            }
            other => panic!("expected AwaitingClarification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clarification_with_absent_candidates_yields_empty_list() {
        let (controller, _, _) =
            controller_with(vec![Ok(clarification_reply("Уточните", vec![]))]).await;

        controller.submit("Кто директор?").await.unwrap();

        match controller.interrupt_mode().await {
            InterruptMode::AwaitingClarification { candidates } => {
                assert!(candidates.is_empty());
            }
            other => panic!("expected AwaitingClarification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clarification_example_sets_thread_and_log() {
        let mut reply = clarification_reply("Уточните сотрудника", vec![candidate("42", "Иван")]);
        reply.thread_id = Some("t1".to_string());
        let (controller, _, state) = controller_with(vec![Ok(reply)]).await;

        assert_eq!(controller.thread_id().await, None);
        controller.submit("Кто директор?").await.unwrap();

        assert_eq!(controller.thread_id().await, Some("t1".to_string()));
        assert_eq!(state.thread_id().await, Some("t1".to_string()));
        let log = controller.messages().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].content, "Кто директор?");
        assert_eq!(log[1].content, "Уточните сотрудника");
    }

    #[tokio::test]
    async fn thread_id_is_retained_when_reply_omits_it() {
        let mut first = normal_reply("ok");
        first.thread_id = Some("t1".to_string());
        let (controller, _, _) =
            controller_with(vec![Ok(first), Ok(normal_reply("ещё раз ok"))]).await;

        controller.submit("раз").await.unwrap();
        controller.submit("два").await.unwrap();

        assert_eq!(controller.thread_id().await, Some("t1".to_string()));
    }

    #[tokio::test]
    async fn select_candidate_resubmits_on_current_thread() {
        let mut clarify = clarification_reply("Уточните", vec![candidate("42", "Иван")]);
        clarify.thread_id = Some("t1".to_string());
        let (controller, backend, _) =
            controller_with(vec![Ok(clarify), Ok(normal_reply("Иванов Иван — директор"))]).await;

        controller.submit("Кто директор?").await.unwrap();
        controller.select_candidate("42").await.unwrap();

        let sent = backend.sent_messages.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].text, "42");
        assert_eq!(sent[1].thread_id, Some("t1".to_string()));
        drop(sent);

        assert!(controller.interrupt_mode().await.is_none());
        let log = controller.messages().await;
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].role, MessageRole::User);
        assert_eq!(log[2].content, "42");
    }

    #[tokio::test]
    async fn select_candidate_outside_clarification_is_refused() {
        let (controller, backend, _) = controller_with(vec![]).await;

        let err = controller.select_candidate("42").await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn cancel_clarification_discards_candidates_without_network() {
        let (controller, backend, _) =
            controller_with(vec![Ok(clarification_reply("Уточните", vec![candidate("1", "Иван")]))])
                .await;

        controller.submit("Кто директор?").await.unwrap();
        controller.cancel_clarification().await;

        assert!(controller.interrupt_mode().await.is_none());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_edit_decision_is_skipped() {
        let mut reply = hitl_reply("Подтвердите");
        reply.thread_id = Some("t1".to_string());
        let (controller, backend, _) = controller_with(vec![Ok(reply)]).await;

        controller.submit("Удали документ").await.unwrap();
        let err = controller
            .decide(HitlDecision::Edit {
                action_name: "delete_document".to_string(),
                content: "   ".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(controller.interrupt_mode().await.is_awaiting_hitl_decision());
        assert!(backend.resume_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_decision_resumes_with_default_message() {
        let mut reply = hitl_reply("Подтвердите");
        reply.thread_id = Some("t1".to_string());
        let (controller, backend, _) =
            controller_with(vec![Ok(reply), Ok(normal_reply("Действие отменено"))]).await;

        controller.submit("Удали документ").await.unwrap();
        controller
            .decide(HitlDecision::Reject { message: None })
            .await
            .unwrap();

        let requests = backend.resume_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].thread_id, "t1");
        assert_eq!(
            requests[0].decisions,
            vec![HitlDecision::Reject {
                message: Some(DEFAULT_REJECT_MESSAGE.to_string()),
            }]
        );
        drop(requests);

        assert!(controller.interrupt_mode().await.is_none());
    }

    #[tokio::test]
    async fn decide_without_thread_is_a_precondition_failure() {
        // HITL reply that carries no thread id, against a session that never
        // had one: the pause cannot be resumed.
        let (controller, backend, _) = controller_with(vec![Ok(hitl_reply("Подтвердите"))]).await;

        controller.submit("Удали документ").await.unwrap();
        let log_before = controller.messages().await.len();
        let err = controller.decide(HitlDecision::Approve).await.unwrap_err();

        assert!(err.is_missing_thread());
        assert!(backend.resume_requests.lock().unwrap().is_empty());
        assert_eq!(controller.messages().await.len(), log_before);
        assert!(controller.interrupt_mode().await.is_awaiting_hitl_decision());
    }

    #[tokio::test]
    async fn hitl_can_chain_into_clarification() {
        let mut first = hitl_reply("Подтвердите");
        first.thread_id = Some("t1".to_string());
        let (controller, _, _) = controller_with(vec![
            Ok(first),
            Ok(clarification_reply("Уточните сотрудника", vec![candidate("42", "Иван")])),
        ])
        .await;

        controller.submit("Добавь ответственного").await.unwrap();
        controller.decide(HitlDecision::Approve).await.unwrap();

        assert!(controller.interrupt_mode().await.is_awaiting_clarification());
    }

    #[tokio::test]
    async fn cancel_decision_discards_pause_without_network() {
        let mut reply = hitl_reply("Подтвердите");
        reply.thread_id = Some("t1".to_string());
        let (controller, backend, _) = controller_with(vec![Ok(reply)]).await;

        controller.submit("Удали документ").await.unwrap();
        controller.cancel_decision().await;

        assert!(controller.interrupt_mode().await.is_none());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn transport_fault_degrades_to_error_message() {
        let (controller, _, _) =
            controller_with(vec![Err(AssistantError::transport("connection refused"))]).await;

        controller.submit("Привет").await.unwrap();

        let log = controller.messages().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert_eq!(log[1].content, SUBMIT_FAILED);
        assert!(controller.interrupt_mode().await.is_none());
        assert!(!controller.is_busy().await);
    }

    #[tokio::test]
    async fn transport_fault_during_resume_returns_to_idle() {
        let mut reply = hitl_reply("Подтвердите");
        reply.thread_id = Some("t1".to_string());
        let (controller, _, _) = controller_with(vec![
            Ok(reply),
            Err(AssistantError::transport("gateway timeout")),
        ])
        .await;

        controller.submit("Удали документ").await.unwrap();
        controller.decide(HitlDecision::Approve).await.unwrap();

        let log = controller.messages().await;
        assert_eq!(log.last().unwrap().content, DECIDE_FAILED);
        assert!(controller.interrupt_mode().await.is_none());
    }

    #[tokio::test]
    async fn reset_clears_state_and_rotates_thread() {
        let mut reply = clarification_reply("Уточните", vec![candidate("1", "Иван")]);
        reply.thread_id = Some("t1".to_string());
        let (controller, _, state) = controller_with(vec![Ok(reply)]).await;

        controller.set_document_id(Some("doc-9".to_string())).await;
        controller.submit("Кто директор?").await.unwrap();
        controller.reset().await.unwrap();

        assert!(controller.messages().await.is_empty());
        assert!(controller.interrupt_mode().await.is_none());
        assert_eq!(controller.document_id().await, None);

        let fresh = controller.thread_id().await.expect("fresh thread id");
        assert_ne!(fresh, "t1");
        assert_eq!(state.thread_id().await, Some(fresh));
    }
}
