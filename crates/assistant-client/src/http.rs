//! HTTP transport for the assistant backend.
//!
//! Implements the two remote operations over multipart form encoding:
//! `POST {base}/chat` (send message) and `POST {base}/chat/resume`
//! (resume a paused conversation). The service token travels both as a
//! bearer header and as a form field; backend revisions read one or the
//! other.

use assistant_core::{
    AgentReply, AssistantBackend, AssistantError, OutgoingMessage, Result, ResumeRequest,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::wire::{encode_decisions, ChatResponseDto};

/// HTTP client for the assistant backend.
#[derive(Clone)]
pub struct HttpAssistantClient {
    client: Client,
    config: ClientConfig,
}

impl HttpAssistantClient {
    /// Creates a client with the provided configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a client from the configuration file / environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::load()?))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Builds the multipart form for a send-message request. Empty message
    /// text is omitted; the attachment part carries the original file name
    /// and a MIME type guessed from it.
    fn message_form(message: OutgoingMessage) -> Result<Form> {
        let mut form = Form::new()
            .text("user_id", message.user_id)
            .text("service_token", message.service_token);

        if !message.text.is_empty() {
            form = form.text("message", message.text);
        }
        if let Some(document_id) = message.document_id {
            form = form.text("document_id", document_id);
        }
        if let Some(thread_id) = message.thread_id {
            form = form.text("thread_id", thread_id);
        }
        if let Some(attachment) = message.attachment {
            let mime = mime_guess::from_path(&attachment.file_name).first_or_octet_stream();
            let part = Part::bytes(attachment.bytes)
                .file_name(attachment.file_name)
                .mime_str(mime.as_ref())
                .map_err(|e| AssistantError::internal(format!("Invalid MIME type: {e}")))?;
            form = form.part("file", part);
        }

        Ok(form)
    }

    /// Sends a multipart request and decodes the normalized reply.
    async fn post_form(&self, path: &str, token: &str, form: Form) -> Result<AgentReply> {
        let url = self.endpoint(path);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| AssistantError::transport(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::transport(format!(
                "Backend error ({status}): {error_text}"
            )));
        }

        let dto = response
            .json::<ChatResponseDto>()
            .await
            .map_err(|e| AssistantError::transport(format!("Failed to parse response: {e}")))?;

        Ok(AgentReply::from(dto))
    }

    /// Sends a message to the streaming endpoint and forwards each UTF-8
    /// chunk of the body to `on_chunk` as it arrives.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error on network failure, a non-2xx status, or
    /// a broken stream.
    pub async fn stream_message<F>(&self, message: OutgoingMessage, mut on_chunk: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        let token = message.service_token.clone();
        let form = Self::message_form(message)?;
        let url = self.endpoint("/chat/stream");
        debug!("POST {url} (streaming)");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssistantError::transport(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::transport(format!(
                "Backend error ({status}): {error_text}"
            )));
        }

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| AssistantError::transport(format!("Stream broken: {e}")))?;
            on_chunk(&String::from_utf8_lossy(&chunk));
        }

        Ok(())
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantClient {
    async fn send_message(&self, message: OutgoingMessage) -> Result<AgentReply> {
        let token = message.service_token.clone();
        let form = Self::message_form(message)?;
        self.post_form("/chat", &token, form).await
    }

    async fn resume(&self, request: ResumeRequest) -> Result<AgentReply> {
        let decisions = encode_decisions(&request.decisions)?;
        let form = Form::new()
            .text("user_id", request.user_id)
            .text("service_token", request.service_token.clone())
            .text("thread_id", request.thread_id)
            .text("decisions", decisions);

        self.post_form("/chat/resume", &request.service_token, form)
            .await
    }
}
