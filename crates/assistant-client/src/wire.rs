//! Wire-format DTOs for the assistant backend.
//!
//! The backend revisions disagree on response shapes; the canonical contract
//! used here is the flat-field one: `requires_clarification` /
//! `requires_hitl_decision` booleans next to `response`, `message`,
//! `candidates` and `thread_id`. Every field is tolerated as absent and
//! substituted with a default rather than failing the decode.

use assistant_core::controller::DEFAULT_REJECT_MESSAGE;
use assistant_core::{AgentReply, Candidate, HitlDecision};
use serde::{Deserialize, Serialize};

/// Response body of both remote operations (`/chat`, `/chat/resume`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseDto {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub requires_clarification: bool,
    #[serde(default)]
    pub requires_hitl_decision: bool,
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<ChatResponseDto> for AgentReply {
    fn from(dto: ChatResponseDto) -> Self {
        AgentReply {
            response: dto.response,
            message: dto.message,
            requires_clarification: dto.requires_clarification,
            requires_hitl_decision: dto.requires_hitl_decision,
            candidates: dto.candidates.unwrap_or_default(),
            thread_id: dto.thread_id,
        }
    }
}

/// One element of the `decisions` array sent on resume.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionDto {
    Approve,
    Reject { message: String },
    Edit { edited_action: EditedActionDto },
}

#[derive(Debug, Clone, Serialize)]
pub struct EditedActionDto {
    pub name: String,
    pub args: EditedActionArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditedActionArgs {
    pub content: String,
}

impl From<&HitlDecision> for DecisionDto {
    fn from(decision: &HitlDecision) -> Self {
        match decision {
            HitlDecision::Approve => DecisionDto::Approve,
            HitlDecision::Reject { message } => DecisionDto::Reject {
                message: message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REJECT_MESSAGE.to_string()),
            },
            HitlDecision::Edit {
                action_name,
                content,
            } => DecisionDto::Edit {
                edited_action: EditedActionDto {
                    name: action_name.clone(),
                    args: EditedActionArgs {
                        content: content.clone(),
                    },
                },
            },
        }
    }
}

/// Encodes a decision batch as the JSON array form field value.
pub fn encode_decisions(decisions: &[HitlDecision]) -> serde_json::Result<String> {
    let dtos: Vec<DecisionDto> = decisions.iter().map(DecisionDto::from).collect();
    serde_json::to_string(&dtos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_decision_serializes_to_tagged_object() {
        let json = encode_decisions(&[HitlDecision::Approve]).unwrap();
        assert_eq!(json, r#"[{"type":"approve"}]"#);
    }

    #[test]
    fn reject_decision_carries_default_message() {
        let json = encode_decisions(&[HitlDecision::Reject { message: None }]).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"reject","message":"Действие отклонено пользователем"}]"#
        );
    }

    #[test]
    fn edit_decision_nests_the_edited_action() {
        let json = encode_decisions(&[HitlDecision::Edit {
            action_name: "add_responsible".to_string(),
            content: "Назначить Иванова".to_string(),
        }])
        .unwrap();
        assert_eq!(
            json,
            r#"[{"type":"edit","edited_action":{"name":"add_responsible","args":{"content":"Назначить Иванова"}}}]"#
        );
    }

    #[test]
    fn empty_body_decodes_with_defaults() {
        let dto: ChatResponseDto = serde_json::from_str("{}").unwrap();
        let reply = AgentReply::from(dto);
        assert_eq!(reply, AgentReply::default());
    }

    #[test]
    fn full_body_decodes_into_reply() {
        let dto: ChatResponseDto = serde_json::from_str(
            r#"{
                "response": "Уточните сотрудника",
                "requires_clarification": true,
                "candidates": [{
                    "id": "42",
                    "last_name": "Иванов",
                    "first_name": "Иван",
                    "middle_name": "Иванович",
                    "department": "Дирекция",
                    "post": "Директор"
                }],
                "thread_id": "t1",
                "status": "success"
            }"#,
        )
        .unwrap();

        let reply = AgentReply::from(dto);
        assert!(reply.requires_clarification);
        assert!(!reply.requires_hitl_decision);
        assert_eq!(reply.thread_id.as_deref(), Some("t1"));
        assert_eq!(reply.candidates.len(), 1);
        assert_eq!(reply.candidates[0].id, "42");
        assert_eq!(reply.candidates[0].post.as_deref(), Some("Директор"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dto: ChatResponseDto = serde_json::from_str(
            r#"{"response": "ок", "hitl_request": {"action_requests": []}}"#,
        )
        .unwrap();
        assert_eq!(dto.response.as_deref(), Some("ок"));
    }
}
