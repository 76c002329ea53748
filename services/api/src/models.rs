//! API Models
//!
//! Request and response bodies for the HTTP API, documented with `utoipa`.
//! Core workflow types are carried as plain JSON in the OpenAPI schema.

use crate::sessions::Conversation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use techsupport_core::{
    Intent,
    registry::ActionSpec,
    session::StateDelta,
    workflow::{Action, ActionResponse, Stage},
};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    fn from_ended(ended: bool) -> Self {
        if ended { Self::Ended } else { Self::Active }
    }
}

/// A snapshot of one conversation.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Session {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(value_type = String, example = "greeting")]
    pub stage: Stage,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
    /// The session's key-value view, as the runtime's global data.
    #[schema(value_type = Object)]
    pub global_data: Map<String, Value>,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for Session {
    fn from(conversation: &Conversation) -> Self {
        let state = &conversation.state;
        Self {
            id: conversation.id,
            stage: state.stage(),
            status: SessionStatus::from_ended(state.is_ended()),
            caller_number: state.caller_number().map(str::to_string),
            global_data: state.global_data(),
            opened_at: conversation.opened_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct OpenSessionPayload {
    /// Caller ID supplied by the telephony runtime, used for confirmations.
    #[schema(example = "+15551234567")]
    #[serde(default)]
    pub caller_number: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct InvokeActionPayload {
    #[schema(example = "identify_customer")]
    pub action: String,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub arguments: Value,
}

/// The outcome of an action, after it has been applied to the session.
#[derive(Serialize, ToSchema, Debug)]
pub struct ActionResult {
    #[schema(value_type = String, example = "identify_customer")]
    pub action: Action,
    /// Text for the agent to say.
    pub response: String,
    #[schema(value_type = Object)]
    pub delta: StateDelta,
    /// Side effects for the runtime to carry out.
    #[schema(value_type = Vec<Object>)]
    pub intents: Vec<Intent>,
    #[schema(value_type = String, example = "triage")]
    pub stage: Stage,
    pub status: SessionStatus,
}

impl From<ActionResponse> for ActionResult {
    fn from(response: ActionResponse) -> Self {
        Self {
            action: response.action,
            response: response.response,
            delta: response.delta,
            intents: response.intents,
            stage: response.stage,
            status: SessionStatus::from_ended(response.ended),
        }
    }
}

/// An action as advertised to the runtime.
#[derive(Serialize, ToSchema, Debug)]
pub struct ActionDescriptor {
    #[schema(value_type = String, example = "create_ticket")]
    pub name: Action,
    pub description: String,
    /// JSON schema of the action's arguments.
    #[schema(value_type = Object)]
    pub parameters: Value,
    pub secure: bool,
    #[schema(value_type = Vec<String>)]
    pub stages: Vec<Stage>,
}

impl From<&ActionSpec> for ActionDescriptor {
    fn from(spec: &ActionSpec) -> Self {
        Self {
            name: spec.name,
            description: spec.description.to_string(),
            parameters: spec.parameters.as_value().clone(),
            secure: spec.secure,
            stages: spec.stages.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use techsupport_core::session::SessionState;

    #[test]
    fn test_session_status_serialization() {
        assert_eq!(serde_json::to_string(&SessionStatus::Active).unwrap(), "\"active\"");
        assert_eq!(serde_json::to_string(&SessionStatus::Ended).unwrap(), "\"ended\"");
    }

    #[test]
    fn test_invalid_status_deserialization() {
        let result: Result<SessionStatus, _> = serde_json::from_str("\"Paused\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_session_from_conversation() {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            state: SessionState::for_caller("+15551234567"),
            opened_at: now,
            updated_at: now,
        };

        let session = Session::from(&conversation);
        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["id"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(json["stage"], "greeting");
        assert_eq!(json["status"], "active");
        assert_eq!(json["caller_number"], "+15551234567");
        assert_eq!(json["global_data"]["customer_identified"], false);
    }

    #[test]
    fn test_invoke_payload_arguments_default() {
        let payload: InvokeActionPayload =
            serde_json::from_str(r#"{"action": "secure_mode"}"#).unwrap();
        assert_eq!(payload.action, "secure_mode");
        assert!(payload.arguments.is_null());
    }

    #[test]
    fn test_invoke_payload_missing_action() {
        let result: Result<InvokeActionPayload, _> = serde_json::from_str(r#"{"arguments": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_payload_empty_body() {
        let payload: OpenSessionPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.caller_number.is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }
}
