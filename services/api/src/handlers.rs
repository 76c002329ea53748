//! Axum Handlers for the REST API
//!
//! The hosting voice runtime opens a session per call, invokes actions as the
//! conversation unfolds, and closes the session when the call ends. These
//! handlers use `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use techsupport_core::{
    profile::AgentProfile,
    workflow::{Stage, WorkflowError},
};
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    models::{
        ActionDescriptor, ActionResult, ErrorResponse, InvokeActionPayload, OpenSessionPayload,
        Session,
    },
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::UnknownAction(_) => ApiError::NotFound(message),
            WorkflowError::UnknownStage(_) => ApiError::BadRequest(message),
            WorkflowError::NotPermitted { .. } | WorkflowError::ConversationEnded => {
                ApiError::Conflict(message)
            }
            WorkflowError::InvalidArguments { .. } => ApiError::UnprocessableEntity(message),
        }
    }
}

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Session with id '{}' not found", id))
}

/// Open a conversation for a new call.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = OpenSessionPayload,
    responses(
        (status = 201, description = "Session opened", body = Session),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<OpenSessionPayload>>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let conversation = state.sessions.open(payload.caller_number).await;
    info!(session_id = %conversation.id, "Conversation opened");
    Ok((StatusCode::CREATED, Json(Session::from(&conversation))))
}

/// Get a snapshot of a conversation.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = Session),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let conversation = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(Session::from(&conversation)))
}

/// End a conversation and discard its state.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conversation = state
        .sessions
        .close(id)
        .await
        .ok_or_else(|| session_not_found(id))?;
    info!(
        session_id = %id,
        stage = %conversation.state.stage(),
        ended = conversation.state.is_ended(),
        "Conversation closed"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Invoke a workflow action within a conversation.
#[utoipa::path(
    post,
    path = "/sessions/{id}/actions",
    request_body = InvokeActionPayload,
    responses(
        (status = 200, description = "Action applied", body = ActionResult),
        (status = 404, description = "Session or action not found", body = ErrorResponse),
        (status = 409, description = "Action not available in the current stage, or the conversation has ended", body = ErrorResponse),
        (status = 422, description = "Arguments do not match the action's schema", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn invoke_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvokeActionPayload>,
) -> Result<Json<ActionResult>, ApiError> {
    let engine = state.engine.clone();
    let (result, _) = state
        .sessions
        .update(id, |session| {
            engine.invoke(session, &payload.action, payload.arguments)
        })
        .await
        .ok_or_else(|| session_not_found(id))?;

    let response = result?;
    info!(
        session_id = %id,
        action = %response.action,
        stage = %response.stage,
        intents = response.intents.len(),
        "Action applied"
    );
    Ok(Json(ActionResult::from(response)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionsQuery {
    /// Only list actions available in this stage.
    pub stage: Option<String>,
}

/// List the registered actions and their argument schemas.
#[utoipa::path(
    get,
    path = "/actions",
    params(ActionsQuery),
    responses(
        (status = 200, description = "Registered actions", body = [ActionDescriptor]),
        (status = 400, description = "Unknown stage", body = ErrorResponse)
    )
)]
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<Vec<ActionDescriptor>>, ApiError> {
    let descriptors = match query.stage {
        Some(stage) => {
            let stage = stage.parse::<Stage>()?;
            state
                .engine
                .available_actions(stage)
                .into_iter()
                .map(ActionDescriptor::from)
                .collect()
        }
        None => state
            .engine
            .registry()
            .specs()
            .map(ActionDescriptor::from)
            .collect(),
    };
    Ok(Json(descriptors))
}

/// Get the agent profile: prompt, language, recording and stage settings.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Agent profile as JSON")
    )
)]
pub async fn get_profile(State(state): State<Arc<AppState>>) -> Json<AgentProfile> {
    Json(state.profile.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::SessionStatus;
    use serde_json::json;

    fn app_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default(), AgentProfile::default()))
    }

    async fn open(state: &Arc<AppState>, caller: Option<&str>) -> Uuid {
        let (status, Json(session)) = open_session(
            State(state.clone()),
            Some(Json(OpenSessionPayload {
                caller_number: caller.map(str::to_string),
            })),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        session.id
    }

    async fn invoke(
        state: &Arc<AppState>,
        id: Uuid,
        action: &str,
        arguments: serde_json::Value,
    ) -> Result<ActionResult, ApiError> {
        invoke_action(
            State(state.clone()),
            Path(id),
            Json(InvokeActionPayload {
                action: action.to_string(),
                arguments,
            }),
        )
        .await
        .map(|Json(result)| result)
    }

    #[tokio::test]
    async fn test_full_call_over_http_handlers() {
        let state = app_state();
        let id = open(&state, Some("+15551234567")).await;

        let result = invoke(&state, id, "identify_customer", json!({"identifier": "+1 555 123 4567"}))
            .await
            .unwrap();
        assert_eq!(result.stage, Stage::Triage);
        assert!(result.response.contains("Jane Doe"));

        let result = invoke(&state, id, "create_ticket", json!({"priority": "urgent"}))
            .await
            .unwrap();
        assert_eq!(result.stage, Stage::Resolution);
        assert!(result.response.contains("TKT-1001"));

        let result = invoke(&state, id, "escalate_ticket", json!({"specialist_type": "billing"}))
            .await
            .unwrap();
        assert_eq!(result.status, SessionStatus::Ended);

        let Json(session) = get_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(session.status, SessionStatus::Ended);
        assert_eq!(session.global_data["ticket_status"], "escalated");
        assert_eq!(session.global_data["escalated_to"], "billing");

        let err = invoke(&state, id, "get_status", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let status = close_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(matches!(
            get_session(State(state.clone()), Path(id)).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_workflow_errors_map_to_status_codes() {
        let state = app_state();
        let id = open(&state, None).await;

        let err = invoke(&state, id, "teleport", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = invoke(&state, id, "resolve_ticket", json!({"resolution_notes": "x"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::CONFLICT
        );

        let err = invoke(&state, id, "identify_customer", json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let err = invoke(&state, Uuid::new_v4(), "get_status", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(message) if message.contains("not found")));
    }

    #[tokio::test]
    async fn test_open_session_without_body() {
        let state = app_state();
        let (_, Json(session)) = open_session(State(state.clone()), None).await.unwrap();
        assert!(session.caller_number.is_none());
        assert_eq!(session.stage, Stage::Greeting);
    }

    #[tokio::test]
    async fn test_list_actions() {
        let state = app_state();

        let Json(all) = list_actions(State(state.clone()), Query(ActionsQuery { stage: None }))
            .await
            .unwrap();
        assert_eq!(all.len(), 10);

        let Json(triage) = list_actions(
            State(state.clone()),
            Query(ActionsQuery {
                stage: Some("triage".to_string()),
            }),
        )
        .await
        .unwrap();
        let names: Vec<String> = triage.iter().map(|a| a.name.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "describe_issue",
                "create_ticket",
                "check_knowledge_base",
                "secure_mode",
                "end_secure_mode"
            ]
        );

        let err = list_actions(
            State(state),
            Query(ActionsQuery {
                stage: Some("closing".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_get_profile_uses_configured_route() {
        let config = Config {
            route: "/helpdesk".to_string(),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config, AgentProfile::default()));

        let Json(profile) = get_profile(State(state)).await;
        assert_eq!(profile.route, "/helpdesk");
        assert_eq!(profile.name, "techsupport-agent");
    }
}
