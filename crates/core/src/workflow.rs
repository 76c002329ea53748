//! Conversation Workflow
//!
//! The support conversation moves through three stages:
//!
//! ```text
//! greeting --identify_customer--> triage --create_ticket--> resolution
//!    ^                                                          |
//!    +-------------------------resolve_ticket-------------------+
//! ```
//!
//! Escalation ends the conversation from `resolution`. Each stage permits a
//! fixed set of actions; a few privacy actions are permitted everywhere.
//! Actions are pure functions returning an [`ActionOutcome`]; the
//! [`WorkflowEngine`] checks stage gating, dispatches through the
//! [`ActionRegistry`], and applies the outcome to the session.

use crate::Intent;
use crate::directory::{CustomerDirectory, SpecialistDirectory};
use crate::knowledge::KnowledgeBase;
use crate::registry::{ActionRegistry, ActionSpec};
use crate::session::{SessionState, StateDelta};
use crate::ticket::{SequentialTicketIds, TicketIdSource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A named phase of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Greeting,
    Triage,
    Resolution,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Greeting, Stage::Triage, Stage::Resolution];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::Triage => "triage",
            Stage::Resolution => "resolution",
        }
    }

    /// Actions specific to this stage, excluding the ones permitted everywhere.
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Stage::Greeting => &[Action::IdentifyCustomer, Action::GetStatus],
            Stage::Triage => &[
                Action::DescribeIssue,
                Action::CreateTicket,
                Action::CheckKnowledgeBase,
            ],
            Stage::Resolution => &[
                Action::ResolveTicket,
                Action::EscalateTicket,
                Action::ScheduleCallback,
            ],
        }
    }

    pub fn permits(&self, action: Action) -> bool {
        action.is_global() || self.actions().contains(&action)
    }

    /// Stages this one may hand over to.
    pub fn valid_next(&self) -> &'static [Stage] {
        match self {
            Stage::Greeting => &[Stage::Triage],
            Stage::Triage => &[Stage::Resolution, Stage::Greeting],
            Stage::Resolution => &[Stage::Greeting],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| WorkflowError::UnknownStage(s.to_string()))
    }
}

/// Every action the workflow exposes to the hosting runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    IdentifyCustomer,
    GetStatus,
    DescribeIssue,
    CreateTicket,
    CheckKnowledgeBase,
    ResolveTicket,
    EscalateTicket,
    ScheduleCallback,
    SecureMode,
    EndSecureMode,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::IdentifyCustomer,
        Action::GetStatus,
        Action::DescribeIssue,
        Action::CreateTicket,
        Action::CheckKnowledgeBase,
        Action::ResolveTicket,
        Action::EscalateTicket,
        Action::ScheduleCallback,
        Action::SecureMode,
        Action::EndSecureMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::IdentifyCustomer => "identify_customer",
            Action::GetStatus => "get_status",
            Action::DescribeIssue => "describe_issue",
            Action::CreateTicket => "create_ticket",
            Action::CheckKnowledgeBase => "check_knowledge_base",
            Action::ResolveTicket => "resolve_ticket",
            Action::EscalateTicket => "escalate_ticket",
            Action::ScheduleCallback => "schedule_callback",
            Action::SecureMode => "secure_mode",
            Action::EndSecureMode => "end_secure_mode",
        }
    }

    /// Recording controls stay reachable in every stage.
    pub fn is_global(&self) -> bool {
        matches!(self, Action::SecureMode | Action::EndSecureMode)
    }

    /// Stages in which this action may be invoked.
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| stage.permits(*self))
            .collect()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s.trim())
            .ok_or_else(|| WorkflowError::UnknownAction(s.to_string()))
    }
}

/// Errors in how the runtime drives the workflow. Lookup misses and other
/// user mistakes are not errors; they produce conversational responses.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Unknown action: '{0}'")]
    UnknownAction(String),
    #[error("Unknown stage: '{0}'")]
    UnknownStage(String),
    #[error("Action '{action}' is not available in the {stage} stage")]
    NotPermitted { action: Action, stage: Stage },
    #[error("Invalid arguments for '{action}': {source}")]
    InvalidArguments {
        action: Action,
        #[source]
        source: serde_json::Error,
    },
    #[error("The conversation has ended")]
    ConversationEnded,
}

/// How the workflow moves after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(Stage),
    End,
}

/// The result of a single action, before it is applied to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub response: String,
    pub delta: StateDelta,
    pub intents: Vec<Intent>,
    pub transition: Option<Transition>,
}

impl ActionOutcome {
    pub fn say(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delta: StateDelta::default(),
            intents: vec![],
            transition: None,
        }
    }

    pub fn with_delta(mut self, delta: StateDelta) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    pub fn switch_to(mut self, stage: Stage) -> Self {
        self.transition = Some(Transition::To(stage));
        self
    }

    pub fn end_conversation(mut self) -> Self {
        self.transition = Some(Transition::End);
        self
    }
}

/// What the runtime receives after an action has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub action: Action,
    pub response: String,
    pub delta: StateDelta,
    pub intents: Vec<Intent>,
    pub stage: Stage,
    pub ended: bool,
}

/// Read-only collaborators an action may consult.
pub struct ActionContext<'a> {
    pub customers: &'a CustomerDirectory,
    pub specialists: &'a SpecialistDirectory,
    pub knowledge: &'a KnowledgeBase,
    pub ticket_ids: &'a dyn TicketIdSource,
}

/// Drives conversations: gates actions by stage, dispatches them, and applies
/// their outcomes. One engine is shared by all conversations; each
/// conversation brings its own `SessionState`.
#[derive(Clone)]
pub struct WorkflowEngine {
    registry: Arc<ActionRegistry>,
    customers: Arc<CustomerDirectory>,
    specialists: Arc<SpecialistDirectory>,
    knowledge: Arc<KnowledgeBase>,
    ticket_ids: Arc<dyn TicketIdSource>,
}

impl WorkflowEngine {
    pub fn new(
        registry: Arc<ActionRegistry>,
        customers: Arc<CustomerDirectory>,
        specialists: Arc<SpecialistDirectory>,
        knowledge: Arc<KnowledgeBase>,
        ticket_ids: Arc<dyn TicketIdSource>,
    ) -> Self {
        Self {
            registry,
            customers,
            specialists,
            knowledge,
            ticket_ids,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Specs of the actions callable in a stage.
    pub fn available_actions(&self, stage: Stage) -> Vec<&ActionSpec> {
        self.registry
            .specs()
            .filter(|spec| stage.permits(spec.name))
            .collect()
    }

    /// Invokes an action by its wire name.
    pub fn invoke(
        &self,
        session: &mut SessionState,
        name: &str,
        args: Value,
    ) -> Result<ActionResponse, WorkflowError> {
        let action = name.parse::<Action>()?;
        self.invoke_action(session, action, args)
    }

    pub fn invoke_action(
        &self,
        session: &mut SessionState,
        action: Action,
        args: Value,
    ) -> Result<ActionResponse, WorkflowError> {
        if session.is_ended() {
            warn!(%action, "Action invoked after the conversation ended");
            return Err(WorkflowError::ConversationEnded);
        }
        let stage = session.stage();
        if !stage.permits(action) {
            warn!(%action, %stage, "Action not permitted in current stage");
            return Err(WorkflowError::NotPermitted { action, stage });
        }

        let ctx = ActionContext {
            customers: &self.customers,
            specialists: &self.specialists,
            knowledge: &self.knowledge,
            ticket_ids: self.ticket_ids.as_ref(),
        };
        let outcome = self.registry.dispatch(action, &ctx, session, args)?;
        debug!(%action, ?outcome, "Action produced outcome");

        let ActionOutcome {
            response,
            delta,
            mut intents,
            transition,
        } = outcome;
        session.apply(delta.clone());

        match transition {
            Some(Transition::To(next)) if next != stage => {
                session.set_stage(next);
                intents.push(Intent::SwitchStage { stage: next });
                info!(%action, from = %stage, to = %next, "Workflow stage changed");
            }
            Some(Transition::End) => {
                session.end();
                info!(%action, %stage, "Conversation ended by action");
            }
            _ => {}
        }

        Ok(ActionResponse {
            action,
            response,
            delta,
            intents,
            stage: session.stage(),
            ended: session.is_ended(),
        })
    }
}

impl Default for WorkflowEngine {
    /// An engine over the built-in directories, knowledge base and the
    /// standard support actions.
    fn default() -> Self {
        Self::new(
            Arc::new(ActionRegistry::with_support_actions()),
            Arc::new(CustomerDirectory::default()),
            Arc::new(SpecialistDirectory::default()),
            Arc::new(KnowledgeBase::default()),
            Arc::new(SequentialTicketIds::default()),
        )
    }
}
