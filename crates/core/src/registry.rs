//! Action Registry
//!
//! Maps each [`Action`] to a typed handler and the JSON schema of its
//! arguments. The registry is built once at startup and shared read-only by
//! every conversation.

use crate::actions::{self, NoArgs};
use crate::session::SessionState;
use crate::workflow::{Action, ActionContext, ActionOutcome, Stage, WorkflowError};
use schemars::{JsonSchema, Schema, schema_for};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type Handler = Box<
    dyn Fn(&ActionContext<'_>, &SessionState, Value) -> Result<ActionOutcome, serde_json::Error>
        + Send
        + Sync,
>;

/// Declaration of an action as advertised to the hosting runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSpec {
    pub name: Action,
    pub description: &'static str,
    pub parameters: Schema,
    /// Secure actions are run with call recording suppressed by the runtime.
    pub secure: bool,
    pub stages: Vec<Stage>,
}

struct RegisteredAction {
    spec: ActionSpec,
    handler: Handler,
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<Action, RegisteredAction>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler whose arguments deserialize into `A`. The argument
    /// schema is derived from `A`. Registering an action twice replaces the
    /// earlier handler.
    pub fn register<A, F>(&mut self, action: Action, description: &'static str, handler: F) -> &mut Self
    where
        A: DeserializeOwned + JsonSchema + 'static,
        F: Fn(&ActionContext<'_>, &SessionState, A) -> ActionOutcome + Send + Sync + 'static,
    {
        let spec = ActionSpec {
            name: action,
            description,
            parameters: schema_for!(A),
            secure: false,
            stages: action.stages(),
        };
        let handler: Handler = Box::new(
            move |ctx: &ActionContext<'_>, session: &SessionState, args: Value| {
                let args: A = serde_json::from_value(args)?;
                Ok(handler(ctx, session, args))
            },
        );
        self.actions.insert(action, RegisteredAction { spec, handler });
        self
    }

    /// Marks an already registered action as secure.
    pub fn mark_secure(&mut self, action: Action) -> &mut Self {
        if let Some(entry) = self.actions.get_mut(&action) {
            entry.spec.secure = true;
        }
        self
    }

    /// The registry of standard support actions.
    pub fn with_support_actions() -> Self {
        let mut registry = Self::new();
        registry
            .register(
                Action::IdentifyCustomer,
                "Identify customer by email or phone number",
                actions::identify_customer,
            )
            .register(
                Action::GetStatus,
                "Get system status, or the status of a ticket by ID",
                actions::get_status,
            )
            .register(
                Action::DescribeIssue,
                "Record details about the customer's issue",
                actions::describe_issue,
            )
            .register(
                Action::CreateTicket,
                "Create a support ticket",
                actions::create_ticket,
            )
            .register(
                Action::CheckKnowledgeBase,
                "Search knowledge base for solutions",
                actions::check_knowledge_base,
            )
            .register(
                Action::ResolveTicket,
                "Mark ticket as resolved",
                actions::resolve_ticket,
            )
            .register(
                Action::EscalateTicket,
                "Escalate ticket to a specialist",
                actions::escalate_ticket,
            )
            .register(
                Action::ScheduleCallback,
                "Schedule a callback from support",
                actions::schedule_callback,
            )
            .register::<NoArgs, _>(
                Action::SecureMode,
                "Enter secure mode - pauses recording for sensitive data",
                actions::secure_mode,
            )
            .register::<NoArgs, _>(
                Action::EndSecureMode,
                "Leave secure mode - resumes recording",
                actions::end_secure_mode,
            )
            .mark_secure(Action::SecureMode);
        registry
    }

    pub fn spec(&self, action: Action) -> Option<&ActionSpec> {
        self.actions.get(&action).map(|entry| &entry.spec)
    }

    /// All registered specs, ordered by action.
    pub fn specs(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.values().map(|entry| &entry.spec)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn dispatch(
        &self,
        action: Action,
        ctx: &ActionContext<'_>,
        session: &SessionState,
        args: Value,
    ) -> Result<ActionOutcome, WorkflowError> {
        let entry = self
            .actions
            .get(&action)
            .ok_or_else(|| WorkflowError::UnknownAction(action.to_string()))?;
        // Runtimes send `null` for argument-less calls.
        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        (entry.handler)(ctx, session, args)
            .map_err(|source| WorkflowError::InvalidArguments { action, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{CustomerDirectory, SpecialistDirectory};
    use crate::knowledge::KnowledgeBase;
    use crate::ticket::SequentialTicketIds;
    use serde_json::json;

    #[test]
    fn test_support_registry_covers_every_action() {
        let registry = ActionRegistry::with_support_actions();
        assert_eq!(registry.len(), Action::ALL.len());
        for action in Action::ALL {
            assert!(registry.spec(action).is_some(), "missing {action}");
        }
    }

    #[test]
    fn test_schemas_declare_required_fields_and_enums() {
        let registry = ActionRegistry::with_support_actions();

        let spec = registry.spec(Action::CreateTicket).unwrap();
        let schema = serde_json::to_value(&spec.parameters).unwrap();
        assert_eq!(schema["required"], json!(["priority"]));
        let rendered = schema.to_string();
        for value in ["low", "medium", "high", "urgent"] {
            assert!(rendered.contains(&format!("\"{value}\"")), "missing {value}");
        }

        let spec = registry.spec(Action::GetStatus).unwrap();
        let schema = serde_json::to_value(&spec.parameters).unwrap();
        assert!(schema.get("required").is_none_or(|r| r == &json!([])));
        assert!(schema["properties"]["ticket_id"].is_object());

        let spec = registry.spec(Action::EscalateTicket).unwrap();
        let rendered = serde_json::to_string(&spec.parameters).unwrap();
        assert!(rendered.contains("\"billing\""));
        assert!(rendered.contains("\"account\""));
    }

    #[test]
    fn test_secure_flag_and_stages() {
        let registry = ActionRegistry::with_support_actions();

        assert!(registry.spec(Action::SecureMode).unwrap().secure);
        assert!(!registry.spec(Action::EndSecureMode).unwrap().secure);
        assert_eq!(
            registry.spec(Action::IdentifyCustomer).unwrap().stages,
            vec![Stage::Greeting]
        );
    }

    #[test]
    fn test_custom_registration_and_dispatch() {
        let mut registry = ActionRegistry::new();
        registry.register::<NoArgs, _>(Action::GetStatus, "Always busy", |_, _, _| {
            ActionOutcome::say("All lines are busy.")
        });

        let customers = CustomerDirectory::default();
        let specialists = SpecialistDirectory::default();
        let knowledge = KnowledgeBase::default();
        let ids = SequentialTicketIds::default();
        let ctx = ActionContext {
            customers: &customers,
            specialists: &specialists,
            knowledge: &knowledge,
            ticket_ids: &ids,
        };

        let outcome = registry
            .dispatch(Action::GetStatus, &ctx, &SessionState::new(), Value::Null)
            .unwrap();
        assert_eq!(outcome.response, "All lines are busy.");

        let err = registry
            .dispatch(Action::CreateTicket, &ctx, &SessionState::new(), json!({}))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownAction(name) if name == "create_ticket"));
    }

    #[test]
    fn test_spec_serialization() {
        let registry = ActionRegistry::with_support_actions();
        let spec = registry.spec(Action::IdentifyCustomer).unwrap();
        let value = serde_json::to_value(spec).unwrap();

        assert_eq!(value["name"], "identify_customer");
        assert_eq!(value["stages"], json!(["greeting"]));
        assert_eq!(value["parameters"]["required"], json!(["identifier"]));
    }
}
