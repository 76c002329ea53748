//! Support Actions
//!
//! The handlers behind each workflow action, together with their argument
//! types. Handlers are pure: they read the session and the shared
//! directories, and describe what should change in an [`ActionOutcome`].
//! They never fail; unknown customers, unknown ticket ids and missing
//! tickets all produce a conversational response instead.

use crate::Intent;
use crate::directory::SpecialistCategory;
use crate::session::{IdentifiedCustomer, SessionState, StateDelta};
use crate::ticket::{Issue, IssueType, Priority, Ticket};
use crate::workflow::{ActionContext, ActionOutcome, Stage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentifyCustomerArgs {
    /// Customer email or phone number.
    pub identifier: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetStatusArgs {
    /// Ticket ID to look up. Omit for overall system status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DescribeIssueArgs {
    /// Type of issue.
    #[schemars(with = "IssueType")]
    pub issue_type: String,
    /// Description of the issue.
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTicketArgs {
    /// Ticket priority.
    #[schemars(with = "Priority")]
    pub priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckKnowledgeBaseArgs {
    /// Search query.
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveTicketArgs {
    /// Notes about how the issue was resolved.
    pub resolution_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EscalateTicketArgs {
    /// Type of specialist needed.
    #[schemars(with = "SpecialistCategory")]
    pub specialist_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleCallbackArgs {
    /// Preferred callback time.
    pub preferred_time: String,
}

/// Arguments for actions that take none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoArgs {}

const NO_OPEN_TICKET: &str = "There's no open ticket on this call yet. \
    Let's describe the issue and create a ticket first.";

pub fn identify_customer(
    ctx: &ActionContext<'_>,
    _session: &SessionState,
    args: IdentifyCustomerArgs,
) -> ActionOutcome {
    let Some((contact, customer)) = ctx.customers.lookup(&args.identifier) else {
        return ActionOutcome::say(
            "I couldn't find an account with that information. \
             Can you provide your email address or phone number?",
        );
    };

    ActionOutcome::say(format!(
        "Found customer: {} (ID: {}, Tier: {}). How can I help you today?",
        customer.name, customer.id, customer.tier
    ))
    .with_delta(StateDelta {
        customer: Some(IdentifiedCustomer {
            customer: customer.clone(),
            contact: contact.to_string(),
        }),
        ..Default::default()
    })
    .switch_to(Stage::Triage)
}

pub fn get_status(
    _ctx: &ActionContext<'_>,
    session: &SessionState,
    args: GetStatusArgs,
) -> ActionOutcome {
    let requested = args
        .ticket_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match (requested, session.ticket()) {
        (None, _) => ActionOutcome::say(
            "TechSupport Pro is fully operational. All systems are running normally.",
        ),
        (Some(id), Some(ticket)) if ticket.id.eq_ignore_ascii_case(id) => {
            ActionOutcome::say(format!(
                "Ticket {} is {} with {} priority.",
                ticket.id, ticket.status, ticket.priority
            ))
        }
        (Some(id), _) => ActionOutcome::say(format!(
            "Ticket {id} is currently being processed. \
             Would you like to speak with someone about it?"
        )),
    }
}

pub fn describe_issue(
    _ctx: &ActionContext<'_>,
    _session: &SessionState,
    args: DescribeIssueArgs,
) -> ActionOutcome {
    let issue_type = IssueType::parse_lenient(&args.issue_type);
    ActionOutcome::say(format!(
        "I've noted your {issue_type} issue. Let me create a ticket for you."
    ))
    .with_delta(StateDelta {
        issue: Some(Issue {
            issue_type,
            description: args.description.trim().to_string(),
        }),
        ..Default::default()
    })
}

pub fn create_ticket(
    ctx: &ActionContext<'_>,
    _session: &SessionState,
    args: CreateTicketArgs,
) -> ActionOutcome {
    let priority = Priority::parse_lenient(&args.priority);
    let ticket = Ticket::open(ctx.ticket_ids.next_id(), priority);

    ActionOutcome::say(format!(
        "I've created ticket {} with {} priority. Let me work on resolving this for you.",
        ticket.id, priority
    ))
    .with_delta(StateDelta {
        ticket: Some(ticket),
        ..Default::default()
    })
    .switch_to(Stage::Resolution)
}

pub fn check_knowledge_base(
    ctx: &ActionContext<'_>,
    _session: &SessionState,
    args: CheckKnowledgeBaseArgs,
) -> ActionOutcome {
    let query = args.query.trim();
    match ctx.knowledge.search(query) {
        Some(article) => ActionOutcome::say(format!(
            "I found an article about '{}': {}. Let me walk you through it: {}.",
            query,
            article.title,
            numbered(&article.steps)
        )),
        None => ActionOutcome::say(format!(
            "I searched our knowledge base for '{}'. Here are some common solutions: {}. \
             Would you like me to create a ticket if these don't help?",
            query,
            numbered(ctx.knowledge.fallback_steps())
        )),
    }
}

pub fn resolve_ticket(
    _ctx: &ActionContext<'_>,
    session: &SessionState,
    args: ResolveTicketArgs,
) -> ActionOutcome {
    let Some(ticket) = session.ticket() else {
        return ActionOutcome::say(NO_OPEN_TICKET);
    };
    let resolved = match ticket.resolved(args.resolution_notes.trim()) {
        Ok(resolved) => resolved,
        Err(err) => return ActionOutcome::say(format!("{err}. {NO_OPEN_TICKET}")),
    };

    let mut outcome = ActionOutcome::say(format!(
        "Great! I've resolved ticket {}. Is there anything else I can help you with?",
        resolved.id
    ));
    if let Some(to) = session.notification_target() {
        outcome = outcome.with_intent(Intent::SendNotification {
            to: to.to_string(),
            body: format!(
                "Your ticket {} has been resolved. Thank you for contacting TechSupport Pro!",
                resolved.id
            ),
        });
    }
    outcome
        .with_delta(StateDelta {
            ticket: Some(resolved),
            ..Default::default()
        })
        .switch_to(Stage::Greeting)
}

pub fn escalate_ticket(
    ctx: &ActionContext<'_>,
    session: &SessionState,
    args: EscalateTicketArgs,
) -> ActionOutcome {
    let Some(ticket) = session.ticket() else {
        return ActionOutcome::say(NO_OPEN_TICKET);
    };
    let category = SpecialistCategory::resolve(&args.specialist_type);
    let escalated = match ticket.escalated(category) {
        Ok(escalated) => escalated,
        Err(err) => return ActionOutcome::say(format!("{err}. {NO_OPEN_TICKET}")),
    };

    ActionOutcome::say(format!(
        "I'm transferring you to our {category} specialist now. Please hold while I connect you."
    ))
    .with_delta(StateDelta {
        ticket: Some(escalated),
        ..Default::default()
    })
    .with_intent(Intent::Connect {
        to: ctx.specialists.contact(category).to_string(),
        final_transfer: true,
    })
    .end_conversation()
}

pub fn schedule_callback(
    _ctx: &ActionContext<'_>,
    _session: &SessionState,
    args: ScheduleCallbackArgs,
) -> ActionOutcome {
    let time = args.preferred_time.trim();
    ActionOutcome::say(format!(
        "I've scheduled a callback for {time}. One of our specialists will call you then."
    ))
    .with_delta(StateDelta {
        callback: Some(time.to_string()),
        ..Default::default()
    })
}

pub fn secure_mode(
    _ctx: &ActionContext<'_>,
    _session: &SessionState,
    _args: NoArgs,
) -> ActionOutcome {
    ActionOutcome::say(
        "Recording has been paused. You can now share sensitive information safely.",
    )
    .with_delta(StateDelta {
        recording_paused: Some(true),
        ..Default::default()
    })
    .with_intent(Intent::PauseRecording)
}

pub fn end_secure_mode(
    _ctx: &ActionContext<'_>,
    _session: &SessionState,
    _args: NoArgs,
) -> ActionOutcome {
    ActionOutcome::say("Thank you. Recording has resumed.")
        .with_delta(StateDelta {
            recording_paused: Some(false),
            ..Default::default()
        })
        .with_intent(Intent::ResumeRecording)
}

fn numbered(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join(", ")
}
