//! Per-Conversation Session State
//!
//! Each conversation owns one `SessionState`. Actions never mutate it
//! directly; they return a `StateDelta` which the workflow engine applies
//! after the action completes.

use crate::directory::{Customer, SpecialistCategory};
use crate::ticket::{Issue, Ticket};
use crate::workflow::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A customer matched during the greeting stage, together with the
/// identifier they gave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedCustomer {
    pub customer: Customer,
    pub contact: String,
}

impl IdentifiedCustomer {
    /// The contact identifier if it is a phone number.
    pub fn phone(&self) -> Option<&str> {
        let is_phone = self.contact.starts_with('+')
            && self.contact.len() > 1
            && self.contact[1..].chars().all(|c| c.is_ascii_digit());
        is_phone.then_some(self.contact.as_str())
    }
}

/// Changes an action asks to make to the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<IdentifiedCustomer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_paused: Option<bool>,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Mutable state scoped to a single conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    stage: Stage,
    ended: bool,
    caller_number: Option<String>,
    customer: Option<IdentifiedCustomer>,
    issue: Option<Issue>,
    ticket: Option<Ticket>,
    callback: Option<String>,
    recording_paused: bool,
}

impl SessionState {
    /// A fresh conversation in the greeting stage.
    pub fn new() -> Self {
        Self {
            stage: Stage::Greeting,
            ended: false,
            caller_number: None,
            customer: None,
            issue: None,
            ticket: None,
            callback: None,
            recording_paused: false,
        }
    }

    /// A fresh conversation for a caller whose number the runtime knows.
    pub fn for_caller(caller_number: impl Into<String>) -> Self {
        Self {
            caller_number: Some(caller_number.into()),
            ..Self::new()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn caller_number(&self) -> Option<&str> {
        self.caller_number.as_deref()
    }

    pub fn customer(&self) -> Option<&IdentifiedCustomer> {
        self.customer.as_ref()
    }

    pub fn issue(&self) -> Option<&Issue> {
        self.issue.as_ref()
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    pub fn is_recording_paused(&self) -> bool {
        self.recording_paused
    }

    /// The phone number text confirmations go to: the number the call came
    /// from, else the phone number the customer identified with. `None` when
    /// neither is known, e.g. a customer identified by email on a withheld
    /// number.
    pub fn notification_target(&self) -> Option<&str> {
        self.caller_number()
            .or_else(|| self.customer.as_ref().and_then(IdentifiedCustomer::phone))
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn end(&mut self) {
        self.ended = true;
    }

    /// Applies a delta. Identifying a customer starts a new support cycle,
    /// so the issue, ticket and callback of any earlier cycle are dropped
    /// before the rest of the delta lands.
    pub(crate) fn apply(&mut self, delta: StateDelta) {
        if let Some(customer) = delta.customer {
            self.customer = Some(customer);
            self.issue = None;
            self.ticket = None;
            self.callback = None;
        }
        if let Some(issue) = delta.issue {
            self.issue = Some(issue);
        }
        if let Some(ticket) = delta.ticket {
            self.ticket = Some(ticket);
        }
        if let Some(callback) = delta.callback {
            self.callback = Some(callback);
        }
        if let Some(paused) = delta.recording_paused {
            self.recording_paused = paused;
        }
    }

    /// Flattens the session into the key-value view the hosting runtime sees
    /// as its global data.
    pub fn global_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("stage".into(), json!(self.stage));
        data.insert("customer_identified".into(), json!(self.customer.is_some()));
        data.insert("ticket_created".into(), json!(self.ticket.is_some()));
        data.insert("recording_paused".into(), json!(self.recording_paused));

        if let Some(number) = &self.caller_number {
            data.insert("caller_number".into(), json!(number));
        }
        if let Some(identified) = &self.customer {
            data.insert("customer_id".into(), json!(identified.customer.id));
            data.insert("customer_name".into(), json!(identified.customer.name));
            data.insert("customer_tier".into(), json!(identified.customer.tier));
            if let Some(phone) = identified.phone() {
                data.insert("customer_phone".into(), json!(phone));
            }
        }
        if let Some(issue) = &self.issue {
            data.insert("issue_type".into(), json!(issue.issue_type));
            data.insert("issue_description".into(), json!(issue.description));
        }
        if let Some(ticket) = &self.ticket {
            data.insert("ticket_id".into(), json!(ticket.id));
            data.insert("ticket_priority".into(), json!(ticket.priority));
            data.insert("ticket_status".into(), json!(ticket.status));
            if let Some(notes) = &ticket.resolution_notes {
                data.insert("resolution_notes".into(), json!(notes));
            }
            if let Some(category) = ticket.escalated_to {
                data.insert("escalated_to".into(), json!(category));
            }
        }
        if let Some(time) = &self.callback {
            data.insert("callback_scheduled".into(), json!(time));
        }
        data
    }

    pub fn escalated_to(&self) -> Option<SpecialistCategory> {
        self.ticket.as_ref().and_then(|t| t.escalated_to)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Tier;
    use crate::ticket::{IssueType, Priority, TicketStatus};

    fn jane() -> IdentifiedCustomer {
        IdentifiedCustomer {
            customer: Customer::new("C002", "Jane Doe", Tier::Standard),
            contact: "+15551234567".to_string(),
        }
    }

    #[test]
    fn test_new_session_starts_in_greeting() {
        let session = SessionState::new();
        assert_eq!(session.stage(), Stage::Greeting);
        assert!(!session.is_ended());
        assert!(session.customer().is_none());
        assert!(session.ticket().is_none());
    }

    #[test]
    fn test_apply_delta_only_touches_present_fields() {
        let mut session = SessionState::new();
        session.apply(StateDelta {
            customer: Some(jane()),
            ..Default::default()
        });
        session.apply(StateDelta {
            ticket: Some(Ticket::open("TKT-1001", Priority::High)),
            ..Default::default()
        });

        assert_eq!(session.customer().unwrap().customer.id, "C002");
        assert_eq!(session.ticket().unwrap().status, TicketStatus::Open);
        assert!(session.issue().is_none());
    }

    #[test]
    fn test_global_data_view() {
        let mut session = SessionState::new();
        session.apply(StateDelta {
            customer: Some(jane()),
            ticket: Some(Ticket::open("TKT-1001", Priority::Urgent)),
            ..Default::default()
        });

        let data = session.global_data();
        assert_eq!(data["customer_id"], "C002");
        assert_eq!(data["customer_tier"], "standard");
        assert_eq!(data["customer_phone"], "+15551234567");
        assert_eq!(data["ticket_id"], "TKT-1001");
        assert_eq!(data["ticket_priority"], "urgent");
        assert_eq!(data["ticket_status"], "open");
        assert_eq!(data["ticket_created"], true);
        assert_eq!(data["stage"], "greeting");
        assert!(!data.contains_key("escalated_to"));
    }

    #[test]
    fn test_notification_target_preference() {
        let mut session = SessionState::new();
        assert_eq!(session.notification_target(), None);

        session.apply(StateDelta {
            customer: Some(IdentifiedCustomer {
                customer: Customer::new("C001", "John Smith", Tier::Premium),
                contact: "john@example.com".to_string(),
            }),
            ..Default::default()
        });
        assert_eq!(session.notification_target(), None);

        session.apply(StateDelta {
            customer: Some(jane()),
            ..Default::default()
        });
        assert_eq!(session.notification_target(), Some("+15551234567"));

        let mut from_caller = SessionState::for_caller("+15559990000");
        from_caller.apply(StateDelta {
            customer: Some(jane()),
            ..Default::default()
        });
        assert_eq!(from_caller.notification_target(), Some("+15559990000"));
    }

    #[test]
    fn test_identification_starts_a_new_cycle() {
        let mut session = SessionState::new();
        session.apply(StateDelta {
            customer: Some(jane()),
            ..Default::default()
        });
        session.apply(StateDelta {
            issue: Some(Issue {
                issue_type: IssueType::Login,
                description: "Locked out".to_string(),
            }),
            ticket: Some(Ticket::open("TKT-1001", Priority::High)),
            callback: Some("noon".to_string()),
            recording_paused: Some(true),
            ..Default::default()
        });

        session.apply(StateDelta {
            customer: Some(IdentifiedCustomer {
                customer: Customer::new("C003", "Mike Wilson", Tier::Premium),
                contact: "mike@example.com".to_string(),
            }),
            ..Default::default()
        });

        assert!(session.issue().is_none());
        assert!(session.ticket().is_none());
        assert!(session.callback().is_none());
        assert!(session.is_recording_paused());
        let data = session.global_data();
        assert_eq!(data["customer_id"], "C003");
        assert_eq!(data["ticket_created"], false);
        assert!(!data.contains_key("ticket_id"));
        assert!(!data.contains_key("issue_type"));
        assert!(!data.contains_key("callback_scheduled"));
    }

    #[test]
    fn test_empty_delta() {
        assert!(StateDelta::default().is_empty());
        let delta = StateDelta {
            recording_paused: Some(true),
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }
}
