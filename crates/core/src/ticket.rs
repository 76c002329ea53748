use crate::directory::SpecialistCategory;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Default base for ticket numbers; the first ticket issued is `TKT-1001`.
pub const DEFAULT_TICKET_BASE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Parses a priority, degrading anything unrecognised to `Medium`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Resolved,
    Escalated,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Resolved => write!(f, "resolved"),
            TicketStatus::Escalated => write!(f, "escalated"),
        }
    }
}

/// Broad category of a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Login,
    Performance,
    Technical,
    Billing,
    Account,
    #[default]
    Other,
}

impl IssueType {
    /// Parses an issue type, degrading anything unrecognised to `Other`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "login" => Self::Login,
            "performance" => Self::Performance,
            "technical" => Self::Technical,
            "billing" => Self::Billing,
            "account" => Self::Account,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueType::Login => "login",
            IssueType::Performance => "performance",
            IssueType::Technical => "technical",
            IssueType::Billing => "billing",
            IssueType::Account => "account",
            IssueType::Other => "other",
        };
        f.write_str(name)
    }
}

/// The issue a caller described during triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_type: IssueType,
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("Ticket {id} is already {status}")]
    AlreadyClosed { id: String, status: TicketStatus },
}

/// A support ticket. Lives as long as the conversation that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub resolution_notes: Option<String>,
    pub escalated_to: Option<SpecialistCategory>,
}

impl Ticket {
    /// Creates a new ticket in the `Open` state.
    pub fn open(id: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            priority,
            status: TicketStatus::Open,
            resolution_notes: None,
            escalated_to: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }

    fn ensure_open(&self) -> Result<(), TicketError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TicketError::AlreadyClosed {
                id: self.id.clone(),
                status: self.status,
            })
        }
    }

    /// Returns a copy of this ticket marked resolved with the given notes.
    pub fn resolved(&self, notes: impl Into<String>) -> Result<Self, TicketError> {
        self.ensure_open()?;
        Ok(Self {
            status: TicketStatus::Resolved,
            resolution_notes: Some(notes.into()),
            ..self.clone()
        })
    }

    /// Returns a copy of this ticket marked escalated to a specialist desk.
    pub fn escalated(&self, category: SpecialistCategory) -> Result<Self, TicketError> {
        self.ensure_open()?;
        Ok(Self {
            status: TicketStatus::Escalated,
            escalated_to: Some(category),
            ..self.clone()
        })
    }
}

/// Source of ticket identifiers.
///
/// Identifiers must be unique within one running process. Implementations are
/// shared by every conversation, so they must be safe to call concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait TicketIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Issues `TKT-<n>` identifiers from a monotonically increasing counter.
#[derive(Debug)]
pub struct SequentialTicketIds {
    last: AtomicU64,
}

impl SequentialTicketIds {
    /// Creates a generator whose first identifier is `base + 1`.
    pub fn starting_after(base: u64) -> Self {
        Self {
            last: AtomicU64::new(base),
        }
    }
}

impl Default for SequentialTicketIds {
    fn default() -> Self {
        Self::starting_after(DEFAULT_TICKET_BASE)
    }
}

impl TicketIdSource for SequentialTicketIds {
    fn next_id(&self) -> String {
        let n = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        format!("TKT-{n}")
    }
}
