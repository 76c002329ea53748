//! Reference Directories
//!
//! Read-only lookup data shared by every conversation: the customer directory
//! used to identify callers, and the specialist directory used when a ticket
//! is escalated. Both are built once at startup and never mutated.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Service tier of a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Premium,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Standard => write!(f, "standard"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

/// A customer record as stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub tier: Tier,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tier: Tier) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier,
        }
    }
}

/// Normalizes a caller-supplied email address or phone number for lookup.
///
/// Surrounding whitespace is trimmed, letters are lowercased, and the
/// separators people tend to speak or type into phone numbers (spaces,
/// dashes, parentheses) are removed.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

/// Customer lookup keyed by normalized email address or phone number.
#[derive(Debug, Clone)]
pub struct CustomerDirectory {
    customers: HashMap<String, Customer>,
}

impl CustomerDirectory {
    /// Builds a directory from `(identifier, customer)` pairs. Identifiers are
    /// normalized on insertion so lookups and keys agree.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Customer)>,
        S: AsRef<str>,
    {
        let customers = entries
            .into_iter()
            .map(|(key, customer)| (normalize_identifier(key.as_ref()), customer))
            .collect();
        Self { customers }
    }

    /// Looks up a customer by email address or phone number.
    ///
    /// Digit-only input is also tried as an E.164 number, first with a bare
    /// `+` prefix and then with the `+1` country code, so a caller reading out
    /// "555 123 4567" still matches `+15551234567`.
    pub fn identify(&self, identifier: &str) -> Option<&Customer> {
        self.lookup(identifier).map(|(_, customer)| customer)
    }

    /// Like [`identify`](Self::identify), but also returns the directory key
    /// that matched. The key is the canonical form of the identifier, e.g. the
    /// full E.164 number when the caller gave bare digits.
    pub fn lookup(&self, identifier: &str) -> Option<(&str, &Customer)> {
        let normalized = normalize_identifier(identifier);
        if normalized.is_empty() {
            return None;
        }
        let mut candidates = vec![normalized.clone()];
        if normalized.chars().all(|c| c.is_ascii_digit()) {
            candidates.push(format!("+{normalized}"));
            candidates.push(format!("+1{normalized}"));
        }
        candidates.iter().find_map(|key| {
            self.customers
                .get_key_value(key)
                .map(|(key, customer)| (key.as_str(), customer))
        })
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new([
            (
                "john@example.com",
                Customer::new("C001", "John Smith", Tier::Premium),
            ),
            (
                "+15551234567",
                Customer::new("C002", "Jane Doe", Tier::Standard),
            ),
            (
                "mike@example.com",
                Customer::new("C003", "Mike Wilson", Tier::Premium),
            ),
        ])
    }
}

/// The kinds of specialist a ticket can be escalated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistCategory {
    Billing,
    Technical,
    Account,
}

impl SpecialistCategory {
    /// Parses a category name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "billing" => Some(Self::Billing),
            "technical" => Some(Self::Technical),
            "account" => Some(Self::Account),
            _ => None,
        }
    }

    /// Resolves any input to a category, falling back to `Technical`.
    pub fn resolve(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Technical)
    }
}

impl fmt::Display for SpecialistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialistCategory::Billing => write!(f, "billing"),
            SpecialistCategory::Technical => write!(f, "technical"),
            SpecialistCategory::Account => write!(f, "account"),
        }
    }
}

/// Contact numbers for each specialist desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistDirectory {
    pub billing: String,
    pub technical: String,
    pub account: String,
}

impl SpecialistDirectory {
    pub fn contact(&self, category: SpecialistCategory) -> &str {
        match category {
            SpecialistCategory::Billing => &self.billing,
            SpecialistCategory::Technical => &self.technical,
            SpecialistCategory::Account => &self.account,
        }
    }

    /// Returns the contact for a category name. Unknown categories are routed
    /// to the technical desk.
    pub fn route(&self, category: &str) -> &str {
        self.contact(SpecialistCategory::resolve(category))
    }
}

impl Default for SpecialistDirectory {
    fn default() -> Self {
        Self {
            billing: "+15551111111".to_string(),
            technical: "+15552222222".to_string(),
            account: "+15553333333".to_string(),
        }
    }
}
