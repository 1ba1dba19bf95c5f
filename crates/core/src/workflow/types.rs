//! Workflow domain types.
//!
//! A workflow is a declarative state machine attached to a transaction type.
//! The document format is a JSON list of workflows; `states` maps each
//! from-state to its outgoing edges, and each edge names the signatory roles
//! allowed to trigger it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a transaction that has been built but not validated.
pub const STATE_INITIATED: &str = "init";

/// State of a validated transaction awaiting its author's confirmation.
pub const STATE_VALIDATED: &str = "validated";

/// Conventional state counted in pending balances.
pub const STATE_PENDING: &str = "pending";

/// Conventional state counted in completed balances.
pub const STATE_COMPLETED: &str = "completed";

/// Who may initiate a transaction of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The payee requests payment.
    #[serde(rename = "bill")]
    Bill,
    /// The payer pays.
    #[serde(rename = "credit")]
    Credit,
    /// Anyone may record it.
    #[serde(rename = "3rdparty")]
    ThirdParty,
}

impl Direction {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bill => "bill",
            Self::Credit => "credit",
            Self::ThirdParty => "3rdparty",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role that may sign a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signatory {
    /// Whoever wrote the primary entry.
    Author,
    /// The primary entry's payer.
    Payer,
    /// The primary entry's payee.
    Payee,
    /// Satisfied only through the admin override.
    Admin,
}

/// The first step of a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creation {
    /// State the transaction enters once confirmed.
    pub state: String,
    /// Whether the author must confirm before that state is written.
    #[serde(default)]
    pub confirm: bool,
}

/// One edge of the state graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Roles allowed to trigger the edge.
    pub signatories: Vec<Signatory>,
}

/// A workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Transaction type id.
    pub id: String,
    /// Human readable name.
    #[serde(default)]
    pub label: String,
    /// Inactive workflows cannot start new transactions.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Who may initiate.
    pub direction: Direction,
    /// Initial state and confirmation rule.
    pub creation: Creation,
    /// from-state to to-state to required roles.
    pub states: BTreeMap<String, BTreeMap<String, Transition>>,
}

fn default_active() -> bool {
    true
}

/// The facts about a transaction that signatory roles are checked against.
#[derive(Debug, Clone, Copy)]
pub struct Parties<'a> {
    /// Current state.
    pub state: &'a str,
    /// Author of the primary entry.
    pub author: &'a str,
    /// Payee id of the primary entry.
    pub payee: &'a str,
    /// Payer id of the primary entry.
    pub payer: &'a str,
}

impl Parties<'_> {
    /// Whether `actor` holds `role` on this transaction.
    #[must_use]
    pub fn holds(&self, actor: &str, role: Signatory) -> bool {
        match role {
            Signatory::Author => actor == self.author,
            Signatory::Payer => actor == self.payer,
            Signatory::Payee => actor == self.payee,
            Signatory::Admin => false,
        }
    }
}
