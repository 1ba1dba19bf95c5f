//! Node-wide error taxonomy.
//!
//! Every failure a node can report to a caller or to a neighbor maps onto one
//! of these variants. The wire class names (`class()`) are shared by every node
//! in the tree, so an error raised three hops downstream reaches the original
//! caller with the same class it was raised with.

use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Result type alias using `CcError`.
pub type CcResult<T> = Result<T, CcError>;

/// Errors raised while serving a ledger request.
#[derive(Debug, Error)]
pub enum CcError {
    // ========== Violations (caller's fault) ==========
    /// An account, transaction or workflow could not be found.
    #[error("The {kind} '{value}' does not exist")]
    DoesNotExist {
        /// What kind of thing was looked up (account, transaction, workflow).
        kind: String,
        /// The identifier or path that failed to resolve.
        value: String,
    },

    /// Wrong credentials for an account.
    #[error("Authentication failed for account '{acc_id}'")]
    Auth {
        /// The account the caller claimed to be.
        acc_id: String,
    },

    /// The caller lacks the role for this operation.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The transaction would take an account above its max limit.
    #[error("Account '{acc}' would exceed its max limit of {limit} by {diff}")]
    MaxLimit {
        /// The offending account.
        acc: String,
        /// The configured limit.
        limit: Decimal,
        /// The projected balance.
        projected: Decimal,
        /// How far past the limit the projected balance goes.
        diff: Decimal,
    },

    /// The transaction would take an account below its min limit.
    #[error("Account '{acc}' would go below its min limit of {limit} by {diff}")]
    MinLimit {
        /// The offending account.
        acc: String,
        /// The configured limit.
        limit: Decimal,
        /// The projected balance.
        projected: Decimal,
        /// How far past the limit the projected balance goes.
        diff: Decimal,
    },

    /// The workflow graph does not allow this transition for this actor.
    #[error("Workflow '{workflow}' does not permit the transition from '{from}' to '{to}'")]
    Workflow {
        /// Workflow id (the transaction type).
        workflow: String,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Payer and payee resolved to the same account.
    #[error("Payer and payee are the same account '{acc}'")]
    SameAccount {
        /// The account on both sides.
        acc: String,
    },

    /// An intermediate node tried to originate a change on a transaction it only forwards.
    #[error("This ledger only relays the transaction and may not change its state")]
    IntermediateLedger,

    /// A request field is missing or malformed.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========== Failures (node or network fault) ==========
    /// The hash supplied by a neighbor does not continue our chain.
    #[error("Hash chain mismatch with neighbor '{acc}'")]
    HashMismatch {
        /// The neighbor's account id.
        acc: String,
    },

    /// A neighbor could not be reached during a relay.
    #[error("Node '{node}' is unavailable: {reason}")]
    UnavailableNode {
        /// The neighbor's account id.
        node: String,
        /// Transport level reason.
        reason: String,
    },

    /// A neighbor answered with an error; its body is passed on verbatim.
    #[error("Remote node returned {status}: {}", remote_message(.body))]
    Remote {
        /// HTTP status returned by the neighbor.
        status: u16,
        /// The neighbor's error envelope.
        body: Value,
    },

    /// Storage failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected internal condition.
    #[error("Internal failure: {0}")]
    Failure(String),
}

fn remote_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string()
}

impl CcError {
    /// Shorthand for a missing account.
    pub fn no_account(path: impl Into<String>) -> Self {
        Self::DoesNotExist {
            kind: "account".into(),
            value: path.into(),
        }
    }

    /// Shorthand for a missing (or invisible) transaction.
    pub fn no_transaction(uuid: impl ToString) -> Self {
        Self::DoesNotExist {
            kind: "transaction".into(),
            value: uuid.to_string(),
        }
    }

    /// Shorthand for an invalid request field.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the class name shared across the node tree.
    #[must_use]
    pub fn class(&self) -> &str {
        match self {
            Self::DoesNotExist { .. } => "DoesNotExistViolation",
            Self::Auth { .. } => "AuthViolation",
            Self::Permission(_) => "PermissionViolation",
            Self::MaxLimit { .. } => "MaxLimitViolation",
            Self::MinLimit { .. } => "MinLimitViolation",
            Self::Workflow { .. } => "WorkflowViolation",
            Self::SameAccount { .. } => "SameAccountViolation",
            Self::IntermediateLedger => "IntermediateLedgerViolation",
            Self::InvalidField { .. } => "InvalidFieldsViolation",
            Self::HashMismatch { .. } => "HashMismatchFailure",
            Self::UnavailableNode { .. } => "UnavailableNodeFailure",
            Self::Remote { body, .. } => body
                .get("class")
                .and_then(Value::as_str)
                .unwrap_or("CCFailure"),
            Self::Database(_) | Self::Failure(_) => "CCFailure",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Auth { .. }
            | Self::Permission(_)
            | Self::MaxLimit { .. }
            | Self::MinLimit { .. }
            | Self::Workflow { .. }
            | Self::SameAccount { .. }
            | Self::IntermediateLedger
            | Self::InvalidField { .. } => 400,
            Self::DoesNotExist { .. } => 404,
            Self::HashMismatch { .. } => 409,
            Self::UnavailableNode { .. } => 503,
            Self::Remote { status, .. } => *status,
            Self::Database(_) | Self::Failure(_) => 500,
        }
    }

    /// True for errors whose details must not leave the node.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Failure(_))
    }

    /// Kind-specific fields for the error envelope.
    #[must_use]
    pub fn details(&self) -> Map<String, Value> {
        let value = match self {
            Self::DoesNotExist { kind, value } => json!({ "type": kind, "value": value }),
            Self::Auth { acc_id } => json!({ "acc": acc_id }),
            Self::MaxLimit {
                acc,
                limit,
                projected,
                diff,
            }
            | Self::MinLimit {
                acc,
                limit,
                projected,
                diff,
            } => json!({
                "acc": acc,
                "limit": limit.to_string(),
                "projected": projected.to_string(),
                "diff": diff.to_string(),
            }),
            Self::Workflow { workflow, from, to } => {
                json!({ "type": workflow, "from": from, "to": to })
            }
            Self::SameAccount { acc } | Self::HashMismatch { acc } => json!({ "acc": acc }),
            Self::InvalidField { field, reason } => json!({ "field": field, "reason": reason }),
            Self::UnavailableNode { node, .. } => json!({ "node": node }),
            Self::Permission(_)
            | Self::IntermediateLedger
            | Self::Remote { .. }
            | Self::Database(_)
            | Self::Failure(_) => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
