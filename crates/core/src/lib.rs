//! Ledger logic for a Credit Commons node.
//!
//! This crate contains pure ledger logic with ZERO web or database dependencies.
//! Everything that leaves the process (the account directory, the fee service,
//! the relational store, neighbor nodes) is reached through a capability trait
//! so the HTTP and SQL crates can plug in real implementations.
//!
//! # Modules
//!
//! - `account` - Account variants and the directory capability
//! - `address` - Tree-relative path resolution and autocomplete
//! - `orientation` - Per-request upstream/downstream bookkeeping
//! - `entry` - Ledger rows, their variants and trunkward conversion
//! - `workflow` - Declarative state machines per transaction type
//! - `storage` - Versioned persistence capability
//! - `relay` - Neighbor calls and the hash chain between adjacent nodes
//! - `blogic` - Fee injection capability
//! - `context` - Node wiring and the request-scoped context
//! - `transaction` - The transaction lifecycle and account reports

pub mod account;
pub mod address;
pub mod blogic;
pub mod context;
pub mod entry;
pub mod orientation;
pub mod relay;
pub mod storage;
pub mod transaction;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{Account, AccountDirectory, AccountKind, AccountRecord};
pub use context::{Node, RequestContext};
pub use entry::{Entry, EntryKind, WireEntry};
pub use orientation::Orientation;
pub use transaction::Transaction;
pub use workflow::{Workflow, WorkflowRegistry};
