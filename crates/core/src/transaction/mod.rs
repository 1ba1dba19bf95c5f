//! Transactions.
//!
//! A transaction is an ordered list of entries (index 0 is the primary)
//! moving through its workflow's states. Every state change is a new stored
//! version; a transaction whose primary entry touches a neighbor is
//! transversal and is relayed hop by hop to every node owning a party.

mod lifecycle;
pub mod reports;

pub use lifecycle::{
    FilterQuery, InsertOutcome, NewTransaction, change_state, create, delete, filter, load, receive_relay,
};

use chrono::{DateTime, Utc};
use ccnode_shared::{CcError, CcResult};
use serde::Serialize;
use uuid::Uuid;

use crate::account::Account;
use crate::context::{Node, RequestContext};
use crate::entry::{Entry, EntryKind, EntryView, WireEntry};
use crate::orientation::Orientation;
use crate::relay::WireTransaction;
use crate::relay::hashchain::chain_hash;
use crate::storage::{HashLink, TransactionRecord};
use crate::workflow::{Parties, STATE_INITIATED, STATE_VALIDATED};

/// A transaction loaded or built for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Stable across versions.
    pub uuid: Uuid,
    /// -1 until written.
    pub version: i32,
    /// Workflow id.
    pub workflow: String,
    /// Workflow state.
    pub state: String,
    /// Entries; index 0 is the primary.
    pub entries: Vec<Entry>,
    /// Who wrote the current version.
    pub scribe: String,
    /// When the current version was written.
    pub written: Option<DateTime<Utc>>,
    /// Storage row id of the current version.
    pub tx_id: Option<i64>,
}

/// A transaction as shown to a local caller.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    /// Stable id.
    pub uuid: Uuid,
    /// Version number.
    pub version: i32,
    /// Workflow id.
    #[serde(rename = "type")]
    pub workflow: String,
    /// Workflow state.
    pub state: String,
    /// Who wrote the current version.
    pub scribe: String,
    /// When the current version was written.
    pub written: Option<DateTime<Utc>>,
    /// Entries in display units.
    pub entries: Vec<EntryView>,
    /// States the caller may move the transaction to.
    pub transitions: Vec<String>,
}

impl Transaction {
    /// A transaction that exists only in memory.
    #[must_use]
    pub fn new(uuid: Uuid, workflow: String, primary: Entry, scribe: String) -> Self {
        Self {
            uuid,
            version: -1,
            workflow,
            state: STATE_INITIATED.to_string(),
            entries: vec![primary],
            scribe,
            written: None,
            tx_id: None,
        }
    }

    /// The entry the transaction was created for.
    #[must_use]
    pub fn primary(&self) -> &Entry {
        &self.entries[0]
    }

    /// Whether a neighbor owns one of the primary parties.
    #[must_use]
    pub fn is_transversal(&self) -> bool {
        self.primary().kind != EntryKind::Local
    }

    /// The facts workflow roles are checked against.
    #[must_use]
    pub fn parties(&self) -> Parties<'_> {
        let primary = self.primary();
        Parties {
            state: &self.state,
            author: &primary.author,
            payee: &primary.payee.id,
            payer: &primary.payer.id,
        }
    }

    /// Admins hold the override, and so does a neighbor acting on its own transaction.
    #[must_use]
    pub fn admin_override(&self, actor: &Account) -> bool {
        actor.is_admin() || (actor.is_remote() && self.primary().involves(&actor.id))
    }

    /// The stored form of the current version.
    #[must_use]
    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            tx_id: self.tx_id,
            uuid: self.uuid,
            version: self.version,
            workflow: self.workflow.clone(),
            state: self.state.clone(),
            scribe: self.scribe.clone(),
            written: self.written.unwrap_or_else(Utc::now),
            entries: self.entries.iter().map(Entry::to_record).collect(),
        }
    }

    /// Rebuilds a stored version, reloading its parties.
    pub async fn from_record(ctx: &RequestContext, record: TransactionRecord) -> CcResult<Self> {
        if record.entries.is_empty() {
            return Err(CcError::Failure(format!(
                "transaction {} has no entries",
                record.uuid
            )));
        }
        let mut entries = Vec::with_capacity(record.entries.len());
        for entry in record.entries {
            let payee = ctx.account(&entry.payee).await?;
            let payer = ctx.account(&entry.payer).await?;
            entries.push(Entry::from_record(entry, payee, payer));
        }
        Ok(Self {
            uuid: record.uuid,
            version: record.version,
            workflow: record.workflow,
            state: record.state,
            entries,
            scribe: record.scribe,
            written: Some(record.written),
            tx_id: record.tx_id,
        })
    }

    /// Serializes the given entries for the orientation's adjacent neighbor,
    /// skipping the ones it has no part in.
    pub fn wire_entries<'a>(
        node: &Node,
        entries: impl IntoIterator<Item = &'a Entry>,
        orientation: &Orientation,
    ) -> CcResult<Vec<WireEntry>> {
        let target = orientation
            .adjacent_account()
            .ok_or_else(|| CcError::Failure("no neighbor to serialize for".into()))?;
        let rootwards = orientation.going_rootwards();
        let rate = node.rate();
        entries
            .into_iter()
            .filter(|e| e.involves(&target.id))
            .map(|e| e.to_wire(target, rootwards, &node.config, &rate))
            .collect()
    }

    /// The whole transaction as the adjacent neighbor should see it.
    pub fn to_wire(&self, node: &Node, orientation: &Orientation) -> CcResult<WireTransaction> {
        Ok(WireTransaction {
            uuid: self.uuid,
            workflow: self.workflow.clone(),
            state: self.state.clone(),
            version: self.version,
            entries: Self::wire_entries(node, &self.entries, orientation)?,
        })
    }

    /// The transaction for display to the request's caller.
    #[must_use]
    pub fn view(&self, ctx: &RequestContext) -> TransactionView {
        let rate = ctx.node.rate();
        let transitions = match (&ctx.caller, ctx.node.workflows.get(&self.workflow)) {
            (Some(caller), Ok(workflow)) => {
                workflow.permitted_targets(&self.parties(), &caller.id, self.admin_override(caller))
            }
            _ => Vec::new(),
        };
        TransactionView {
            uuid: self.uuid,
            version: self.version,
            workflow: self.workflow.clone(),
            state: self.state.clone(),
            scribe: self.scribe.clone(),
            written: self.written,
            entries: self.entries.iter().map(|e| e.view(&rate)).collect(),
            transitions,
        }
    }

    /// New chain heads for every neighbor party, for a confirmed write.
    async fn hash_links(&self, ctx: &RequestContext) -> CcResult<Vec<HashLink>> {
        if self.state == STATE_VALIDATED {
            return Ok(Vec::new());
        }
        let primary = self.primary();
        let mut links = Vec::new();
        for party in [&primary.payee, &primary.payer] {
            if !party.is_remote() {
                continue;
            }
            let prev = ctx.node.store.last_hash(&party.id).await?;
            links.push(HashLink {
                acc_id: party.id.clone(),
                hash: chain_hash(prev.as_deref(), self.uuid, self.version, &self.state),
            });
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests;
