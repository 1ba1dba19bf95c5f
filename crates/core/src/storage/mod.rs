//! Versioned persistence capability.
//!
//! Every state change writes a new version of the whole transaction; earlier
//! versions are never edited. Only the highest version of a uuid is live.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use ccnode_shared::CcResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored ledger row, parties by account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Payee account id on this node.
    pub payee: String,
    /// Payer account id on this node.
    pub payer: String,
    /// Quantity in ledger units.
    pub quant: i64,
    /// Quantity in trunk units, for entries touching the trunkward account.
    pub trunkward_quant: Option<i64>,
    /// Who wrote the entry.
    pub author: String,
    /// Free text.
    pub description: String,
    /// Remainder paths of remote parties, keyed by account id.
    pub metadata: BTreeMap<String, String>,
    /// True for the entry the transaction was created for.
    pub is_primary: bool,
    /// True for entries added by fee services.
    pub is_additional: bool,
}

/// One stored version of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Storage row id, set once written.
    pub tx_id: Option<i64>,
    /// Stable across versions.
    pub uuid: Uuid,
    /// Version number.
    pub version: i32,
    /// Workflow id.
    pub workflow: String,
    /// Workflow state.
    pub state: String,
    /// Who wrote this version.
    pub scribe: String,
    /// When this version was written.
    pub written: DateTime<Utc>,
    /// Entries in order; index 0 is the primary.
    pub entries: Vec<EntryRecord>,
}

/// How a version is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// An unconfirmed version that replaces the scribe's previous unconfirmed transaction.
    ReplaceUnconfirmed,
    /// Any other version.
    Append,
}

/// A new hash recorded against a neighbor account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashLink {
    /// The neighbor's account id.
    pub acc_id: String,
    /// The new chain head.
    pub hash: String,
}

/// One entry as seen from one account, for balances and history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    /// Transaction uuid.
    pub uuid: Uuid,
    /// State of the live version.
    pub state: String,
    /// When the live version was written.
    pub written: DateTime<Utc>,
    /// Payee account id.
    pub payee: String,
    /// Payer account id.
    pub payer: String,
    /// Quantity in ledger units.
    pub quant: i64,
    /// Free text.
    pub description: String,
}

impl AccountEntry {
    /// Signed effect on `acc`: positive when it is paid.
    #[must_use]
    pub fn delta_for(&self, acc: &str) -> i64 {
        if self.payee == acc {
            self.quant
        } else if self.payer == acc {
            -self.quant
        } else {
            0
        }
    }

    /// The other side of the entry.
    #[must_use]
    pub fn partner_of(&self, acc: &str) -> &str {
        if self.payee == acc {
            &self.payer
        } else {
            &self.payee
        }
    }
}

/// Criteria for listing live transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Exact uuid.
    pub uuid: Option<Uuid>,
    /// Account id paid by any entry.
    pub payee: Option<String>,
    /// Account id paying in any entry.
    pub payer: Option<String>,
    /// Account id on either side of any entry.
    pub involving: Option<String>,
    /// Accepted states; empty accepts all.
    pub states: Vec<String>,
    /// Accepted workflow ids; empty accepts all.
    pub types: Vec<String>,
    /// Author of any entry.
    pub author: Option<String>,
    /// Substring of any entry's description.
    pub description: Option<String>,
    /// Written at or after.
    pub after: Option<DateTime<Utc>>,
    /// Written before.
    pub before: Option<DateTime<Utc>>,
    /// Page size.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Unconfirmed transactions are only returned to their scribe.
    pub viewer: Option<String>,
}

/// Persistence of transaction versions and the hash chain.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Writes one version atomically with its entries and hash links.
    ///
    /// `ReplaceUnconfirmed` first deletes the scribe's outstanding unconfirmed
    /// transaction. Writing a confirmed state clears the uuid's unconfirmed
    /// marker. Returns the new row id.
    async fn write_version(
        &self,
        record: &TransactionRecord,
        mode: WriteMode,
        links: &[HashLink],
    ) -> CcResult<i64>;

    /// The live version of a uuid.
    async fn latest(&self, uuid: Uuid) -> CcResult<Option<TransactionRecord>>;

    /// Removes every version of an unconfirmed transaction.
    async fn delete_unconfirmed(&self, uuid: Uuid) -> CcResult<()>;

    /// Live versions matching the filter, newest first.
    async fn filter(&self, filter: &TransactionFilter) -> CcResult<Vec<TransactionRecord>>;

    /// Entries of live versions in the given states touching `acc`, oldest first.
    async fn entries_for_account(&self, acc: &str, states: &[&str]) -> CcResult<Vec<AccountEntry>>;

    /// Head of the hash chain with a neighbor.
    async fn last_hash(&self, acc: &str) -> CcResult<Option<String>>;
}

/// Checks a record against the filter, except for paging.
pub(crate) fn matches(filter: &TransactionFilter, record: &TransactionRecord) -> bool {
    use crate::workflow::STATE_VALIDATED;

    fn any_entry(record: &TransactionRecord, pred: impl Fn(&EntryRecord) -> bool) -> bool {
        record.entries.iter().any(pred)
    }

    if record.state == STATE_VALIDATED && filter.viewer.as_deref() != Some(record.scribe.as_str()) {
        return false;
    }
    filter.uuid.is_none_or(|uuid| uuid == record.uuid)
        && filter
            .payee
            .as_deref()
            .is_none_or(|p| any_entry(record, |e| e.payee == p))
        && filter
            .payer
            .as_deref()
            .is_none_or(|p| any_entry(record, |e| e.payer == p))
        && filter
            .involving
            .as_deref()
            .is_none_or(|a| any_entry(record, |e| e.payee == a || e.payer == a))
        && (filter.states.is_empty() || filter.states.contains(&record.state))
        && (filter.types.is_empty() || filter.types.contains(&record.workflow))
        && filter
            .author
            .as_deref()
            .is_none_or(|a| any_entry(record, |e| e.author == a))
        && filter
            .description
            .as_deref()
            .is_none_or(|d| any_entry(record, |e| e.description.contains(d)))
        && filter.after.is_none_or(|after| record.written >= after)
        && filter.before.is_none_or(|before| record.written < before)
}
