//! Ledger entries.
//!
//! An entry moves a quantity from payer to payee. Its variant depends on
//! where the parties live:
//! - both local: `Local`
//! - a leafward neighbor involved: `Transversal`
//! - the trunkward neighbor involved: `Trunkward`, which also keeps the
//!   quantity in trunk units so replies toward the trunk echo it exactly

pub mod conversion;
mod wire;

pub use conversion::TrunkwardRate;
pub use wire::{EntryView, WireEntry};

use std::collections::BTreeMap;

use ccnode_shared::{CcError, CcResult, NodeConfig};

use crate::account::Account;
use crate::storage::EntryRecord;

/// Which nodes an entry spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Both parties are local.
    Local,
    /// A leafward neighbor is a party.
    Transversal,
    /// The trunkward neighbor is a party.
    Trunkward,
}

impl EntryKind {
    /// Selects the variant from the parties.
    #[must_use]
    pub fn select(payee: &Account, payer: &Account) -> Self {
        if payee.is_trunkward() || payer.is_trunkward() {
            Self::Trunkward
        } else if payee.is_remote() || payer.is_remote() {
            Self::Transversal
        } else {
            Self::Local
        }
    }
}

/// Raw fields of an entry before validation.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Resolved payee.
    pub payee: Account,
    /// Resolved payer.
    pub payer: Account,
    /// Quantity in ledger units.
    pub quant: i64,
    /// Quantity in trunk units, when received from the trunk.
    pub trunkward_quant: Option<i64>,
    /// Who wrote the entry.
    pub author: String,
    /// Free text.
    pub description: String,
    /// Auxiliary addressing information.
    pub metadata: BTreeMap<String, String>,
    /// True for the entry the transaction was created for.
    pub is_primary: bool,
    /// True for entries added by fee services.
    pub is_additional: bool,
}

/// A validated ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Payee.
    pub payee: Account,
    /// Payer.
    pub payer: Account,
    /// Quantity in ledger units.
    pub quant: i64,
    /// Quantity in trunk units, for `Trunkward` entries.
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
    /// Variant.
    pub kind: EntryKind,
}

impl Entry {
    /// Validates the fields and selects the variant.
    pub fn create(new: NewEntry, config: &NodeConfig, rate: &TrunkwardRate) -> CcResult<Self> {
        if new.payee.id == new.payer.id {
            return Err(CcError::SameAccount { acc: new.payee.id });
        }
        for (field, party) in [("payee", &new.payee), ("payer", &new.payer)] {
            if !party.status {
                return Err(CcError::invalid(field, format!("account '{}' is blocked", party.id)));
            }
            if party.is_remote() && party.rel_path.is_empty() {
                return Err(CcError::invalid(
                    field,
                    format!("'{}' names a node, not an account", party.id),
                ));
            }
        }
        let zero_allowed = new.is_primary && config.zero_payments;
        if new.quant < 0 || (new.quant == 0 && !zero_allowed) {
            return Err(CcError::invalid("quant", "must be positive"));
        }

        let kind = EntryKind::select(&new.payee, &new.payer);
        let mut metadata = new.metadata;
        for party in [&new.payee, &new.payer] {
            if party.is_remote() {
                metadata.insert(party.id.clone(), party.rel_path.clone());
            }
        }
        let trunkward_quant = match (kind, new.trunkward_quant) {
            (EntryKind::Trunkward, Some(given)) => Some(given),
            (EntryKind::Trunkward, None) => Some(rate.to_trunk(new.quant)?),
            _ => None,
        };

        Ok(Self {
            payee: new.payee,
            payer: new.payer,
            quant: new.quant,
            trunkward_quant,
            author: new.author,
            description: new.description,
            metadata,
            is_primary: new.is_primary,
            is_additional: new.is_additional,
            kind,
        })
    }

    /// Rebuilds a stored entry. Remote parties get their remainder from the metadata.
    #[must_use]
    pub fn from_record(record: EntryRecord, payee: Account, payer: Account) -> Self {
        let with_rel = |account: Account| {
            if account.is_remote() {
                let rel = record.metadata.get(&account.id).cloned().unwrap_or_default();
                account.with_rel(rel)
            } else {
                account
            }
        };
        let payee = with_rel(payee);
        let payer = with_rel(payer);
        let kind = EntryKind::select(&payee, &payer);
        Self {
            payee,
            payer,
            quant: record.quant,
            trunkward_quant: record.trunkward_quant,
            author: record.author,
            description: record.description,
            metadata: record.metadata,
            is_primary: record.is_primary,
            is_additional: record.is_additional,
            kind,
        }
    }

    /// The stored form.
    #[must_use]
    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            payee: self.payee.id.clone(),
            payer: self.payer.id.clone(),
            quant: self.quant,
            trunkward_quant: self.trunkward_quant,
            author: self.author.clone(),
            description: self.description.clone(),
            metadata: self.metadata.clone(),
            is_primary: self.is_primary,
            is_additional: self.is_additional,
        }
    }

    /// Whether the account is on either side.
    #[must_use]
    pub fn involves(&self, acc_id: &str) -> bool {
        self.payee.id == acc_id || self.payer.id == acc_id
    }
}

/// Net change per account id over a set of entries.
pub fn net_flows<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> CcResult<BTreeMap<String, i64>> {
    let mut flows: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        for (acc, delta) in [(&entry.payee.id, entry.quant), (&entry.payer.id, -entry.quant)] {
            let flow = flows.entry(acc.clone()).or_insert(0);
            *flow = flow
                .checked_add(delta)
                .ok_or_else(|| CcError::invalid("quant", "balance out of range"))?;
        }
    }
    Ok(flows)
}
