//! Entry serialization for neighbors and local callers.

use std::collections::BTreeMap;

use ccnode_shared::{CcResult, NodeConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entry, TrunkwardRate};
use crate::account::Account;

/// An entry on the wire. Quantities are in the trunkward node's display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    /// Payee path, relative to the receiver.
    pub payee: String,
    /// Payer path, relative to the receiver.
    pub payer: String,
    /// Quantity.
    pub quant: Decimal,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Who wrote the entry.
    #[serde(default)]
    pub author: String,
    /// Auxiliary addressing information.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// An entry as shown to a local caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    /// Payee path, relative to this node.
    pub payee: String,
    /// Payer path, relative to this node.
    pub payer: String,
    /// Quantity in local display units.
    pub quant: Decimal,
    /// Quantity in trunk display units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunkward_quant: Option<Decimal>,
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

/// Path of `party` as the neighbor `target` knows it.
fn path_for(party: &Account, target: &Account, node_name: &str) -> String {
    if party.id == target.id {
        party.rel_path.clone()
    } else {
        format!("{node_name}/{}", party.relative_path())
    }
}

impl Entry {
    /// Serializes the entry for the adjacent neighbor `target`.
    ///
    /// With `rootwards` set the quantity is in trunk units. The metadata key
    /// describing the target itself is never sent back to it.
    pub fn to_wire(
        &self,
        target: &Account,
        rootwards: bool,
        config: &NodeConfig,
        rate: &TrunkwardRate,
    ) -> CcResult<WireEntry> {
        let quant = if rootwards {
            let trunk_units = match self.trunkward_quant {
                Some(q) => q,
                None => rate.to_trunk(self.quant)?,
            };
            rate.trunk().to_display(trunk_units)
        } else {
            rate.local().to_display(self.quant)
        };
        let metadata = if config.relay_metadata {
            self.metadata
                .iter()
                .filter(|(key, _)| **key != target.id)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        } else {
            BTreeMap::new()
        };
        let author = if self.author.contains('/') {
            self.author.clone()
        } else {
            format!("{}/{}", config.name, self.author)
        };

        Ok(WireEntry {
            payee: path_for(&self.payee, target, &config.name),
            payer: path_for(&self.payer, target, &config.name),
            quant,
            description: self.description.clone(),
            author,
            metadata,
        })
    }

    /// The entry as this node sees it, in local display units.
    #[must_use]
    pub fn to_local_wire(&self, rate: &TrunkwardRate) -> WireEntry {
        WireEntry {
            payee: self.payee.relative_path(),
            payer: self.payer.relative_path(),
            quant: rate.local().to_display(self.quant),
            description: self.description.clone(),
            author: self.author.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// The entry for display to a local caller.
    #[must_use]
    pub fn view(&self, rate: &TrunkwardRate) -> EntryView {
        EntryView {
            payee: self.payee.relative_path(),
            payer: self.payer.relative_path(),
            quant: rate.local().to_display(self.quant),
            trunkward_quant: self.trunkward_quant.map(|q| rate.trunk().to_display(q)),
            author: self.author.clone(),
            description: self.description.clone(),
            metadata: self.metadata.clone(),
            is_primary: self.is_primary,
            is_additional: self.is_additional,
        }
    }
}
