//! Calls to neighbor nodes.
//!
//! Relays are synchronous from the ledger's point of view: the outcome of a
//! downstream call is known before the local write happens. Failures abort
//! the operation; there are no retries.

pub mod hashchain;

use async_trait::async_trait;
use ccnode_shared::CcResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entry::WireEntry;
use crate::workflow::Workflow;

/// Where and as whom to reach a neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// The neighbor's account id on this node.
    pub account_id: String,
    /// The neighbor's base url.
    pub url: String,
    /// This node's name, sent as `cc-user`.
    pub node_name: String,
    /// Our chain head for the link, sent as `cc-auth`.
    pub hash: Option<String>,
}

/// A transaction as exchanged between adjacent nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTransaction {
    /// Stable id.
    pub uuid: Uuid,
    /// Workflow id.
    #[serde(rename = "type")]
    pub workflow: String,
    /// Workflow state.
    #[serde(default)]
    pub state: String,
    /// Version number.
    #[serde(default)]
    pub version: i32,
    /// Entries; index 0 is the primary.
    pub entries: Vec<WireEntry>,
}

/// The neighbor-facing half of the node protocol.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Asks the neighbor to validate and store a transaction.
    ///
    /// Returns the neighbor's answer, whose entries are the ones it added.
    async fn new_transaction(&self, peer: &Peer, tx: &WireTransaction) -> CcResult<WireTransaction>;

    /// Forwards a state change.
    async fn change_state(&self, peer: &Peer, uuid: Uuid, target: &str) -> CcResult<()>;

    /// Checks the neighbor is up and in sync.
    async fn handshake(&self, peer: &Peer) -> CcResult<()>;

    /// The neighbor's absolute path from the root.
    async fn absolute_path(&self, peer: &Peer) -> CcResult<Vec<String>>;

    /// The neighbor's workflows.
    async fn workflows(&self, peer: &Peer) -> CcResult<Vec<Workflow>>;

    /// Account names under the neighbor matching a fragment.
    async fn autocomplete(&self, peer: &Peer, fragment: &str) -> CcResult<Vec<String>>;

    /// Summary report of an account beyond the neighbor.
    async fn account_summary(&self, peer: &Peer, path: &str) -> CcResult<Value>;

    /// Limits of an account beyond the neighbor.
    async fn account_limits(&self, peer: &Peer, path: &str) -> CcResult<Value>;

    /// Balance history of an account beyond the neighbor.
    async fn account_history(&self, peer: &Peer, path: &str) -> CcResult<Value>;
}

/// A relay for nodes without neighbors; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNeighbors;

#[async_trait]
impl Relay for NoNeighbors {
    async fn new_transaction(&self, peer: &Peer, _tx: &WireTransaction) -> CcResult<WireTransaction> {
        Err(unreachable_peer(peer))
    }

    async fn change_state(&self, peer: &Peer, _uuid: Uuid, _target: &str) -> CcResult<()> {
        Err(unreachable_peer(peer))
    }

    async fn handshake(&self, peer: &Peer) -> CcResult<()> {
        Err(unreachable_peer(peer))
    }

    async fn absolute_path(&self, peer: &Peer) -> CcResult<Vec<String>> {
        Err(unreachable_peer(peer))
    }

    async fn workflows(&self, peer: &Peer) -> CcResult<Vec<Workflow>> {
        Err(unreachable_peer(peer))
    }

    async fn autocomplete(&self, peer: &Peer, _fragment: &str) -> CcResult<Vec<String>> {
        Err(unreachable_peer(peer))
    }

    async fn account_summary(&self, peer: &Peer, _path: &str) -> CcResult<Value> {
        Err(unreachable_peer(peer))
    }

    async fn account_limits(&self, peer: &Peer, _path: &str) -> CcResult<Value> {
        Err(unreachable_peer(peer))
    }

    async fn account_history(&self, peer: &Peer, _path: &str) -> CcResult<Value> {
        Err(unreachable_peer(peer))
    }
}

fn unreachable_peer(peer: &Peer) -> ccnode_shared::CcError {
    ccnode_shared::CcError::UnavailableNode {
        node: peer.account_id.clone(),
        reason: "no relay configured".into(),
    }
}
