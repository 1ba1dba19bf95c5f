//! Where a request sits on its route through the tree.
//!
//! Built from the authenticated caller and the primary entry's parties. The
//! downstream account is the remote party that is not the caller. Once the
//! local build step completes the orientation flips to responding, and from
//! then on the adjacent account is the upstream one.

use ccnode_shared::{CcError, CcResult};

use crate::account::Account;

/// Per-request route bookkeeping.
#[derive(Debug, Clone)]
pub struct Orientation {
    upstream: Option<Account>,
    downstream: Option<Account>,
    responding: bool,
}

impl Orientation {
    /// Starts from the caller; `None` for anonymous requests.
    #[must_use]
    pub fn new(caller: Option<&Account>) -> Self {
        Self {
            upstream: caller.cloned(),
            downstream: None,
            responding: false,
        }
    }

    /// Picks the downstream relay target from the parties.
    ///
    /// A node with both parties remote and the caller on neither side is an
    /// intermediate ledger and may not originate anything. Because the
    /// downstream account is never the caller, upstream and downstream are
    /// never both the trunk.
    pub fn orient(&mut self, payee: &Account, payer: &Account) -> CcResult<()> {
        let caller = self.upstream.as_ref().map(|a| a.id.as_str());
        let is_caller = |a: &Account| Some(a.id.as_str()) == caller;

        if payee.is_remote() && payer.is_remote() && !is_caller(payee) && !is_caller(payer) {
            return Err(CcError::IntermediateLedger);
        }
        self.downstream = [payee, payer]
            .into_iter()
            .find(|a| a.is_remote() && !is_caller(a))
            .cloned();
        Ok(())
    }

    /// Sends the request on to `neighbor`, for calls that name their target
    /// directly instead of through a pair of parties.
    pub fn route_to(&mut self, neighbor: &Account) {
        self.downstream = Some(neighbor.clone());
    }

    /// Flips to response mode.
    pub fn respond(&mut self) {
        self.responding = true;
    }

    /// The caller.
    #[must_use]
    pub fn upstream(&self) -> Option<&Account> {
        self.upstream.as_ref()
    }

    /// The relay target, if the transaction continues past this node.
    #[must_use]
    pub fn downstream(&self) -> Option<&Account> {
        self.downstream.as_ref()
    }

    /// Requesting a neighbor further along the route.
    #[must_use]
    pub fn going_downstream(&self) -> bool {
        !self.responding && self.downstream.is_some()
    }

    /// Answering a remote caller.
    #[must_use]
    pub fn going_upstream(&self) -> bool {
        self.responding && self.upstream.as_ref().is_some_and(Account::is_remote)
    }

    /// The next hop is the trunk, so quantities leave in trunk units.
    #[must_use]
    pub fn going_rootwards(&self) -> bool {
        self.adjacent_account().is_some_and(Account::is_trunkward)
    }

    /// Whether the caller is the trunk, so what it sends is in trunk units.
    #[must_use]
    pub fn upstream_is_trunk(&self) -> bool {
        self.upstream.as_ref().is_some_and(Account::is_trunkward)
    }

    /// The neighbor the next message goes to.
    #[must_use]
    pub fn adjacent_account(&self) -> Option<&Account> {
        if self.going_downstream() {
            self.downstream.as_ref()
        } else if self.going_upstream() {
            self.upstream.as_ref()
        } else {
            None
        }
    }
}
