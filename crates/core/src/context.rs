//! Node wiring and the request-scoped context.
//!
//! A [`Node`] is built once at startup and shared read-only. Every request
//! gets a fresh [`RequestContext`] carrying the authenticated caller and a
//! cache of the accounts loaded while serving it; nothing else survives a
//! request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ccnode_shared::{CcError, CcResult, NodeConfig};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::account::{Account, AccountDirectory, AccountFilter};
use crate::blogic::Blogic;
use crate::entry::TrunkwardRate;
use crate::relay::{Peer, Relay, hashchain};
use crate::storage::LedgerStore;
use crate::workflow::{Workflow, WorkflowRegistry};

/// A ledger node and its capabilities.
pub struct Node {
    /// Place in the tree and ledger settings.
    pub config: NodeConfig,
    /// Account directory.
    pub directory: Arc<dyn AccountDirectory>,
    /// Versioned transaction store.
    pub store: Arc<dyn LedgerStore>,
    /// Fee service.
    pub blogic: Arc<dyn Blogic>,
    /// Neighbor calls.
    pub relay: Arc<dyn Relay>,
    /// Known workflows.
    pub workflows: WorkflowRegistry,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.config.name)
            .field("trunkward_account", &self.config.trunkward_account)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Exchange between local and trunk units.
    #[must_use]
    pub fn rate(&self) -> TrunkwardRate {
        TrunkwardRate::from_config(&self.config)
    }

    /// Loads an account and selects its variant.
    pub async fn load_account(&self, id: &str) -> CcResult<Account> {
        let record = self.directory.fetch(id).await?;
        Ok(Account::from_record(
            record,
            self.config.trunkward_account.as_deref(),
        ))
    }

    /// The trunkward account, if one is configured.
    pub async fn trunkward(&self) -> CcResult<Option<Account>> {
        match self.config.trunkward_account.as_deref() {
            Some(id) => Ok(Some(self.load_account(id).await?)),
            None => Ok(None),
        }
    }

    /// Identifies the caller from the `cc-user`/`cc-auth` pair.
    ///
    /// No user means an anonymous caller. Neighbors authenticate with the
    /// head of the hash chain, members with their secret. An unknown user
    /// fails like a wrong secret.
    pub async fn authenticate(&self, user: Option<&str>, auth: Option<&str>) -> CcResult<Option<Account>> {
        let Some(user) = user.filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let account = match self.load_account(user).await {
            Ok(account) => account,
            Err(CcError::DoesNotExist { .. }) => {
                return Err(CcError::Auth { acc_id: user.to_string() });
            }
            Err(e) => return Err(e),
        };
        let auth = auth.unwrap_or("");

        if account.is_remote() {
            let recorded = self.store.last_hash(&account.id).await?;
            if !hashchain::verify(recorded.as_deref(), auth) {
                return Err(CcError::HashMismatch { acc: account.id });
            }
        } else if !self.directory.check_credentials(&account.id, auth).await? {
            return Err(CcError::Auth { acc_id: account.id });
        }
        if !account.status {
            return Err(CcError::Permission(format!("account '{}' is blocked", account.id)));
        }
        debug!(acc = %account.id, remote = account.is_remote(), "Authenticated caller");
        Ok(Some(account))
    }

    /// Addressing details for a call to a neighbor.
    pub async fn peer(&self, account: &Account) -> CcResult<Peer> {
        let url = account
            .url()
            .ok_or_else(|| CcError::Failure(format!("account '{}' is not a neighbor", account.id)))?;
        Ok(Peer {
            account_id: account.id.clone(),
            url: url.to_string(),
            node_name: self.config.name.clone(),
            hash: self.store.last_hash(&account.id).await?,
        })
    }

    /// Names from the root of the tree down to this node.
    pub async fn absolute_path(&self) -> CcResult<Vec<String>> {
        let mut path = match self.trunkward().await? {
            Some(trunk) => {
                let peer = self.peer(&trunk).await?;
                self.relay.absolute_path(&peer).await?
            }
            None => Vec::new(),
        };
        path.push(self.config.name.clone());
        Ok(path)
    }

    /// The trunk's workflows, or none without a trunk.
    pub async fn trunkward_workflows(&self) -> CcResult<Vec<Workflow>> {
        match self.trunkward().await? {
            Some(trunk) => {
                let peer = self.peer(&trunk).await?;
                self.relay.workflows(&peer).await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Pings every neighbor; neighbor ids grouped by outcome.
    ///
    /// Reachable neighbors are listed under `ok`, the others under the
    /// class of the error they produced.
    pub async fn handshake_neighbors(&self) -> CcResult<BTreeMap<String, Vec<String>>> {
        let ids = self
            .directory
            .filter(&AccountFilter {
                local: Some(false),
                ..AccountFilter::default()
            })
            .await?;
        let mut outcome: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for id in ids {
            let account = self.load_account(&id).await?;
            let status = if account.status {
                let peer = self.peer(&account).await?;
                match self.relay.handshake(&peer).await {
                    Ok(()) => "ok".to_string(),
                    Err(e) => {
                        warn!(acc = %id, error = %e, "Handshake failed");
                        e.class().to_string()
                    }
                }
            } else {
                "disabled".to_string()
            };
            outcome.entry(status).or_default().push(id);
        }
        Ok(outcome)
    }
}

/// Everything one request needs, threaded explicitly through every call.
#[derive(Debug)]
pub struct RequestContext {
    /// The node serving the request.
    pub node: Arc<Node>,
    /// The authenticated caller; `None` when anonymous.
    pub caller: Option<Account>,
    accounts: Mutex<HashMap<String, Account>>,
}

impl RequestContext {
    /// Starts a request.
    #[must_use]
    pub fn new(node: Arc<Node>, caller: Option<Account>) -> Self {
        Self {
            node,
            caller,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// The caller, or `PermissionViolation` for anonymous requests.
    pub fn require_caller(&self) -> CcResult<&Account> {
        self.caller
            .as_ref()
            .ok_or_else(|| CcError::Permission("this operation needs an authenticated caller".into()))
    }

    /// The caller's id, if any.
    #[must_use]
    pub fn caller_id(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.id.as_str())
    }

    /// Whether the caller is a local admin.
    #[must_use]
    pub fn caller_is_admin(&self) -> bool {
        self.caller.as_ref().is_some_and(Account::is_admin)
    }

    /// Loads an account once per request.
    pub async fn account(&self, id: &str) -> CcResult<Account> {
        let mut cache = self.accounts.lock().await;
        if let Some(account) = cache.get(id) {
            return Ok(account.clone());
        }
        let account = self.node.load_account(id).await?;
        cache.insert(id.to_string(), account.clone());
        Ok(account)
    }

    /// Whether the directory knows the id.
    pub async fn has_account(&self, id: &str) -> CcResult<bool> {
        if self.accounts.lock().await.contains_key(id) {
            return Ok(true);
        }
        self.node.directory.has(id).await
    }
}
