//! Lifecycle tests on single nodes and on a small in-process tree.
//!
//! The tree is `root` with branches `alpha` and `beta`. Neighbors talk
//! through [`Loopback`], which authenticates each call the way a real node
//! would and then runs the target node's own lifecycle functions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use ccnode_shared::{CcError, CcResult, NodeConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use uuid::Uuid;

use super::reports::{self, Report};
use super::*;
use crate::account::{AccountRecord, MemoryDirectory};
use crate::blogic::{Blogic, MockBlogic, NoFees};
use crate::relay::{NoNeighbors, Peer, Relay};
use crate::storage::MemoryStore;
use crate::test_support::registry;
use crate::workflow::Workflow;

fn record(id: &str, url: Option<&str>, admin: bool) -> AccountRecord {
    AccountRecord {
        id: id.into(),
        status: true,
        min: -10_000,
        max: 10_000,
        admin,
        url: url.map(str::to_string),
    }
}

fn build(config: NodeConfig, directory: MemoryDirectory, blogic: Arc<dyn Blogic>, relay: Arc<dyn Relay>) -> Arc<Node> {
    Arc::new(Node {
        config,
        directory: Arc::new(directory),
        store: Arc::new(MemoryStore::new()),
        blogic,
        relay,
        workflows: registry(),
    })
}

fn single_with(blogic: Arc<dyn Blogic>) -> Arc<Node> {
    let directory = MemoryDirectory::new()
        .with(record("alice", None, false), Some("a"))
        .with(record("bob", None, false), Some("b"))
        .with(record("fees", None, false), None)
        .with(record("admin", None, true), Some("x"));
    build(NodeConfig::named("alpha", None), directory, blogic, Arc::new(NoNeighbors))
}

fn single() -> Arc<Node> {
    single_with(Arc::new(NoFees))
}

async fn login(node: &Arc<Node>, user: &str, secret: &str) -> RequestContext {
    let caller = node.authenticate(Some(user), Some(secret)).await.unwrap();
    RequestContext::new(node.clone(), caller)
}

fn request(payee: &str, payer: &str, quant: Decimal, workflow: &str) -> NewTransaction {
    NewTransaction {
        payee: payee.into(),
        payer: payer.into(),
        quant,
        workflow: workflow.into(),
        description: "bread".into(),
        metadata: BTreeMap::new(),
    }
}

async fn balance(node: &Arc<Node>, acc: &str) -> i64 {
    node.store
        .entries_for_account(acc, lifecycle::COUNTED_STATES)
        .await
        .unwrap()
        .iter()
        .map(|e| e.delta_for(acc))
        .sum()
}

#[tokio::test]
async fn test_3rdparty_by_admin_auto_confirms() {
    let node = single();
    let ctx = login(&node, "admin", "x").await;

    let (tx, outcome) = create(&ctx, request("alice", "bob", dec!(1), "3rdparty")).await.unwrap();

    assert_eq!(outcome, InsertOutcome::Confirmed);
    assert_eq!(tx.state, "completed");
    assert_eq!(tx.version, 1);
    assert_eq!(tx.primary().author, "admin");
    assert_eq!(balance(&node, "alice").await, 100);
    assert_eq!(balance(&node, "bob").await, -100);
}

#[tokio::test]
async fn test_bill_needs_confirmation() {
    let node = single();
    let alice = login(&node, "alice", "a").await;
    let bob = login(&node, "bob", "b").await;
    let admin = login(&node, "admin", "x").await;

    let (tx, outcome) = create(&alice, request("alice", "bob", dec!(10), "bill")).await.unwrap();
    assert_eq!(outcome, InsertOutcome::AwaitingConfirmation);
    assert_eq!(tx.state, "validated");
    assert_eq!(tx.version, 0);
    assert_eq!(balance(&node, "alice").await, 0);

    let hidden = load(&bob, tx.uuid).await.unwrap_err();
    assert_eq!(hidden.class(), "DoesNotExistViolation");

    let confirmed = change_state(&alice, tx.uuid, "pending").await.unwrap();
    assert_eq!(confirmed.version, 1);
    assert_eq!(load(&bob, tx.uuid).await.unwrap().state, "pending");
    assert_eq!(balance(&node, "alice").await, 1000);

    let err = change_state(&alice, tx.uuid, "completed").await.unwrap_err();
    assert_eq!(err.class(), "WorkflowViolation");

    let done = change_state(&admin, tx.uuid, "completed").await.unwrap();
    assert_eq!(done.version, 2);
    assert_eq!(done.scribe, "admin");
}

#[tokio::test]
async fn test_payer_completes_bill() {
    let node = single();
    let alice = login(&node, "alice", "a").await;
    let bob = login(&node, "bob", "b").await;

    let (tx, _) = create(&alice, request("alice", "bob", dec!(2), "bill")).await.unwrap();
    change_state(&alice, tx.uuid, "pending").await.unwrap();

    let view = load(&bob, tx.uuid).await.unwrap().view(&bob);
    assert_eq!(view.transitions, vec!["completed".to_string(), "erased".to_string()]);

    assert_eq!(change_state(&bob, tx.uuid, "completed").await.unwrap().state, "completed");
}

#[tokio::test]
async fn test_max_limit_is_inclusive() {
    let node = single();
    let admin = login(&node, "admin", "x").await;

    create(&admin, request("alice", "bob", dec!(100), "3rdparty")).await.unwrap();
    let err = create(&admin, request("alice", "bob", dec!(0.01), "3rdparty"))
        .await
        .unwrap_err();

    match err {
        CcError::MaxLimit { acc, limit, projected, diff } => {
            assert_eq!(acc, "alice");
            assert_eq!(limit, dec!(100));
            assert_eq!(projected, dec!(100.01));
            assert_eq!(diff, dec!(0.01));
        }
        other => panic!("expected MaxLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_min_limit_checks_the_payer() {
    let node = single();
    let admin = login(&node, "admin", "x").await;

    let err = create(&admin, request("fees", "alice", dec!(100.01), "3rdparty"))
        .await
        .unwrap_err();
    assert_eq!(err.class(), "MinLimitViolation");
}

#[tokio::test]
async fn test_one_unconfirmed_transaction_per_author() {
    let node = single();
    let alice = login(&node, "alice", "a").await;

    let (first, _) = create(&alice, request("alice", "bob", dec!(1), "bill")).await.unwrap();
    let (second, _) = create(&alice, request("alice", "bob", dec!(2), "bill")).await.unwrap();

    assert_eq!(load(&alice, first.uuid).await.unwrap_err().class(), "DoesNotExistViolation");
    assert_eq!(load(&alice, second.uuid).await.unwrap().version, 0);
}

#[tokio::test]
async fn test_delete_rules() {
    let node = single();
    let alice = login(&node, "alice", "a").await;
    let bob = login(&node, "bob", "b").await;

    let (tx, _) = create(&alice, request("alice", "bob", dec!(1), "bill")).await.unwrap();
    assert_eq!(delete(&bob, tx.uuid).await.unwrap_err().class(), "DoesNotExistViolation");
    delete(&alice, tx.uuid).await.unwrap();
    assert!(node.store.latest(tx.uuid).await.unwrap().is_none());

    let (tx, _) = create(&alice, request("alice", "bob", dec!(1), "bill")).await.unwrap();
    change_state(&alice, tx.uuid, "pending").await.unwrap();
    assert_eq!(delete(&alice, tx.uuid).await.unwrap_err().class(), "WorkflowViolation");
}

#[tokio::test]
async fn test_direction_and_activity_checked() {
    let node = single();
    let bob = login(&node, "bob", "b").await;

    let err = create(&bob, request("alice", "bob", dec!(1), "bill")).await.unwrap_err();
    assert_eq!(err.class(), "InvalidFieldsViolation");

    let err = create(&bob, request("alice", "bob", dec!(1), "dormant")).await.unwrap_err();
    assert_eq!(err.class(), "InvalidFieldsViolation");

    let err = create(&bob, request("alice", "bob", dec!(1), "barter")).await.unwrap_err();
    assert_eq!(err.class(), "DoesNotExistViolation");

    let err = create(&bob, request("bob", "bob", dec!(1), "credit")).await.unwrap_err();
    assert_eq!(err.class(), "SameAccountViolation");
}

#[tokio::test]
async fn test_anonymous_cannot_create() {
    let node = single();
    let ctx = RequestContext::new(node, None);
    let err = create(&ctx, request("alice", "bob", dec!(1), "3rdparty")).await.unwrap_err();
    assert_eq!(err.class(), "PermissionViolation");
}

#[tokio::test]
async fn test_fee_entries_are_appended() {
    let mut blogic = MockBlogic::new();
    blogic
        .expect_add_rows()
        .withf(|workflow, primary| workflow == "credit" && primary.payer == "alice")
        .times(1)
        .returning(|_, primary| {
            Ok(vec![WireEntry {
                payee: "fees".into(),
                payer: primary.payer.clone(),
                quant: dec!(0.50),
                description: "service charge".into(),
                author: String::new(),
                metadata: BTreeMap::new(),
            }])
        });
    let node = single_with(Arc::new(blogic));
    let alice = login(&node, "alice", "a").await;

    let (tx, _) = create(&alice, request("bob", "alice", dec!(10), "credit")).await.unwrap();
    assert_eq!(tx.entries.len(), 2);
    let fee = &tx.entries[1];
    assert!(fee.is_additional && !fee.is_primary);
    assert_eq!(fee.quant, 50);
    assert_eq!(fee.author, "alice");

    change_state(&alice, tx.uuid, "completed").await.unwrap();
    assert_eq!(balance(&node, "alice").await, -1050);
    assert_eq!(balance(&node, "fees").await, 50);
}

#[tokio::test]
async fn test_stored_version_reloads_identically() {
    let node = single();
    let admin = login(&node, "admin", "x").await;
    let (tx, _) = create(&admin, request("alice", "bob", dec!(3.25), "3rdparty")).await.unwrap();

    let reloaded = load(&admin, tx.uuid).await.unwrap();
    assert_eq!(reloaded.entries, tx.entries);
    assert_eq!(reloaded.state, tx.state);
    assert_eq!(reloaded.version, tx.version);
}

#[tokio::test]
async fn test_filter_respects_visibility() {
    let node = single();
    let alice = login(&node, "alice", "a").await;
    let bob = login(&node, "bob", "b").await;
    let admin = login(&node, "admin", "x").await;

    create(&admin, request("alice", "bob", dec!(1), "3rdparty")).await.unwrap();
    create(&alice, request("alice", "bob", dec!(2), "bill")).await.unwrap();

    let involving_bob = FilterQuery {
        involving: Some("alpha/bob".into()),
        ..FilterQuery::default()
    };
    assert_eq!(filter(&alice, involving_bob.clone()).await.unwrap().len(), 2);
    assert_eq!(filter(&bob, involving_bob).await.unwrap().len(), 1);

    let bills = FilterQuery {
        types: Some("bill, credit".into()),
        ..FilterQuery::default()
    };
    assert_eq!(filter(&alice, bills).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_summary_and_history() {
    let node = single();
    let admin = login(&node, "admin", "x").await;
    let alice = login(&node, "alice", "a").await;

    create(&admin, request("alice", "bob", dec!(5), "3rdparty")).await.unwrap();
    create(&admin, request("bob", "alice", dec!(2), "3rdparty")).await.unwrap();
    let (bill, _) = create(&alice, request("alice", "bob", dec!(1), "bill")).await.unwrap();
    change_state(&alice, bill.uuid, "pending").await.unwrap();

    let Report::Local(summary) = reports::summary(&alice, "alice").await.unwrap() else {
        panic!("expected a local report");
    };
    assert_eq!(summary.completed.balance, dec!(3));
    assert_eq!(summary.completed.trades, 2);
    assert_eq!(summary.completed.volume, dec!(7));
    assert_eq!(summary.completed.partners, 1);
    assert_eq!(summary.pending.balance, dec!(4));
    assert_eq!(summary.pending.trades, 3);

    let Report::Local(history) = reports::history(&alice, "alice").await.unwrap() else {
        panic!("expected a local report");
    };
    let balances: Vec<Decimal> = history.iter().map(|p| p.balance).collect();
    assert_eq!(balances, vec![dec!(5), dec!(3)]);

    let Report::Local(limits) = reports::limits(&alice, None).await.unwrap() else {
        panic!("expected a local report");
    };
    assert_eq!(limits.len(), 4);
    assert_eq!(limits["bob"].max, dec!(100));
}

/// Routes relay calls to in-process nodes by url.
#[derive(Default)]
struct Loopback {
    nodes: Mutex<HashMap<String, Weak<Node>>>,
}

impl Loopback {
    fn register(&self, url: &str, node: &Arc<Node>) {
        self.nodes
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::downgrade(node));
    }

    async fn connect(&self, peer: &Peer) -> CcResult<RequestContext> {
        let node = self
            .nodes
            .lock()
            .unwrap()
            .get(&peer.url)
            .and_then(Weak::upgrade)
            .ok_or_else(|| CcError::UnavailableNode {
                node: peer.account_id.clone(),
                reason: "not registered".into(),
            })?;
        let caller = node
            .authenticate(Some(&peer.node_name), peer.hash.as_deref())
            .await?;
        Ok(RequestContext::new(node, caller))
    }
}

fn to_value<T: serde::Serialize>(report: T) -> CcResult<Value> {
    serde_json::to_value(report).map_err(|e| CcError::Failure(e.to_string()))
}

#[async_trait]
impl Relay for Loopback {
    async fn new_transaction(&self, peer: &Peer, tx: &WireTransaction) -> CcResult<WireTransaction> {
        let ctx = self.connect(peer).await?;
        receive_relay(&ctx, tx.clone()).await
    }

    async fn change_state(&self, peer: &Peer, uuid: Uuid, target: &str) -> CcResult<()> {
        let ctx = self.connect(peer).await?;
        lifecycle::change_state(&ctx, uuid, target).await.map(|_| ())
    }

    async fn handshake(&self, peer: &Peer) -> CcResult<()> {
        self.connect(peer).await.map(|_| ())
    }

    async fn absolute_path(&self, peer: &Peer) -> CcResult<Vec<String>> {
        let ctx = self.connect(peer).await?;
        ctx.node.absolute_path().await
    }

    async fn workflows(&self, peer: &Peer) -> CcResult<Vec<Workflow>> {
        let ctx = self.connect(peer).await?;
        Ok(ctx.node.workflows.all().into_iter().cloned().collect())
    }

    async fn autocomplete(&self, peer: &Peer, fragment: &str) -> CcResult<Vec<String>> {
        let ctx = self.connect(peer).await?;
        crate::address::autocomplete(&ctx, fragment).await
    }

    async fn account_summary(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        let ctx = self.connect(peer).await?;
        to_value(reports::summary(&ctx, path).await?)
    }

    async fn account_limits(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        let ctx = self.connect(peer).await?;
        to_value(reports::limits(&ctx, Some(path)).await?)
    }

    async fn account_history(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        let ctx = self.connect(peer).await?;
        to_value(reports::history(&ctx, path).await?)
    }
}

struct Tree {
    root: Arc<Node>,
    alpha: Arc<Node>,
    beta: Arc<Node>,
    _relay: Arc<Loopback>,
}

/// `root` over `alpha` (same currency) and `beta` (one beta unit is two root units).
fn tree() -> Tree {
    tree_with_alpha_rate(dec!(1))
}

fn tree_with_alpha_rate(alpha_rate: Decimal) -> Tree {
    let relay = Arc::new(Loopback::default());

    let root = build(
        NodeConfig::named("root", None),
        MemoryDirectory::new()
            .with(record("alpha", Some("mem://alpha"), false), None)
            .with(record("beta", Some("mem://beta"), false), None)
            .with(record("admin", None, true), Some("x")),
        Arc::new(NoFees),
        relay.clone(),
    );
    let mut alpha_config = NodeConfig::named("alpha", Some("root"));
    alpha_config.conversion_rate = alpha_rate;
    let alpha = build(
        alpha_config,
        MemoryDirectory::new()
            .with(record("alice", None, false), Some("a"))
            .with(record("bob", None, false), Some("b"))
            .with(record("admin", None, true), Some("x"))
            .with(record("root", Some("mem://root"), false), None),
        Arc::new(NoFees),
        relay.clone(),
    );
    let mut beta_config = NodeConfig::named("beta", Some("root"));
    beta_config.conversion_rate = dec!(2);
    let beta = build(
        beta_config,
        MemoryDirectory::new()
            .with(record("carol", None, false), Some("c"))
            .with(record("dave", None, false), Some("d"))
            .with(record("root", Some("mem://root"), false), None),
        Arc::new(NoFees),
        relay.clone(),
    );
    relay.register("mem://root", &root);
    relay.register("mem://alpha", &alpha);
    relay.register("mem://beta", &beta);
    Tree { root, alpha, beta, _relay: relay }
}

async fn all_ok(node: &Arc<Node>) -> bool {
    node.handshake_neighbors()
        .await
        .unwrap()
        .keys()
        .all(|status| status == "ok")
}

#[tokio::test]
async fn test_transversal_payment_reaches_every_owner() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;

    let (tx, outcome) = create(&alice, request("beta/dave", "alice", dec!(10), "3rdparty"))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::Confirmed);
    assert!(tx.is_transversal());
    assert_eq!(tx.primary().payee.id, "root");
    assert_eq!(tx.primary().payee.rel_path, "beta/dave");
    assert_eq!(tx.primary().trunkward_quant, Some(1000));

    assert_eq!(balance(&tree.alpha, "alice").await, -1000);
    assert_eq!(balance(&tree.alpha, "root").await, 1000);
    assert_eq!(balance(&tree.root, "alpha").await, -1000);
    assert_eq!(balance(&tree.root, "beta").await, 1000);
    assert_eq!(balance(&tree.beta, "root").await, -500);
    assert_eq!(balance(&tree.beta, "dave").await, 500);

    let at_beta = tree.beta.store.latest(tx.uuid).await.unwrap().unwrap();
    assert_eq!(at_beta.version, 1);
    assert_eq!(at_beta.scribe, "root");
    assert_eq!(at_beta.entries[0].trunkward_quant, Some(1000));
    assert_eq!(at_beta.entries[0].metadata.get("root").map(String::as_str), Some("alpha/alice"));

    assert!(all_ok(&tree.alpha).await);
    assert!(all_ok(&tree.root).await);
    assert!(all_ok(&tree.beta).await);
}

#[tokio::test]
async fn test_state_change_travels_the_route() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;
    let admin = login(&tree.alpha, "admin", "x").await;

    let (tx, _) = create(&alice, request("root/beta/carol", "alice", dec!(4), "3rdparty"))
        .await
        .unwrap();
    let erased = change_state(&admin, tx.uuid, "erased").await.unwrap();
    assert_eq!(erased.version, 2);

    for node in [&tree.alpha, &tree.root, &tree.beta] {
        let live = node.store.latest(tx.uuid).await.unwrap().unwrap();
        assert_eq!(live.state, "erased");
        assert_eq!(live.version, 2);
    }
    assert_eq!(balance(&tree.beta, "carol").await, 0);
    assert!(all_ok(&tree.alpha).await);
    assert!(all_ok(&tree.beta).await);
}

#[tokio::test]
async fn test_intermediate_ledger_cannot_originate() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;
    let (tx, _) = create(&alice, request("beta/dave", "alice", dec!(1), "3rdparty"))
        .await
        .unwrap();

    let root_admin = login(&tree.root, "admin", "x").await;
    let err = change_state(&root_admin, tx.uuid, "erased").await.unwrap_err();
    assert_eq!(err.class(), "IntermediateLedgerViolation");
}

#[tokio::test]
async fn test_transversal_bill_waits_for_confirmation() {
    let tree = tree();
    let dave = login(&tree.beta, "dave", "d").await;

    let (tx, outcome) = create(&dave, request("dave", "alpha/bob", dec!(3), "bill"))
        .await
        .unwrap();
    assert_eq!(outcome, InsertOutcome::AwaitingConfirmation);
    assert_eq!(tree.alpha.store.latest(tx.uuid).await.unwrap().unwrap().version, 0);
    assert_eq!(delete(&dave, tx.uuid).await.unwrap_err().class(), "PermissionViolation");

    change_state(&dave, tx.uuid, "pending").await.unwrap();
    let bob = login(&tree.alpha, "bob", "b").await;
    let done = change_state(&bob, tx.uuid, "completed").await.unwrap();
    assert_eq!(done.version, 2);

    // 3.00 beta units are 6.00 root units, and alpha shares root's currency.
    assert_eq!(balance(&tree.alpha, "bob").await, -600);
    assert_eq!(balance(&tree.beta, "dave").await, 300);
    assert!(all_ok(&tree.root).await);
}

#[tokio::test]
async fn test_hash_mismatch_is_reported() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;
    create(&alice, request("beta/dave", "alice", dec!(1), "3rdparty"))
        .await
        .unwrap();

    let err = tree.root.authenticate(Some("alpha"), None).await.unwrap_err();
    assert_eq!(err.class(), "HashMismatchFailure");
    let err = tree.root.authenticate(Some("alpha"), Some("bogus")).await.unwrap_err();
    assert_eq!(err.class(), "HashMismatchFailure");
}

#[tokio::test]
async fn test_relay_endpoint_is_for_neighbors() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;
    let wire = WireTransaction {
        uuid: Uuid::now_v7(),
        workflow: "3rdparty".into(),
        state: String::new(),
        version: -1,
        entries: Vec::new(),
    };
    let err = receive_relay(&alice, wire).await.unwrap_err();
    assert_eq!(err.class(), "PermissionViolation");
}

#[tokio::test]
async fn test_remote_reports_are_relayed() {
    let tree = tree();
    let alice = login(&tree.alpha, "alice", "a").await;
    create(&alice, request("beta/dave", "alice", dec!(10), "3rdparty"))
        .await
        .unwrap();

    let Report::Relayed(summary) = reports::summary(&alice, "beta/dave").await.unwrap() else {
        panic!("expected a relayed report");
    };
    // Beta reports 5.00 beta units to root as 10.00 root units, and alpha
    // shares root's currency.
    assert_eq!(summary.completed.balance, dec!(10.00));
}

#[tokio::test]
async fn test_relayed_reports_come_back_in_local_currency() {
    // One alpha unit is two root units, and one beta unit is two root units.
    let tree = tree_with_alpha_rate(dec!(2));
    let alice = login(&tree.alpha, "alice", "a").await;
    let (tx, _) = create(&alice, request("beta/dave", "alice", dec!(10), "3rdparty"))
        .await
        .unwrap();
    assert_eq!(tx.primary().trunkward_quant, Some(2000));
    assert_eq!(balance(&tree.beta, "dave").await, 1000);

    let Report::Relayed(summary) = reports::summary(&alice, "beta/dave").await.unwrap() else {
        panic!("expected a relayed report");
    };
    assert_eq!(summary.completed.balance, dec!(10.00));
    assert_eq!(summary.completed.volume, dec!(10.00));
    assert_eq!(summary.completed.trades, 1);

    let Report::Relayed(history) = reports::history(&alice, "beta/dave").await.unwrap() else {
        panic!("expected a relayed report");
    };
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance, dec!(10.00));

    let Report::Relayed(limits) = reports::limits(&alice, Some("beta/dave")).await.unwrap() else {
        panic!("expected a relayed report");
    };
    assert_eq!(limits["dave"].max, dec!(100.00));
    assert_eq!(limits["dave"].min, dec!(-100.00));
}

#[tokio::test]
async fn test_blocked_neighbor_cannot_authenticate() {
    let mut root = record("root", Some("mem://root"), false);
    root.status = false;
    let directory = MemoryDirectory::new()
        .with(record("alice", None, false), Some("a"))
        .with(root, None);
    let node = build(
        NodeConfig::named("alpha", Some("root")),
        directory,
        Arc::new(NoFees),
        Arc::new(NoNeighbors),
    );

    let err = node.authenticate(Some("root"), None).await.unwrap_err();
    assert_eq!(err.class(), "PermissionViolation");
}

#[tokio::test]
async fn test_unknown_user_is_auth_violation() {
    let node = single();
    let err = node.authenticate(Some("mallory"), Some("m")).await.unwrap_err();
    assert_eq!(err.class(), "AuthViolation");
    assert_eq!(err.details()["acc"], "mallory");
}

#[tokio::test]
async fn test_absolute_path_and_workflows() {
    let tree = tree();
    assert_eq!(tree.beta.absolute_path().await.unwrap(), vec!["root", "beta"]);
    assert_eq!(tree.root.absolute_path().await.unwrap(), vec!["root"]);
    assert_eq!(tree.alpha.trunkward_workflows().await.unwrap().len(), 4);
}
