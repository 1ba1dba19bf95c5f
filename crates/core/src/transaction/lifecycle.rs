//! Building, validating, writing and moving transactions.
//!
//! The order of a new transaction is fixed: resolve the parties, build the
//! primary entry, ask the fee service for extra rows, relay downstream and
//! merge what the neighbor added, check limits, then write. A relay failure
//! aborts before anything is written here.

use std::collections::BTreeMap;

use ccnode_shared::{CcError, CcResult};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::Transaction;
use crate::account::Account;
use crate::address::{resolve_from_neighbor, resolve_to_local_account};
use crate::context::RequestContext;
use crate::entry::{Entry, NewEntry, WireEntry, net_flows};
use crate::orientation::Orientation;
use crate::relay::WireTransaction;
use crate::storage::{TransactionFilter, WriteMode};
use crate::workflow::{STATE_COMPLETED, STATE_PENDING, STATE_VALIDATED, Workflow};

/// Balances that count against limits.
pub(crate) const COUNTED_STATES: &[&str] = &[STATE_PENDING, STATE_COMPLETED];

/// Body of a new-transaction request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// Payee path.
    pub payee: String,
    /// Payer path.
    pub payer: String,
    /// Quantity in local display units.
    #[serde(alias = "quantity")]
    pub quant: Decimal,
    /// Workflow id.
    #[serde(rename = "type")]
    pub workflow: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Auxiliary information stored with the primary entry.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// What a first write produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Written straight into the workflow's creation state.
    Confirmed,
    /// Held as validated until the author confirms it.
    AwaitingConfirmation,
}

/// Creates a transaction on behalf of a local caller.
pub async fn create(
    ctx: &RequestContext,
    request: NewTransaction,
) -> CcResult<(Transaction, InsertOutcome)> {
    let caller = ctx.require_caller()?;
    if caller.is_remote() {
        return Err(CcError::Permission(
            "neighbors submit transactions through the relay endpoint".into(),
        ));
    }
    let node = &ctx.node;
    let workflow = active_workflow(ctx, &request.workflow)?;

    let payee = resolve_to_local_account(ctx, &request.payee, false).await?;
    let payer = resolve_to_local_account(ctx, &request.payer, false).await?;
    if !caller.is_admin() && !workflow.may_initiate(&caller.id, &payee.id, &payer.id) {
        return Err(CcError::invalid(
            "type",
            format!(
                "'{}' may not initiate a '{}' transaction ({} direction)",
                caller.id, workflow.id, workflow.direction
            ),
        ));
    }

    let rate = node.rate();
    let primary = Entry::create(
        NewEntry {
            payee,
            payer,
            quant: rate.local().to_units(request.quant)?,
            trunkward_quant: None,
            author: caller.id.clone(),
            description: request.description,
            metadata: request.metadata,
            is_primary: true,
            is_additional: false,
        },
        &node.config,
        &rate,
    )?;
    let mut tx = Transaction::new(Uuid::now_v7(), workflow.id.clone(), primary, caller.id.clone());

    let mut orientation = Orientation::new(Some(caller));
    orientation.orient(&tx.primary().payee, &tx.primary().payer)?;
    build_validate(ctx, &mut tx, &mut orientation, workflow).await?;

    let outcome = insert(ctx, &mut tx, workflow, WriteMode::ReplaceUnconfirmed).await?;
    Ok((tx, outcome))
}

/// Validates and stores a transaction relayed by the upstream neighbor.
///
/// Answers with the entries added here or further downstream that involve
/// the caller, serialized for it.
pub async fn receive_relay(ctx: &RequestContext, wire: WireTransaction) -> CcResult<WireTransaction> {
    let caller = ctx.require_caller()?;
    if !caller.is_remote() {
        return Err(CcError::Permission("only neighbors may relay transactions".into()));
    }
    if ctx.node.store.latest(wire.uuid).await?.is_some() {
        return Err(CcError::invalid("uuid", format!("{} already exists", wire.uuid)));
    }
    let workflow = active_workflow(ctx, &wire.workflow)?;
    let mut orientation = Orientation::new(Some(caller));

    let mut entries = Vec::with_capacity(wire.entries.len());
    for (i, row) in wire.entries.iter().enumerate() {
        let position = RowSource {
            from: caller,
            from_trunk: orientation.upstream_is_trunk(),
            is_primary: i == 0,
        };
        entries.push(entry_from_wire(ctx, row, &position).await?);
    }
    let Some(primary) = entries.first() else {
        return Err(CcError::invalid("entries", "must not be empty"));
    };
    if !primary.involves(&caller.id) {
        return Err(CcError::Permission(format!(
            "'{}' is not a party to the transaction",
            caller.id
        )));
    }

    let received = entries.len();
    let mut tx = Transaction::new(wire.uuid, workflow.id.clone(), primary.clone(), caller.id.clone());
    tx.entries = entries;
    orientation.orient(&tx.primary().payee, &tx.primary().payer)?;
    build_validate(ctx, &mut tx, &mut orientation, workflow).await?;
    insert(ctx, &mut tx, workflow, WriteMode::Append).await?;

    Ok(WireTransaction {
        uuid: tx.uuid,
        workflow: tx.workflow.clone(),
        state: tx.state.clone(),
        version: tx.version,
        entries: Transaction::wire_entries(&ctx.node, &tx.entries[received..], &orientation)?,
    })
}

fn active_workflow<'a>(ctx: &'a RequestContext, id: &str) -> CcResult<&'a Workflow> {
    let workflow = ctx.node.workflows.get(id)?;
    if !workflow.active {
        return Err(CcError::invalid("type", format!("workflow '{id}' is inactive")));
    }
    Ok(workflow)
}

/// The neighbor a row arrived from and where it sits in the transaction.
struct RowSource<'a> {
    from: &'a Account,
    from_trunk: bool,
    is_primary: bool,
}

/// Turns a row received from an adjacent neighbor into an entry.
///
/// Rows from the trunk carry trunk units; the received value is kept so
/// replies toward the trunk echo it exactly.
async fn entry_from_wire(ctx: &RequestContext, row: &WireEntry, source: &RowSource<'_>) -> CcResult<Entry> {
    let node = &ctx.node;
    let rate = node.rate();
    let from = source.from;
    let payee = resolve_from_neighbor(ctx, &row.payee, from).await?;
    let payer = resolve_from_neighbor(ctx, &row.payer, from).await?;
    let (quant, trunkward_quant) = if source.from_trunk {
        let trunk_units = rate.trunk().to_units(row.quant)?;
        (rate.from_trunk(trunk_units)?, Some(trunk_units))
    } else {
        (rate.local().to_units(row.quant)?, None)
    };
    let author = if row.author.is_empty() {
        from.id.clone()
    } else {
        row.author.clone()
    };
    Entry::create(
        NewEntry {
            payee,
            payer,
            quant,
            trunkward_quant,
            author,
            description: row.description.clone(),
            metadata: row.metadata.clone(),
            is_primary: source.is_primary,
            is_additional: !source.is_primary,
        },
        &node.config,
        &rate,
    )
}

/// Adds fees and downstream entries, checks limits, and marks the
/// transaction validated.
async fn build_validate(
    ctx: &RequestContext,
    tx: &mut Transaction,
    orientation: &mut Orientation,
    workflow: &Workflow,
) -> CcResult<()> {
    let node = &ctx.node;
    let rate = node.rate();

    let fees = node
        .blogic
        .add_rows(&workflow.id, &tx.primary().to_local_wire(&rate))
        .await?;
    for row in fees {
        let payee = resolve_to_local_account(ctx, &row.payee, false).await?;
        let payer = resolve_to_local_account(ctx, &row.payer, false).await?;
        let author = if row.author.is_empty() {
            tx.primary().author.clone()
        } else {
            row.author
        };
        tx.entries.push(Entry::create(
            NewEntry {
                payee,
                payer,
                quant: rate.local().to_units(row.quant)?,
                trunkward_quant: None,
                author,
                description: row.description,
                metadata: row.metadata,
                is_primary: false,
                is_additional: true,
            },
            &node.config,
            &rate,
        )?);
    }

    if orientation.going_downstream()
        && let Some(downstream) = orientation.downstream()
    {
        let peer = node.peer(downstream).await?;
        let wire = tx.to_wire(node, orientation)?;
        debug!(uuid = %tx.uuid, to = %downstream.id, entries = wire.entries.len(), "Relaying new transaction");
        let answer = node.relay.new_transaction(&peer, &wire).await?;
        let source = RowSource {
            from: downstream,
            from_trunk: orientation.going_rootwards(),
            is_primary: false,
        };
        for row in &answer.entries {
            tx.entries.push(entry_from_wire(ctx, row, &source).await?);
        }
    }
    orientation.respond();

    check_limits(ctx, tx, orientation).await?;
    tx.state = STATE_VALIDATED.to_string();
    Ok(())
}

/// Fails if any account would move past a limit.
///
/// Only accounts the transaction moves toward a limit are checked; both
/// limits are inclusive. Figures in the error travel in the currency of the
/// node being answered.
async fn check_limits(ctx: &RequestContext, tx: &Transaction, orientation: &Orientation) -> CcResult<()> {
    let node = &ctx.node;
    let rate = node.rate();
    let report = |units: i64| rate.display(units, orientation.going_rootwards());
    let out_of_range = || CcError::invalid("quant", "balance out of range");

    for (acc_id, flow) in net_flows(&tx.entries)? {
        if flow == 0 {
            continue;
        }
        let account = ctx.account(&acc_id).await?;
        let balance = node
            .store
            .entries_for_account(&acc_id, COUNTED_STATES)
            .await?
            .iter()
            .try_fold(0i64, |sum, e| sum.checked_add(e.delta_for(&acc_id)))
            .ok_or_else(out_of_range)?;
        let projected = balance.checked_add(flow).ok_or_else(out_of_range)?;

        if flow > 0 && projected > account.max {
            return Err(CcError::MaxLimit {
                acc: acc_id,
                limit: report(account.max)?,
                projected: report(projected)?,
                diff: report(projected.checked_sub(account.max).ok_or_else(out_of_range)?)?,
            });
        }
        if flow < 0 && projected < account.min {
            return Err(CcError::MinLimit {
                acc: acc_id,
                limit: report(account.min)?,
                projected: report(projected)?,
                diff: report(account.min.checked_sub(projected).ok_or_else(out_of_range)?)?,
            });
        }
    }
    Ok(())
}

/// First write of a validated transaction.
async fn insert(
    ctx: &RequestContext,
    tx: &mut Transaction,
    workflow: &Workflow,
    mode: WriteMode,
) -> CcResult<InsertOutcome> {
    let outcome = if workflow.auto_confirms() {
        tx.state.clone_from(&workflow.creation.state);
        tx.version = 1;
        InsertOutcome::Confirmed
    } else {
        tx.version = 0;
        InsertOutcome::AwaitingConfirmation
    };
    let mode = match outcome {
        InsertOutcome::Confirmed => WriteMode::Append,
        InsertOutcome::AwaitingConfirmation => mode,
    };
    write(ctx, tx, mode).await?;
    Ok(outcome)
}

/// Stores the transaction's current version.
async fn write(ctx: &RequestContext, tx: &mut Transaction, mode: WriteMode) -> CcResult<()> {
    tx.written = Some(Utc::now());
    let links = tx.hash_links(ctx).await?;
    let tx_id = ctx.node.store.write_version(&tx.to_record(), mode, &links).await?;
    tx.tx_id = Some(tx_id);
    info!(
        uuid = %tx.uuid,
        version = tx.version,
        state = %tx.state,
        scribe = %tx.scribe,
        "Transaction written"
    );
    Ok(())
}

/// Loads the live version of a transaction visible to the caller.
///
/// A validated transaction exists only for its scribe.
pub async fn load(ctx: &RequestContext, uuid: Uuid) -> CcResult<Transaction> {
    let record = ctx
        .node
        .store
        .latest(uuid)
        .await?
        .ok_or_else(|| CcError::no_transaction(uuid))?;
    if record.state == STATE_VALIDATED && ctx.caller_id() != Some(record.scribe.as_str()) {
        return Err(CcError::no_transaction(uuid));
    }
    Transaction::from_record(ctx, record).await
}

/// Moves a transaction to `target`, forwarding the change downstream first.
pub async fn change_state(ctx: &RequestContext, uuid: Uuid, target: &str) -> CcResult<Transaction> {
    let caller = ctx.require_caller()?;
    let node = &ctx.node;
    let mut tx = load(ctx, uuid).await?;

    let mut orientation = Orientation::new(Some(caller));
    orientation.orient(&tx.primary().payee, &tx.primary().payer)?;
    let workflow = node.workflows.get(&tx.workflow)?;
    workflow.authorize(&tx.parties(), &caller.id, target, tx.admin_override(caller))?;

    if let Some(downstream) = orientation.downstream() {
        let peer = node.peer(downstream).await?;
        debug!(uuid = %uuid, to = %downstream.id, target, "Relaying state change");
        node.relay.change_state(&peer, uuid, target).await?;
    }

    tx.state = target.to_string();
    tx.version += 1;
    tx.scribe.clone_from(&caller.id);
    write(ctx, &mut tx, WriteMode::Append).await?;
    Ok(tx)
}

/// Removes an unconfirmed local transaction.
pub async fn delete(ctx: &RequestContext, uuid: Uuid) -> CcResult<()> {
    let tx = load(ctx, uuid).await?;
    if tx.state != STATE_VALIDATED {
        return Err(CcError::Workflow {
            workflow: tx.workflow,
            from: tx.state,
            to: "deleted".into(),
        });
    }
    if tx.is_transversal() {
        return Err(CcError::Permission(
            "transactions spanning nodes cannot be deleted".into(),
        ));
    }
    ctx.node.store.delete_unconfirmed(uuid).await?;
    info!(uuid = %uuid, "Unconfirmed transaction deleted");
    Ok(())
}

/// Query for [`filter`], with parties given as paths.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    /// Exact uuid.
    pub uuid: Option<Uuid>,
    /// Payee path.
    pub payee: Option<String>,
    /// Payer path.
    pub payer: Option<String>,
    /// Path of an account on either side.
    pub involving: Option<String>,
    /// Comma separated states.
    pub states: Option<String>,
    /// Comma separated workflow ids.
    pub types: Option<String>,
    /// Author id.
    pub author: Option<String>,
    /// Description substring.
    pub description: Option<String>,
    /// Written at or after.
    pub after: Option<chrono::DateTime<Utc>>,
    /// Written before.
    pub before: Option<chrono::DateTime<Utc>>,
    /// Page size.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

fn comma_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Live transactions visible to the caller.
pub async fn filter(ctx: &RequestContext, query: FilterQuery) -> CcResult<Vec<Transaction>> {
    let caller = ctx.require_caller()?;
    let mut criteria = TransactionFilter {
        uuid: query.uuid,
        states: comma_list(query.states.as_deref()),
        types: comma_list(query.types.as_deref()),
        author: query.author,
        description: query.description,
        after: query.after,
        before: query.before,
        limit: query.limit,
        offset: query.offset,
        viewer: Some(caller.id.clone()),
        ..TransactionFilter::default()
    };
    for (path, slot) in [
        (query.payee, &mut criteria.payee),
        (query.payer, &mut criteria.payer),
        (query.involving, &mut criteria.involving),
    ] {
        if let Some(path) = path {
            *slot = Some(resolve_to_local_account(ctx, &path, false).await?.id);
        }
    }

    let records = ctx.node.store.filter(&criteria).await?;
    let mut found = Vec::with_capacity(records.len());
    for record in records {
        found.push(Transaction::from_record(ctx, record).await?);
    }
    Ok(found)
}
