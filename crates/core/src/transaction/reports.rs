//! Account reports: summary, history and limits.
//!
//! A path naming an account beyond a neighbor is answered by that neighbor.
//! The trunk answers in trunk currency and branches answer in ours, so
//! relayed figures are re-expressed before they go back to the caller.

use std::collections::{BTreeMap, BTreeSet};

use ccnode_shared::{CcError, CcResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::lifecycle::COUNTED_STATES;
use crate::account::Account;
use crate::address::resolve_to_local_account;
use crate::context::RequestContext;
use crate::entry::TrunkwardRate;
use crate::orientation::Orientation;
use crate::storage::AccountEntry;
use crate::workflow::STATE_COMPLETED;

/// A report computed here or by a neighbor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report<T> {
    /// Computed from this node's ledger.
    Local(T),
    /// Answered by a neighbor, in the caller's currency.
    Relayed(T),
}

/// Trading statistics over one set of states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStats {
    /// Net balance.
    pub balance: Decimal,
    /// Distinct transactions.
    pub trades: usize,
    /// Entries touching the account.
    pub entries: usize,
    /// Total received.
    pub gross_in: Decimal,
    /// Total paid.
    pub gross_out: Decimal,
    /// Received plus paid.
    pub volume: Decimal,
    /// Distinct counterparties.
    pub partners: usize,
}

/// Statistics of one account.
///
/// `pending` counts pending and completed transactions, which is the
/// balance limits are checked against; `completed` counts completed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Including pending transactions.
    pub pending: StateStats,
    /// Completed transactions only.
    pub completed: StateStats,
}

/// Balance after one completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// The transaction.
    pub uuid: Uuid,
    /// When its live version was written.
    pub written: DateTime<Utc>,
    /// Running balance.
    pub balance: Decimal,
}

/// Balance limits in display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsView {
    /// Lowest balance allowed.
    pub min: Decimal,
    /// Highest balance allowed.
    pub max: Decimal,
}

enum Target {
    Here(Account),
    Beyond(Account),
}

async fn target(ctx: &RequestContext, path: &str) -> CcResult<(Target, Orientation)> {
    let account = resolve_to_local_account(ctx, path, false).await?;
    let mut orientation = Orientation::new(ctx.caller.as_ref());
    if account.is_remote() && !account.rel_path.is_empty() {
        orientation.route_to(&account);
        Ok((Target::Beyond(account), orientation))
    } else {
        orientation.respond();
        Ok((Target::Here(account), orientation))
    }
}

/// Re-expresses display values received from a neighbor for the caller.
struct Rescale {
    rate: TrunkwardRate,
    from_trunk: bool,
    to_trunk: bool,
}

impl Rescale {
    /// Reads both currencies off the orientation, which ends up responding.
    fn new(rate: TrunkwardRate, orientation: &mut Orientation) -> Self {
        let from_trunk = orientation.going_rootwards();
        orientation.respond();
        Self {
            rate,
            from_trunk,
            to_trunk: orientation.going_rootwards(),
        }
    }

    fn value(&self, display: Decimal) -> CcResult<Decimal> {
        let units = if self.from_trunk {
            self.rate.from_trunk(self.rate.trunk().to_units(display)?)?
        } else {
            self.rate.local().to_units(display)?
        };
        self.rate.display(units, self.to_trunk)
    }

    fn stats(&self, stats: StateStats) -> CcResult<StateStats> {
        Ok(StateStats {
            balance: self.value(stats.balance)?,
            gross_in: self.value(stats.gross_in)?,
            gross_out: self.value(stats.gross_out)?,
            volume: self.value(stats.volume)?,
            ..stats
        })
    }

    fn limits(&self, limits: LimitsView) -> CcResult<LimitsView> {
        Ok(LimitsView {
            min: self.value(limits.min)?,
            max: self.value(limits.max)?,
        })
    }
}

fn parse<T: DeserializeOwned>(neighbor: &Account, report: Value) -> CcResult<T> {
    serde_json::from_value(report)
        .map_err(|e| CcError::Failure(format!("malformed report from '{}': {e}", neighbor.id)))
}

fn stats(
    acc: &str,
    entries: &[AccountEntry],
    rate: &TrunkwardRate,
    trunk: bool,
) -> CcResult<StateStats> {
    let out_of_range = || CcError::invalid("quant", "balance out of range");
    let mut balance = 0i64;
    let mut gross_in = 0i64;
    let mut gross_out = 0i64;
    let mut trades = BTreeSet::new();
    let mut partners = BTreeSet::new();
    for entry in entries {
        let delta = entry.delta_for(acc);
        balance = balance.checked_add(delta).ok_or_else(out_of_range)?;
        if delta > 0 {
            gross_in = gross_in.checked_add(delta).ok_or_else(out_of_range)?;
        } else {
            gross_out = gross_out.checked_sub(delta).ok_or_else(out_of_range)?;
        }
        trades.insert(entry.uuid);
        partners.insert(entry.partner_of(acc));
    }
    let volume = gross_in.checked_add(gross_out).ok_or_else(out_of_range)?;
    Ok(StateStats {
        balance: rate.display(balance, trunk)?,
        trades: trades.len(),
        entries: entries.len(),
        gross_in: rate.display(gross_in, trunk)?,
        gross_out: rate.display(gross_out, trunk)?,
        volume: rate.display(volume, trunk)?,
        partners: partners.len(),
    })
}

/// Trading statistics of the account at `path`.
pub async fn summary(ctx: &RequestContext, path: &str) -> CcResult<Report<Summary>> {
    ctx.require_caller()?;
    let node = &ctx.node;
    let (account, orientation) = match target(ctx, path).await? {
        (Target::Beyond(account), mut orientation) => {
            let peer = node.peer(&account).await?;
            let report = node.relay.account_summary(&peer, &account.rel_path).await?;
            let relayed: Summary = parse(&account, report)?;
            let rescale = Rescale::new(node.rate(), &mut orientation);
            return Ok(Report::Relayed(Summary {
                pending: rescale.stats(relayed.pending)?,
                completed: rescale.stats(relayed.completed)?,
            }));
        }
        (Target::Here(account), orientation) => (account, orientation),
    };

    let counted = node.store.entries_for_account(&account.id, COUNTED_STATES).await?;
    let completed: Vec<AccountEntry> = counted
        .iter()
        .filter(|e| e.state == STATE_COMPLETED)
        .cloned()
        .collect();
    let rate = node.rate();
    let trunk = orientation.going_rootwards();
    Ok(Report::Local(Summary {
        pending: stats(&account.id, &counted, &rate, trunk)?,
        completed: stats(&account.id, &completed, &rate, trunk)?,
    }))
}

/// Running balance of the account at `path` after each completed transaction.
pub async fn history(ctx: &RequestContext, path: &str) -> CcResult<Report<Vec<HistoryPoint>>> {
    ctx.require_caller()?;
    let node = &ctx.node;
    let (account, orientation) = match target(ctx, path).await? {
        (Target::Beyond(account), mut orientation) => {
            let peer = node.peer(&account).await?;
            let report = node.relay.account_history(&peer, &account.rel_path).await?;
            let relayed: Vec<HistoryPoint> = parse(&account, report)?;
            let rescale = Rescale::new(node.rate(), &mut orientation);
            return relayed
                .into_iter()
                .map(|point| {
                    Ok(HistoryPoint {
                        balance: rescale.value(point.balance)?,
                        ..point
                    })
                })
                .collect::<CcResult<Vec<_>>>()
                .map(Report::Relayed);
        }
        (Target::Here(account), orientation) => (account, orientation),
    };

    let rate = node.rate();
    let trunk = orientation.going_rootwards();
    let mut balance = 0i64;
    let mut points: Vec<(Uuid, DateTime<Utc>, i64)> = Vec::new();
    for entry in node
        .store
        .entries_for_account(&account.id, &[STATE_COMPLETED])
        .await?
    {
        balance = balance
            .checked_add(entry.delta_for(&account.id))
            .ok_or_else(|| CcError::invalid("quant", "balance out of range"))?;
        match points.last_mut() {
            Some(last) if last.0 == entry.uuid => last.2 = balance,
            _ => points.push((entry.uuid, entry.written, balance)),
        }
    }
    points
        .into_iter()
        .map(|(uuid, written, units)| {
            Ok(HistoryPoint {
                uuid,
                written,
                balance: rate.display(units, trunk)?,
            })
        })
        .collect::<CcResult<Vec<_>>>()
        .map(Report::Local)
}

/// Limits of the account at `path`, or of every account without one.
pub async fn limits(
    ctx: &RequestContext,
    path: Option<&str>,
) -> CcResult<Report<BTreeMap<String, LimitsView>>> {
    ctx.require_caller()?;
    let node = &ctx.node;
    let rate = node.rate();
    let view = |min: i64, max: i64, orientation: &Orientation| -> CcResult<LimitsView> {
        let trunk = orientation.going_rootwards();
        Ok(LimitsView {
            min: rate.display(min, trunk)?,
            max: rate.display(max, trunk)?,
        })
    };

    let Some(path) = path.filter(|p| !p.trim_matches('/').is_empty()) else {
        let mut orientation = Orientation::new(ctx.caller.as_ref());
        orientation.respond();
        return node
            .directory
            .all_limits()
            .await?
            .into_iter()
            .map(|(id, l)| Ok((id, view(l.min, l.max, &orientation)?)))
            .collect::<CcResult<BTreeMap<_, _>>>()
            .map(Report::Local);
    };
    match target(ctx, path).await? {
        (Target::Beyond(account), mut orientation) => {
            let peer = node.peer(&account).await?;
            let report = node.relay.account_limits(&peer, &account.rel_path).await?;
            let relayed: BTreeMap<String, LimitsView> = parse(&account, report)?;
            let rescale = Rescale::new(rate, &mut orientation);
            relayed
                .into_iter()
                .map(|(id, limits)| Ok((id, rescale.limits(limits)?)))
                .collect::<CcResult<BTreeMap<_, _>>>()
                .map(Report::Relayed)
        }
        (Target::Here(account), orientation) => Ok(Report::Local(BTreeMap::from([(
            account.id.clone(),
            view(account.min, account.max, &orientation)?,
        )]))),
    }
}
