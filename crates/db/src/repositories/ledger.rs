//! Ledger repository: the SQL implementation of the versioned store.
//!
//! A version row, its entries, its hash links and the removal of the
//! scribe's previous unconfirmed transaction commit in one database
//! transaction. The unique index on `unconfirmed_by` backs the one
//! unconfirmed transaction per author rule.

use std::collections::HashMap;

use async_trait::async_trait;
use ccnode_core::storage::{
    AccountEntry, EntryRecord, HashLink, LedgerStore, TransactionFilter, TransactionRecord,
    WriteMode,
};
use ccnode_core::workflow::STATE_VALIDATED;
use ccnode_shared::{CcError, CcResult};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{entries, hash_history, transactions};

/// Error types for ledger storage.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Stored metadata is not a string map.
    #[error("Corrupt entry metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl From<LedgerError> for CcError {
    fn from(err: LedgerError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Only the highest version of each uuid.
fn live() -> SimpleExpr {
    Expr::cust(
        "transactions.version = (SELECT MAX(t2.version) FROM transactions t2 WHERE t2.uuid = transactions.uuid)",
    )
}

/// Versions with at least one entry matching `cond`.
fn with_entry(cond: Condition) -> SimpleExpr {
    transactions::Column::Id.in_subquery(
        Query::select()
            .column(entries::Column::TxId)
            .from(entries::Entity)
            .cond_where(cond)
            .to_owned(),
    )
}

fn entry_record(model: entries::Model) -> Result<EntryRecord, LedgerError> {
    Ok(EntryRecord {
        payee: model.payee,
        payer: model.payer,
        quant: model.quant,
        trunkward_quant: model.trunkward_quant,
        author: model.author,
        description: model.description,
        metadata: serde_json::from_value(model.metadata)?,
        is_primary: model.is_primary,
        is_additional: model.is_additional,
    })
}

fn transaction_record(model: transactions::Model, entries: Vec<EntryRecord>) -> TransactionRecord {
    TransactionRecord {
        tx_id: Some(model.id),
        uuid: model.uuid,
        version: model.version,
        workflow: model.workflow,
        state: model.state,
        scribe: model.scribe,
        written: model.written.with_timezone(&Utc),
        entries,
    }
}

/// [`LedgerStore`] over PostgreSQL.
#[derive(Debug, Clone)]
pub struct SeaLedgerStore {
    db: DatabaseConnection,
}

impl SeaLedgerStore {
    /// Creates a new ledger store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_version(
        &self,
        record: &TransactionRecord,
        mode: WriteMode,
        links: &[HashLink],
    ) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await?;

        if mode == WriteMode::ReplaceUnconfirmed {
            self.delete_stale(&txn, &record.scribe).await?;
        }
        if record.state != STATE_VALIDATED {
            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::UnconfirmedBy,
                    Expr::value(Option::<String>::None),
                )
                .filter(transactions::Column::Uuid.eq(record.uuid))
                .exec(&txn)
                .await?;
        }

        let unconfirmed_by = (mode == WriteMode::ReplaceUnconfirmed && record.state == STATE_VALIDATED)
            .then(|| record.scribe.clone());
        let version = transactions::ActiveModel {
            uuid: Set(record.uuid),
            version: Set(record.version),
            workflow: Set(record.workflow.clone()),
            state: Set(record.state.clone()),
            scribe: Set(record.scribe.clone()),
            written: Set(record.written.into()),
            unconfirmed_by: Set(unconfirmed_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut rows = Vec::with_capacity(record.entries.len());
        for (position, entry) in (0i32..).zip(&record.entries) {
            rows.push(entries::ActiveModel {
                tx_id: Set(version.id),
                position: Set(position),
                payee: Set(entry.payee.clone()),
                payer: Set(entry.payer.clone()),
                quant: Set(entry.quant),
                trunkward_quant: Set(entry.trunkward_quant),
                author: Set(entry.author.clone()),
                description: Set(entry.description.clone()),
                metadata: Set(serde_json::to_value(&entry.metadata)?),
                is_primary: Set(entry.is_primary),
                is_additional: Set(entry.is_additional),
                ..Default::default()
            });
        }
        if !rows.is_empty() {
            entries::Entity::insert_many(rows).exec(&txn).await?;
        }

        if !links.is_empty() {
            let written: DateTimeWithTimeZone = Utc::now().into();
            hash_history::Entity::insert_many(links.iter().map(|link| hash_history::ActiveModel {
                acc_id: Set(link.acc_id.clone()),
                uuid: Set(record.uuid),
                version: Set(record.version),
                hash: Set(link.hash.clone()),
                written: Set(written),
                ..Default::default()
            }))
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        debug!(uuid = %record.uuid, version = record.version, tx_id = version.id, "Stored version");
        Ok(version.id)
    }

    /// Deletes every version of the scribe's outstanding unconfirmed transaction.
    async fn delete_stale(&self, txn: &DatabaseTransaction, scribe: &str) -> Result<(), LedgerError> {
        let stale: Vec<Uuid> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Uuid)
            .filter(transactions::Column::UnconfirmedBy.eq(scribe))
            .into_tuple::<Uuid>()
            .all(txn)
            .await?;
        if !stale.is_empty() {
            transactions::Entity::delete_many()
                .filter(transactions::Column::Uuid.is_in(stale))
                .exec(txn)
                .await?;
        }
        Ok(())
    }

    /// Entries of the given versions, grouped by version id, in position order.
    async fn entries_of(
        &self,
        tx_ids: Vec<i64>,
        party: Option<&str>,
    ) -> Result<HashMap<i64, Vec<entries::Model>>, LedgerError> {
        let mut query = entries::Entity::find().filter(entries::Column::TxId.is_in(tx_ids));
        if let Some(acc) = party {
            query = query.filter(
                Condition::any()
                    .add(entries::Column::Payee.eq(acc))
                    .add(entries::Column::Payer.eq(acc)),
            );
        }
        let rows = query
            .order_by_asc(entries::Column::TxId)
            .order_by_asc(entries::Column::Position)
            .all(&self.db)
            .await?;

        let mut grouped: HashMap<i64, Vec<entries::Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.tx_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn with_entries(
        &self,
        versions: Vec<transactions::Model>,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut grouped = self
            .entries_of(versions.iter().map(|v| v.id).collect(), None)
            .await?;
        versions
            .into_iter()
            .map(|version| {
                let rows = grouped.remove(&version.id).unwrap_or_default();
                let entries = rows
                    .into_iter()
                    .map(entry_record)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(transaction_record(version, entries))
            })
            .collect()
    }

    async fn find_latest(&self, uuid: Uuid) -> Result<Option<TransactionRecord>, LedgerError> {
        let Some(version) = transactions::Entity::find()
            .filter(transactions::Column::Uuid.eq(uuid))
            .order_by_desc(transactions::Column::Version)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.with_entries(vec![version]).await?.pop())
    }

    async fn find_filtered(&self, filter: &TransactionFilter) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut query = transactions::Entity::find().filter(live());

        let visible = Condition::any().add(transactions::Column::State.ne(STATE_VALIDATED));
        query = query.filter(match filter.viewer.as_deref() {
            Some(viewer) => visible.add(transactions::Column::Scribe.eq(viewer)),
            None => visible,
        });
        if let Some(uuid) = filter.uuid {
            query = query.filter(transactions::Column::Uuid.eq(uuid));
        }
        if !filter.states.is_empty() {
            query = query.filter(transactions::Column::State.is_in(filter.states.clone()));
        }
        if !filter.types.is_empty() {
            query = query.filter(transactions::Column::Workflow.is_in(filter.types.clone()));
        }
        if let Some(after) = filter.after {
            query = query.filter(transactions::Column::Written.gte(after));
        }
        if let Some(before) = filter.before {
            query = query.filter(transactions::Column::Written.lt(before));
        }
        if let Some(payee) = filter.payee.as_deref() {
            query = query.filter(with_entry(Condition::all().add(entries::Column::Payee.eq(payee))));
        }
        if let Some(payer) = filter.payer.as_deref() {
            query = query.filter(with_entry(Condition::all().add(entries::Column::Payer.eq(payer))));
        }
        if let Some(acc) = filter.involving.as_deref() {
            query = query.filter(with_entry(
                Condition::any()
                    .add(entries::Column::Payee.eq(acc))
                    .add(entries::Column::Payer.eq(acc)),
            ));
        }
        if let Some(author) = filter.author.as_deref() {
            query = query.filter(with_entry(Condition::all().add(entries::Column::Author.eq(author))));
        }
        if let Some(text) = filter.description.as_deref() {
            query = query.filter(with_entry(
                Condition::all().add(entries::Column::Description.contains(text)),
            ));
        }

        let versions = query
            .order_by_desc(transactions::Column::Written)
            .order_by_desc(transactions::Column::Id)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.db)
            .await?;
        self.with_entries(versions).await
    }

    async fn find_account_entries(&self, acc: &str, states: &[&str]) -> Result<Vec<AccountEntry>, LedgerError> {
        let versions = transactions::Entity::find()
            .filter(live())
            .filter(transactions::Column::State.is_in(states.iter().copied()))
            .filter(with_entry(
                Condition::any()
                    .add(entries::Column::Payee.eq(acc))
                    .add(entries::Column::Payer.eq(acc)),
            ))
            .order_by_asc(transactions::Column::Written)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        let mut grouped = self
            .entries_of(versions.iter().map(|v| v.id).collect(), Some(acc))
            .await?;

        let mut found = Vec::new();
        for version in versions {
            let written = version.written.with_timezone(&Utc);
            for row in grouped.remove(&version.id).unwrap_or_default() {
                found.push(AccountEntry {
                    uuid: version.uuid,
                    state: version.state.clone(),
                    written,
                    payee: row.payee,
                    payer: row.payer,
                    quant: row.quant,
                    description: row.description,
                });
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl LedgerStore for SeaLedgerStore {
    async fn write_version(
        &self,
        record: &TransactionRecord,
        mode: WriteMode,
        links: &[HashLink],
    ) -> CcResult<i64> {
        Ok(self.insert_version(record, mode, links).await?)
    }

    async fn latest(&self, uuid: Uuid) -> CcResult<Option<TransactionRecord>> {
        Ok(self.find_latest(uuid).await?)
    }

    async fn delete_unconfirmed(&self, uuid: Uuid) -> CcResult<()> {
        transactions::Entity::delete_many()
            .filter(transactions::Column::Uuid.eq(uuid))
            .filter(transactions::Column::State.eq(STATE_VALIDATED))
            .exec(&self.db)
            .await
            .map_err(LedgerError::from)?;
        Ok(())
    }

    async fn filter(&self, filter: &TransactionFilter) -> CcResult<Vec<TransactionRecord>> {
        Ok(self.find_filtered(filter).await?)
    }

    async fn entries_for_account(&self, acc: &str, states: &[&str]) -> CcResult<Vec<AccountEntry>> {
        Ok(self.find_account_entries(acc, states).await?)
    }

    async fn last_hash(&self, acc: &str) -> CcResult<Option<String>> {
        let head = hash_history::Entity::find()
            .filter(hash_history::Column::AccId.eq(acc))
            .order_by_desc(hash_history::Column::Id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?;
        Ok(head.map(|row| row.hash))
    }
}
