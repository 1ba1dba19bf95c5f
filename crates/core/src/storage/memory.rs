//! In-memory ledger store, for tests and single-process development nodes.

use async_trait::async_trait;
use ccnode_shared::{CcError, CcResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountEntry, HashLink, LedgerStore, TransactionFilter, TransactionRecord, WriteMode, matches,
};
use crate::workflow::STATE_VALIDATED;

#[derive(Debug)]
struct Row {
    record: TransactionRecord,
    unconfirmed_by: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    rows: Vec<Row>,
    hashes: Vec<(String, String)>,
    next_id: i64,
}

impl State {
    fn latest_index(&self, uuid: Uuid) -> Option<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.record.uuid == uuid)
            .max_by_key(|(_, row)| row.record.version)
            .map(|(i, _)| i)
    }

    fn live(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, row)| self.latest_index(row.record.uuid) == Some(*i))
            .map(|(_, row)| &row.record)
    }
}

/// A [`LedgerStore`] behind a lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn write_version(
        &self,
        record: &TransactionRecord,
        mode: WriteMode,
        links: &[HashLink],
    ) -> CcResult<i64> {
        let mut state = self.state.write().await;

        if state
            .rows
            .iter()
            .any(|row| row.record.uuid == record.uuid && row.record.version == record.version)
        {
            return Err(CcError::Database(format!(
                "version {} of {} already exists",
                record.version, record.uuid
            )));
        }

        let unconfirmed_by = match mode {
            WriteMode::ReplaceUnconfirmed => {
                let stale: Vec<Uuid> = state
                    .rows
                    .iter()
                    .filter(|row| row.unconfirmed_by.as_deref() == Some(record.scribe.as_str()))
                    .map(|row| row.record.uuid)
                    .collect();
                state.rows.retain(|row| !stale.contains(&row.record.uuid));
                Some(record.scribe.clone())
            }
            WriteMode::Append => None,
        };
        if record.state != STATE_VALIDATED {
            for row in state.rows.iter_mut().filter(|r| r.record.uuid == record.uuid) {
                row.unconfirmed_by = None;
            }
        }

        state.next_id += 1;
        let tx_id = state.next_id;
        let mut stored = record.clone();
        stored.tx_id = Some(tx_id);
        state.rows.push(Row {
            record: stored,
            unconfirmed_by,
        });
        state
            .hashes
            .extend(links.iter().map(|l| (l.acc_id.clone(), l.hash.clone())));
        Ok(tx_id)
    }

    async fn latest(&self, uuid: Uuid) -> CcResult<Option<TransactionRecord>> {
        let state = self.state.read().await;
        Ok(state
            .latest_index(uuid)
            .map(|i| state.rows[i].record.clone()))
    }

    async fn delete_unconfirmed(&self, uuid: Uuid) -> CcResult<()> {
        let mut state = self.state.write().await;
        state.rows.retain(|row| row.record.uuid != uuid);
        Ok(())
    }

    async fn filter(&self, filter: &TransactionFilter) -> CcResult<Vec<TransactionRecord>> {
        let state = self.state.read().await;
        let mut found: Vec<TransactionRecord> = state
            .live()
            .filter(|record| matches(filter, record))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.written.cmp(&a.written).then(b.tx_id.cmp(&a.tx_id)));

        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = filter
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }

    async fn entries_for_account(&self, acc: &str, states: &[&str]) -> CcResult<Vec<AccountEntry>> {
        let state = self.state.read().await;
        let mut live: Vec<&TransactionRecord> = state
            .live()
            .filter(|record| states.contains(&record.state.as_str()))
            .collect();
        live.sort_by_key(|record| (record.written, record.tx_id));

        Ok(live
            .into_iter()
            .flat_map(|record| {
                record
                    .entries
                    .iter()
                    .filter(move |e| e.payee == acc || e.payer == acc)
                    .map(move |e| AccountEntry {
                        uuid: record.uuid,
                        state: record.state.clone(),
                        written: record.written,
                        payee: e.payee.clone(),
                        payer: e.payer.clone(),
                        quant: e.quant,
                        description: e.description.clone(),
                    })
            })
            .collect())
    }

    async fn last_hash(&self, acc: &str) -> CcResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .hashes
            .iter()
            .rev()
            .find(|(a, _)| a == acc)
            .map(|(_, hash)| hash.clone()))
    }
}
