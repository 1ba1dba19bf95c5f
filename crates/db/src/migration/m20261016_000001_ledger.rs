//! Ledger schema: transaction versions, their entries, and the hash chain.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS hash_history, entries, transactions CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
-- One row per stored version; only the highest version of a uuid is live
CREATE TABLE transactions (
    id BIGSERIAL PRIMARY KEY,
    uuid UUID NOT NULL,
    version INTEGER NOT NULL,
    type VARCHAR(64) NOT NULL,
    state VARCHAR(64) NOT NULL,
    scribe VARCHAR(255) NOT NULL,
    written TIMESTAMPTZ NOT NULL DEFAULT now(),
    unconfirmed_by VARCHAR(255),
    CONSTRAINT uq_transactions_version UNIQUE (uuid, version),
    -- At most one unconfirmed transaction per author
    CONSTRAINT uq_transactions_unconfirmed UNIQUE (unconfirmed_by)
);

CREATE INDEX idx_transactions_live ON transactions(uuid, version DESC);
CREATE INDEX idx_transactions_state ON transactions(state, written);

CREATE TABLE entries (
    id BIGSERIAL PRIMARY KEY,
    tx_id BIGINT NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    payee VARCHAR(255) NOT NULL,
    payer VARCHAR(255) NOT NULL,
    quant BIGINT NOT NULL,
    trunkward_quant BIGINT,
    author VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    metadata JSONB NOT NULL DEFAULT '{}',
    is_primary BOOLEAN NOT NULL DEFAULT false,
    is_additional BOOLEAN NOT NULL DEFAULT false,
    CONSTRAINT uq_entries_position UNIQUE (tx_id, position),
    CONSTRAINT chk_entries_parties CHECK (payee <> payer),
    CONSTRAINT chk_entries_quant CHECK (quant >= 0)
);

CREATE INDEX idx_entries_payee ON entries(payee);
CREATE INDEX idx_entries_payer ON entries(payer);

-- Chain heads per neighbor; the newest row is the current head
CREATE TABLE hash_history (
    id BIGSERIAL PRIMARY KEY,
    acc_id VARCHAR(255) NOT NULL,
    uuid UUID NOT NULL,
    version INTEGER NOT NULL,
    hash VARCHAR(64) NOT NULL,
    written TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_hash_history_acc ON hash_history(acc_id, id DESC);
";
