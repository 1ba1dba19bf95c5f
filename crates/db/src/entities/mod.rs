//! `SeaORM` entities for the ledger tables.

pub mod entries;
pub mod hash_history;
pub mod transactions;
