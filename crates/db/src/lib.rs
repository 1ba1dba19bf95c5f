//! Database layer with `SeaORM` entities and the ledger repository.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - `SeaLedgerStore`, the SQL implementation of the versioned store
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::SeaLedgerStore;

use std::time::Duration;

use ccnode_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    Database::connect(options).await
}
