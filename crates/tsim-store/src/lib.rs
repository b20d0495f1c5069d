//! tsim-store
//!
//! Durable keyed storage for the simulator: users (with cash balance),
//! portfolios, the ticker catalog, aggregate positions, and the append-only
//! transaction log, all in one embedded SQLite file accessed through a
//! single [`Store`] facade.
//!
//! The facade is the explicit union of every sub-ledger operation; there is
//! no delegation layer between caller and table. Accounting rules themselves
//! (non-negative balance, proportional cost-basis reduction, no zero-qty
//! rows) live in `tsim-ledger`; this crate applies them inside write
//! transactions and persists the result.

mod auth;
mod error;
mod portfolios;
mod positions;
mod tickers;
mod transactions;
mod users;

pub use error::StoreError;
pub use tickers::TickerRow;
pub use transactions::TradeRecord;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

/// Environment variable naming the SQLite database file.
pub const ENV_DB_PATH: &str = "TSIM_DATABASE_PATH";

/// Handle to the embedded ledger database.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database file at `path`.
    ///
    /// Foreign keys are enabled on every connection so cascade deletes
    /// (user -> portfolios -> positions) are enforced by the engine.
    pub async fn open(path: &str) -> Result<Store, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Ok(Store { pool })
    }

    /// Open the database named by [`ENV_DB_PATH`].
    pub async fn open_from_env() -> Result<Store, StoreError> {
        match std::env::var(ENV_DB_PATH) {
            Ok(path) => Self::open(&path).await,
            Err(_) => Err(StoreError::Db(sqlx::Error::Configuration(
                format!("missing env var {ENV_DB_PATH}").into(),
            ))),
        }
    }

    /// In-memory database for tests and ephemeral runs.
    ///
    /// Pinned to a single pooled connection: SQLite's `:memory:` database is
    /// per-connection, so the pool must never hand out a second one.
    pub async fn in_memory() -> Result<Store, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Store { pool })
    }

    /// Run embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Connectivity + schema presence check.
    pub async fn status(&self) -> Result<StoreStatus, StoreError> {
        let (one,): (i64,) = sqlx::query_as("select 1").fetch_one(&self.pool).await?;

        let (tables,): (i64,) = sqlx::query_as(
            r#"
            select count(*)
            from sqlite_master
            where type = 'table'
              and name in ('users', 'portfolios', 'tickers', 'positions', 'transactions')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStatus {
            ok: one == 1,
            has_schema: tables == 5,
        })
    }

    /// Begin a write transaction. The trade engine wraps each trade's three
    /// sub-mutations in exactly one of these.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// The underlying pool, for read paths that do not need a transaction.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub ok: bool,
    pub has_schema: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_in_memory_store_has_no_schema_until_migrated() {
        let store = Store::in_memory().await.unwrap();
        let st = store.status().await.unwrap();
        assert!(st.ok);
        assert!(!st.has_schema);

        store.migrate().await.unwrap();
        let st = store.status().await.unwrap();
        assert!(st.has_schema);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
        assert!(store.status().await.unwrap().has_schema);
    }
}
