//! Aggregate position rows, one per (portfolio, ticker).
//!
//! The lifecycle math lives in `tsim_ledger::Holding`; this module reads the
//! row, applies the transition, and persists the successor state. A full
//! close deletes the row: absence and a fully-closed position are the same
//! persisted state, so reads return `Option<Holding>` rather than a
//! zero-valued stand-in.
//!
//! Mutations are transaction-scoped (`_tx`) only: they exist to be composed
//! into a trade's single atomic write, and the serialized write transaction
//! is what protects the read-modify-write from lost updates.

use sqlx::SqliteConnection;
use tsim_ledger::{Holding, Money, Qty};

use crate::{Store, StoreError};

impl Store {
    /// The holding for one ticker, or `None` when no shares are held.
    pub async fn position(
        &self,
        portfolio_id: i64,
        symbol: &str,
    ) -> Result<Option<Holding>, StoreError> {
        let mut conn = self.pool().acquire().await?;
        Self::position_in(&mut conn, portfolio_id, symbol).await
    }

    /// Transaction-scoped variant of [`Store::position`].
    pub async fn position_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        portfolio_id: i64,
        symbol: &str,
    ) -> Result<Option<Holding>, StoreError> {
        Self::position_in(&mut **tx, portfolio_id, symbol).await
    }

    /// Every holding in the portfolio as `(symbol, holding)`, symbol order.
    pub async fn all_positions(
        &self,
        portfolio_id: i64,
    ) -> Result<Vec<(String, Holding)>, StoreError> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            select t.symbol, p.qty_micros, p.cost_basis_micros
            from positions p
            join tickers t on p.ticker_id = t.id
            where p.portfolio_id = ?1
            order by t.symbol
            "#,
        )
        .bind(portfolio_id)
        .fetch_all(self.pool())
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (symbol, qty, cost) in rows {
            let holding = Holding::from_stored(Qty::new(qty), Money::new(cost))?;
            out.push((symbol, holding));
        }
        Ok(out)
    }

    /// Accumulate a purchase into the (portfolio, ticker) row, creating it
    /// on first buy.
    pub async fn open_or_increase_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        portfolio_id: i64,
        ticker_id: i64,
        qty_delta: Qty,
        cost_delta: Money,
    ) -> Result<Holding, StoreError> {
        let existing = Self::position_by_id_in(&mut **tx, portfolio_id, ticker_id).await?;
        let next = match existing {
            Some(h) => h.increased(qty_delta, cost_delta)?,
            None => Holding::opened(qty_delta, cost_delta)?,
        };

        sqlx::query(
            r#"
            insert into positions (portfolio_id, ticker_id, qty_micros, cost_basis_micros)
            values (?1, ?2, ?3, ?4)
            on conflict (portfolio_id, ticker_id) do update
            set qty_micros = excluded.qty_micros,
                cost_basis_micros = excluded.cost_basis_micros
            "#,
        )
        .bind(portfolio_id)
        .bind(ticker_id)
        .bind(next.qty().raw())
        .bind(next.cost_basis().raw())
        .execute(&mut **tx)
        .await?;

        Ok(next)
    }

    /// Reduce the (portfolio, ticker) row by a sale, deleting it on full
    /// close. Returns the surviving holding, or `None` when closed.
    pub async fn decrease_or_close_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        portfolio_id: i64,
        ticker_id: i64,
        qty_delta: Qty,
    ) -> Result<Option<Holding>, StoreError> {
        let existing = Self::position_by_id_in(&mut **tx, portfolio_id, ticker_id).await?;
        let held = match existing {
            Some(h) => h,
            // No row at all: nothing held, the reduction cannot be covered.
            None => {
                return Err(StoreError::Ledger(
                    tsim_ledger::LedgerError::InsufficientShares {
                        need: qty_delta,
                        have: Qty::ZERO,
                    },
                ))
            }
        };

        match held.reduced(qty_delta)? {
            Some(rest) => {
                sqlx::query(
                    r#"
                    update positions set qty_micros = ?1, cost_basis_micros = ?2
                    where portfolio_id = ?3 and ticker_id = ?4
                    "#,
                )
                .bind(rest.qty().raw())
                .bind(rest.cost_basis().raw())
                .bind(portfolio_id)
                .bind(ticker_id)
                .execute(&mut **tx)
                .await?;
                Ok(Some(rest))
            }
            None => {
                sqlx::query(
                    "delete from positions where portfolio_id = ?1 and ticker_id = ?2",
                )
                .bind(portfolio_id)
                .bind(ticker_id)
                .execute(&mut **tx)
                .await?;
                Ok(None)
            }
        }
    }

    async fn position_in(
        conn: &mut SqliteConnection,
        portfolio_id: i64,
        symbol: &str,
    ) -> Result<Option<Holding>, StoreError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            select p.qty_micros, p.cost_basis_micros
            from positions p
            join tickers t on p.ticker_id = t.id
            where p.portfolio_id = ?1 and t.symbol = ?2
            "#,
        )
        .bind(portfolio_id)
        .bind(symbol)
        .fetch_optional(conn)
        .await?;

        match row {
            Some((qty, cost)) => Ok(Some(Holding::from_stored(Qty::new(qty), Money::new(cost))?)),
            None => Ok(None),
        }
    }

    async fn position_by_id_in(
        conn: &mut SqliteConnection,
        portfolio_id: i64,
        ticker_id: i64,
    ) -> Result<Option<Holding>, StoreError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            select qty_micros, cost_basis_micros
            from positions
            where portfolio_id = ?1 and ticker_id = ?2
            "#,
        )
        .bind(portfolio_id)
        .bind(ticker_id)
        .fetch_optional(conn)
        .await?;

        match row {
            Some((qty, cost)) => Ok(Some(Holding::from_stored(Qty::new(qty), Money::new(cost))?)),
            None => Ok(None),
        }
    }
}
