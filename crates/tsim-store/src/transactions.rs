//! The append-only trade log.
//!
//! Every buy and sell appends exactly one immutable row with a
//! store-assigned UTC timestamp. Nothing in the trade flow updates or
//! removes rows; [`Store::delete_trade`] exists solely for explicit audit
//! corrections outside normal operation.

use chrono::{DateTime, Utc};
use tsim_ledger::{Money, Qty, TradeAction};

use crate::{Store, StoreError};

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub id: i64,
    pub portfolio_id: i64,
    pub ticker_symbol: String,
    pub action: TradeAction,
    pub qty: Qty,
    pub price: Money,
    pub executed_at: DateTime<Utc>,
}

impl Store {
    /// Append one trade to the log. Timestamp is assigned here, not by the
    /// caller.
    pub async fn record_trade_tx(
        tx: &mut sqlx::Transaction<'static, sqlx::Sqlite>,
        portfolio_id: i64,
        ticker_symbol: &str,
        action: TradeAction,
        qty: Qty,
        price: Money,
    ) -> Result<i64, StoreError> {
        let done = sqlx::query(
            r#"
            insert into transactions (portfolio_id, ticker_symbol, action, qty_micros, price_micros, executed_at)
            values (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(portfolio_id)
        .bind(ticker_symbol)
        .bind(action.as_str())
        .bind(qty.raw())
        .bind(price.raw())
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(done.last_insert_rowid())
    }

    /// Entries for a portfolio in storage (chronological) order, optionally
    /// filtered to `start <= executed_at <= end`, inclusive on both bounds.
    pub async fn trades(
        &self,
        portfolio_id: i64,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<TradeRecord>, StoreError> {
        let rows: Vec<(i64, i64, String, String, i64, i64, DateTime<Utc>)> = match range {
            Some((start, end)) => {
                sqlx::query_as(
                    r#"
                    select id, portfolio_id, ticker_symbol, action, qty_micros, price_micros, executed_at
                    from transactions
                    where portfolio_id = ?1 and executed_at >= ?2 and executed_at <= ?3
                    order by id
                    "#,
                )
                .bind(portfolio_id)
                .bind(start)
                .bind(end)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    select id, portfolio_id, ticker_symbol, action, qty_micros, price_micros, executed_at
                    from transactions
                    where portfolio_id = ?1
                    order by id
                    "#,
                )
                .bind(portfolio_id)
                .fetch_all(self.pool())
                .await?
            }
        };

        let mut out = Vec::with_capacity(rows.len());
        for (id, portfolio_id, ticker_symbol, action, qty, price, executed_at) in rows {
            out.push(TradeRecord {
                id,
                portfolio_id,
                ticker_symbol,
                action: TradeAction::parse(&action)?,
                qty: Qty::new(qty),
                price: Money::new(price),
                executed_at,
            });
        }
        Ok(out)
    }

    /// Audit correction: remove one entry by id. Never called from trade
    /// flow.
    pub async fn delete_trade(&self, trade_id: i64) -> Result<(), StoreError> {
        sqlx::query("delete from transactions where id = ?1")
            .bind(trade_id)
            .execute(self.pool())
            .await?;
        tracing::warn!(trade_id, "trade log entry removed by audit correction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsim_ledger::UNIT;

    const M: i64 = UNIT;

    async fn fixture() -> (Store, i64) {
        let store = Store::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        let uid = store.create_user("alice", "pw", None).await.unwrap();
        let pid = store.create_portfolio(uid, "main").await.unwrap();
        (store, pid)
    }

    async fn record(store: &Store, pid: i64, action: TradeAction, qty: i64, price: i64) -> i64 {
        let mut tx = store.begin().await.unwrap();
        let id = Store::record_trade_tx(
            &mut tx,
            pid,
            "ACME",
            action,
            Qty::new(qty * M),
            Money::new(price * M),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn entries_come_back_in_append_order() {
        let (store, pid) = fixture().await;
        record(&store, pid, TradeAction::Buy, 10, 50).await;
        record(&store, pid, TradeAction::Sell, 4, 60).await;

        let all = store.trades(pid, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action, TradeAction::Buy);
        assert_eq!(all[0].qty, Qty::new(10 * M));
        assert_eq!(all[0].price, Money::new(50 * M));
        assert_eq!(all[1].action, TradeAction::Sell);
        assert!(all[0].executed_at <= all[1].executed_at);
    }

    #[tokio::test]
    async fn date_range_is_inclusive_on_both_bounds() {
        let (store, pid) = fixture().await;
        record(&store, pid, TradeAction::Buy, 1, 10).await;
        let all = store.trades(pid, None).await.unwrap();
        let ts = all[0].executed_at;

        // the exact timestamp is inside a [ts, ts] range
        let hit = store.trades(pid, Some((ts, ts))).await.unwrap();
        assert_eq!(hit.len(), 1);

        // a range ending just before it is empty
        let miss = store
            .trades(pid, Some((ts - chrono::Duration::days(1), ts - chrono::Duration::seconds(1))))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn audit_correction_removes_one_entry() {
        let (store, pid) = fixture().await;
        let id = record(&store, pid, TradeAction::Buy, 1, 10).await;
        record(&store, pid, TradeAction::Sell, 1, 12).await;

        store.delete_trade(id).await.unwrap();
        let all = store.trades(pid, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].action, TradeAction::Sell);
    }
}
