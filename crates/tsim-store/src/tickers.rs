//! The ticker catalog.
//!
//! Rows are seeded from the catalog file and carry a cached last-known price
//! for list displays only. Live trade and valuation paths always take
//! their price from the price source, never from this cache.

use chrono::Utc;
use tsim_ledger::Money;

use crate::error::is_unique_violation;
use crate::{Store, StoreError};

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRow {
    pub symbol: String,
    pub company_name: Option<String>,
    pub last_price: Option<Money>,
}

impl Store {
    /// Add a symbol to the catalog.
    pub async fn create_ticker(
        &self,
        symbol: &str,
        company_name: Option<&str>,
        last_price: Option<Money>,
    ) -> Result<i64, StoreError> {
        let res = sqlx::query(
            r#"
            insert into tickers (symbol, company_name, last_price_micros, updated_at)
            values (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(symbol)
        .bind(company_name)
        .bind(last_price.map(Money::raw))
        .bind(Utc::now())
        .execute(self.pool())
        .await;

        match res {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e, "tickers.symbol") => {
                Err(StoreError::DuplicateTicker {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Numeric id for a catalog symbol.
    pub async fn ticker_id(&self, symbol: &str) -> Result<i64, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("select id from tickers where symbol = ?1")
            .bind(symbol)
            .fetch_optional(self.pool())
            .await?;
        row.map(|(id,)| id)
            .ok_or_else(|| StoreError::UnknownTicker {
                symbol: symbol.to_string(),
            })
    }

    /// Whole catalog, symbol order.
    pub async fn all_tickers(&self) -> Result<Vec<TickerRow>, StoreError> {
        let rows: Vec<(String, Option<String>, Option<i64>)> = sqlx::query_as(
            "select symbol, company_name, last_price_micros from tickers order by symbol",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(symbol, company_name, price)| TickerRow {
                symbol,
                company_name,
                last_price: price.map(Money::new),
            })
            .collect())
    }

    /// Refresh the cached display price for a symbol.
    pub async fn update_ticker_price(
        &self,
        symbol: &str,
        price: Money,
    ) -> Result<(), StoreError> {
        let done = sqlx::query(
            "update tickers set last_price_micros = ?1, updated_at = ?2 where symbol = ?3",
        )
        .bind(price.raw())
        .bind(Utc::now())
        .bind(symbol)
        .execute(self.pool())
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UnknownTicker {
                symbol: symbol.to_string(),
            });
        }
        Ok(())
    }

    /// Remove a symbol from the catalog. Administrative action only; trade
    /// flow never deletes tickers.
    pub async fn delete_ticker(&self, symbol: &str) -> Result<(), StoreError> {
        let done = sqlx::query("delete from tickers where symbol = ?1")
            .bind(symbol)
            .execute(self.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UnknownTicker {
                symbol: symbol.to_string(),
            });
        }
        tracing::info!(symbol, "ticker deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsim_ledger::UNIT;

    async fn store() -> Store {
        let s = Store::in_memory().await.unwrap();
        s.migrate().await.unwrap();
        s
    }

    #[tokio::test]
    async fn create_and_list() {
        let s = store().await;
        s.create_ticker("ACME", Some("Acme Corp"), Some(Money::new(50 * UNIT)))
            .await
            .unwrap();
        s.create_ticker("ZETA", None, None).await.unwrap();

        let all = s.all_tickers().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].symbol, "ACME");
        assert_eq!(all[0].last_price, Some(Money::new(50 * UNIT)));
        assert_eq!(all[1].symbol, "ZETA");
        assert_eq!(all[1].last_price, None);
    }

    #[tokio::test]
    async fn duplicate_symbol_is_typed() {
        let s = store().await;
        s.create_ticker("ACME", None, None).await.unwrap();
        let err = s.create_ticker("ACME", None, None).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTicker { .. }));
    }

    #[tokio::test]
    async fn price_update_roundtrip() {
        let s = store().await;
        s.create_ticker("ACME", None, None).await.unwrap();
        s.update_ticker_price("ACME", Money::new(61 * UNIT))
            .await
            .unwrap();
        let all = s.all_tickers().await.unwrap();
        assert_eq!(all[0].last_price, Some(Money::new(61 * UNIT)));
    }

    #[tokio::test]
    async fn unknown_symbol_lookups_are_typed() {
        let s = store().await;
        assert!(matches!(
            s.ticker_id("NOPE").await.unwrap_err(),
            StoreError::UnknownTicker { .. }
        ));
        assert!(matches!(
            s.update_ticker_price("NOPE", Money::ZERO).await.unwrap_err(),
            StoreError::UnknownTicker { .. }
        ));
    }
}
