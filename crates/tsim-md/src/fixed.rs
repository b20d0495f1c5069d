//! In-memory price source.
//!
//! Serves fixed prices and optional canned history from a map. This is the
//! source behind deterministic tests, offline demo runs, and engine
//! scenarios where the "market" must hold still.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tsim_ledger::Money;

use crate::source::{PriceError, PricePoint, PriceSource};

/// Price source backed by a symbol -> price map.
#[derive(Debug, Default, Clone)]
pub struct FixedPriceSource {
    prices: BTreeMap<String, Money>,
    history: BTreeMap<String, Vec<PricePoint>>,
}

impl FixedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the current price for a symbol.
    pub fn with_price(mut self, symbol: impl Into<String>, price: Money) -> Self {
        self.prices.insert(symbol.into(), price);
        self
    }

    /// Attach a canned history series for a symbol. Points are kept in
    /// ascending timestamp order.
    pub fn with_history(mut self, symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.ts);
        self.history.insert(symbol.into(), points);
        self
    }

    /// Mutate a price in place, letting a scenario move the market between
    /// trades.
    pub fn set_price(&mut self, symbol: &str, price: Money) {
        self.prices.insert(symbol.to_string(), price);
    }
}

#[async_trait::async_trait]
impl PriceSource for FixedPriceSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn current_price(&self, symbol: &str) -> Result<Money, PriceError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceError::Unavailable {
                symbol: symbol.to_string(),
                reason: "no fixed price configured".to_string(),
            })
    }

    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError> {
        match self.history.get(symbol) {
            Some(points) => Ok(points.iter().copied().filter(|p| p.ts >= start).collect()),
            None => Err(PriceError::Unavailable {
                symbol: symbol.to_string(),
                reason: "no fixed history configured".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tsim_ledger::UNIT;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn serves_configured_price() {
        let src = FixedPriceSource::new().with_price("ACME", Money::new(50 * UNIT));
        assert_eq!(
            src.current_price("ACME").await.unwrap(),
            Money::new(50 * UNIT)
        );
    }

    #[tokio::test]
    async fn unknown_symbol_is_unavailable() {
        let src = FixedPriceSource::new();
        assert!(matches!(
            src.current_price("ACME").await.unwrap_err(),
            PriceError::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn history_filters_from_start_inclusive() {
        let src = FixedPriceSource::new().with_history(
            "ACME",
            vec![
                PricePoint { ts: at(100), price: Money::new(UNIT) },
                PricePoint { ts: at(200), price: Money::new(2 * UNIT) },
                PricePoint { ts: at(300), price: Money::new(3 * UNIT) },
            ],
        );

        let pts = src.history("ACME", at(200)).await.unwrap();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].ts, at(200));
    }

    #[tokio::test]
    async fn history_past_the_end_is_empty_not_an_error() {
        let src = FixedPriceSource::new().with_history(
            "ACME",
            vec![PricePoint { ts: at(100), price: Money::new(UNIT) }],
        );
        assert!(src.history("ACME", at(500)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_price_moves_the_market() {
        let mut src = FixedPriceSource::new().with_price("ACME", Money::new(50 * UNIT));
        src.set_price("ACME", Money::new(60 * UNIT));
        assert_eq!(
            src.current_price("ACME").await.unwrap(),
            Money::new(60 * UNIT)
        );
    }
}
