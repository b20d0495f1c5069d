//! Catalog seeding and price refresh.
//!
//! Both flows degrade per symbol: a quote failure logs a warning and moves
//! on, so one dead symbol never blocks the rest of the catalog. Storage
//! failures other than "already seeded" are real errors and stop the run.

use tsim_md::{CatalogEntry, PriceSource};
use tsim_store::{Store, StoreError};

use crate::error::TradeError;

/// Counts from a seed or refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogOutcome {
    pub updated: usize,
    pub skipped: usize,
}

/// Insert catalog entries as ticker rows, quoting an initial price for
/// each. `limit` bounds how many entries are attempted (seeding a full
/// exchange listing is slow; a bounded seed is the normal dev flow).
pub async fn seed_catalog(
    store: &Store,
    prices: &dyn PriceSource,
    entries: &[CatalogEntry],
    limit: Option<usize>,
) -> Result<CatalogOutcome, TradeError> {
    let take = limit.unwrap_or(entries.len());
    let mut outcome = CatalogOutcome::default();

    for entry in entries.iter().take(take) {
        let price = match prices.current_price(&entry.symbol).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(symbol = %entry.symbol, error = %e, "seed quote failed, skipping symbol");
                outcome.skipped += 1;
                continue;
            }
        };

        match store
            .create_ticker(&entry.symbol, Some(&entry.name), Some(price))
            .await
        {
            Ok(_) => outcome.updated += 1,
            Err(StoreError::DuplicateTicker { .. }) => {
                // already seeded on a previous run
                outcome.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        seeded = outcome.updated,
        skipped = outcome.skipped,
        "catalog seed finished"
    );
    Ok(outcome)
}

/// Re-quote every catalog symbol and refresh its cached display price.
pub async fn refresh_prices(
    store: &Store,
    prices: &dyn PriceSource,
) -> Result<CatalogOutcome, TradeError> {
    let mut outcome = CatalogOutcome::default();

    for row in store.all_tickers().await? {
        match prices.current_price(&row.symbol).await {
            Ok(price) => {
                store.update_ticker_price(&row.symbol, price).await?;
                outcome.updated += 1;
            }
            Err(e) => {
                tracing::warn!(symbol = %row.symbol, error = %e, "refresh quote failed, keeping stale price");
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}
