//! Portfolio report assembly.
//!
//! Pulls every holding, quotes each symbol exactly once, and derives the
//! display figures through `tsim_ledger::valuation`. Read-only: nothing
//! here writes to the store or back to the price cache.

use tsim_ledger::valuation::{
    cost_basis_allocation, portfolio_totals, value_position, AllocationSlice, PortfolioTotals,
    ALLOCATION_KEEP,
};
use tsim_ledger::{Holding, Money, Qty};
use tsim_md::PriceSource;
use tsim_store::Store;

use crate::error::TradeError;

/// One valued position line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionReportRow {
    pub symbol: String,
    pub qty: Qty,
    pub average_price: Money,
    pub cost_basis: Money,
    pub current_price: Money,
    pub current_value: Money,
    pub profit_loss: Money,
}

/// The whole portfolio view: lines, totals, and the top-5-plus-Other
/// cost-basis allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioReport {
    pub rows: Vec<PositionReportRow>,
    pub totals: PortfolioTotals,
    pub allocation: Vec<AllocationSlice>,
}

/// Assemble the report for one portfolio.
pub async fn portfolio_report(
    store: &Store,
    prices: &dyn PriceSource,
    portfolio_id: i64,
) -> Result<PortfolioReport, TradeError> {
    let positions = store.all_positions(portfolio_id).await?;

    let mut rows = Vec::with_capacity(positions.len());
    let mut valued: Vec<(Holding, Money)> = Vec::with_capacity(positions.len());
    let mut alloc_inputs: Vec<(String, Money)> = Vec::with_capacity(positions.len());

    for (symbol, holding) in positions {
        let price = prices
            .current_price(&symbol)
            .await
            .map_err(|source| TradeError::PriceUnavailable {
                symbol: symbol.clone(),
                source,
            })?;

        let value = value_position(&holding, price);
        rows.push(PositionReportRow {
            symbol: symbol.clone(),
            qty: holding.qty(),
            average_price: value.average_price,
            cost_basis: holding.cost_basis(),
            current_price: price,
            current_value: value.current_value,
            profit_loss: value.profit_loss,
        });
        alloc_inputs.push((symbol, holding.cost_basis()));
        valued.push((holding, price));
    }

    Ok(PortfolioReport {
        totals: portfolio_totals(&valued),
        allocation: cost_basis_allocation(&alloc_inputs, ALLOCATION_KEEP),
        rows,
    })
}
