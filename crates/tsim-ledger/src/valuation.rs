//! Valuation: pure functions over holding snapshots and live prices.
//!
//! Nothing here mutates or performs IO; callers fetch one price per symbol
//! and pass it in. Aggregation saturates rather than aborting: a report is a
//! display artifact, not a ledger mutation.

use crate::holding::Holding;
use crate::money::Money;

/// How many individual slices a cost-basis allocation keeps before the
/// remainder collapses into a single `Other` bucket.
pub const ALLOCATION_KEEP: usize = 5;

/// Derived display figures for a single holding at a given live price.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PositionValue {
    /// `cost_basis / qty`.
    pub average_price: Money,
    /// `qty * price`.
    pub current_value: Money,
    /// `current_value - cost_basis`.
    pub profit_loss: Money,
}

/// Value one holding at `price`.
pub fn value_position(holding: &Holding, price: Money) -> PositionValue {
    let current_value = price.mul_qty_saturating(holding.qty());
    PositionValue {
        average_price: holding.average_price(),
        current_value,
        profit_loss: current_value.saturating_sub(holding.cost_basis()),
    }
}

/// Portfolio-level aggregates over all holdings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PortfolioTotals {
    pub total_cost_basis: Money,
    pub total_value: Money,
    pub total_profit_loss: Money,
}

/// Sum cost basis and current value over `(holding, live price)` pairs.
pub fn portfolio_totals(entries: &[(Holding, Money)]) -> PortfolioTotals {
    let mut cost = Money::ZERO;
    let mut value = Money::ZERO;
    for (holding, price) in entries {
        cost = cost.saturating_add(holding.cost_basis());
        value = value.saturating_add(price.mul_qty_saturating(holding.qty()));
    }
    PortfolioTotals {
        total_cost_basis: cost,
        total_value: value,
        total_profit_loss: value.saturating_sub(cost),
    }
}

/// One slice of the cost-basis allocation: a ticker symbol, or the
/// aggregate `Other` bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationSlice {
    pub label: String,
    pub cost_basis: Money,
}

/// Reduce `(symbol, cost_basis)` entries to at most `keep` individual slices
/// plus one `Other` slice summing the remainder.
///
/// Ordering is deterministic: slices are sorted by cost basis descending,
/// ties broken by the caller-supplied order (stable sort). With `keep` or
/// fewer entries there is no `Other` slice.
pub fn cost_basis_allocation(entries: &[(String, Money)], keep: usize) -> Vec<AllocationSlice> {
    let mut sorted: Vec<&(String, Money)> = entries.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut slices: Vec<AllocationSlice> = sorted
        .iter()
        .take(keep)
        .map(|(label, cost)| AllocationSlice {
            label: label.clone(),
            cost_basis: *cost,
        })
        .collect();

    if sorted.len() > keep {
        let mut rest = Money::ZERO;
        for (_, cost) in sorted.iter().skip(keep) {
            rest = rest.saturating_add(*cost);
        }
        slices.push(AllocationSlice {
            label: "Other".to_string(),
            cost_basis: rest,
        });
    }

    slices
}
