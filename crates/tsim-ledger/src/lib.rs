//! tsim-ledger
//!
//! The deterministic accounting core of the trading simulator:
//! - Fixed-point money and share-quantity types (no floats in the ledger)
//! - Cash-balance rules (deposit / withdraw, non-negative invariant)
//! - Aggregate holding lifecycle (open, increase, proportional reduce, close)
//! - Valuation and portfolio aggregates from a holding snapshot + live price
//! - Pure deterministic logic (no IO, no time, no storage wiring)

mod error;
mod holding;
mod money;
mod types;

pub mod cash;
pub mod valuation;

pub use error::LedgerError;
pub use holding::Holding;
pub use money::{Money, Qty, UNIT};
pub use types::TradeAction;
pub use valuation::{
    cost_basis_allocation, portfolio_totals, value_position, AllocationSlice, PortfolioTotals,
    PositionValue, ALLOCATION_KEEP,
};
