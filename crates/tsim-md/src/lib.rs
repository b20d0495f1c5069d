//! tsim-md
//!
//! The market-data boundary of the simulator. This crate owns the price
//! source abstraction and its concrete implementations; it does **not**
//! touch the ledger database: callers quote a price and hand it to the
//! trade engine or valuation explicitly.
//!
//! Prices cross this boundary as decimal strings and are normalised
//! deterministically into fixed-point [`tsim_ledger::Money`]; no
//! floating-point rounding is introduced at the edge.

pub mod catalog;
mod fixed;
mod http;
mod source;

pub use catalog::{load_catalog, parse_catalog, CatalogEntry};
pub use fixed::FixedPriceSource;
pub use http::HttpPriceSource;
pub use source::{PriceError, PricePoint, PriceSource};
