//! Price source contract.
//!
//! This module defines only the trait, the point type, and the error type.
//! No concrete transport, no catalog logic, and no caching belong here: a
//! quote is taken once per operation and passed along explicitly.

use chrono::{DateTime, Utc};
use tsim_ledger::Money;

/// One historical observation: timestamp and closing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    pub ts: DateTime<Utc>,
    pub price: Money,
}

/// Errors a [`PriceSource`] implementation may return.
///
/// Whatever the internal cause, the user-visible meaning is the same: no
/// usable price, and the operation that needed one aborts before mutating
/// anything.
#[derive(Debug)]
pub enum PriceError {
    /// The source has no price for this symbol.
    Unavailable { symbol: String, reason: String },
    /// Network or transport failure.
    Transport(String),
    /// A response payload could not be decoded.
    Decode(String),
    /// A required configuration value is missing or invalid.
    Config(String),
}

impl std::fmt::Display for PriceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceError::Unavailable { symbol, reason } => {
                write!(f, "price unavailable for '{symbol}': {reason}")
            }
            PriceError::Transport(msg) => write!(f, "transport error: {msg}"),
            PriceError::Decode(msg) => write!(f, "decode error: {msg}"),
            PriceError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for PriceError {}

/// Upstream price provider contract.
///
/// Object-safe so callers can hold a `Box<dyn PriceSource>` without knowing
/// the concrete type, and `Send + Sync` so it crosses async task
/// boundaries.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"http"`).
    fn name(&self) -> &'static str;

    /// The current price for one symbol. A trade quotes this exactly once
    /// and reuses the value for every sub-step.
    async fn current_price(&self, symbol: &str) -> Result<Money, PriceError>;

    /// Historical close series from `start` (inclusive) to now, ascending
    /// by timestamp. A start past the last available observation yields an
    /// empty series, not an error.
    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_names_symbol_and_reason() {
        let err = PriceError::Unavailable {
            symbol: "ACME".to_string(),
            reason: "not in universe".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "price unavailable for 'ACME': not in universe"
        );
    }

    #[test]
    fn transport_display() {
        let err = PriceError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
