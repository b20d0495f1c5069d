use tsim_ledger::{LedgerError, Money, Qty};
use tsim_md::PriceError;
use tsim_store::StoreError;

/// Everything that can stop a trade (or a catalog/report operation).
///
/// Validation failures abort before any mutation; apply-phase failures roll
/// the whole transaction back. Either way, a failed trade leaves no trace.
#[derive(Debug)]
pub enum TradeError {
    /// The price source could not supply a quote; the trade never started.
    PriceUnavailable { symbol: String, source: PriceError },
    /// The requested size (or the quote it was priced against) cannot
    /// produce a positive share quantity.
    InvalidAmount { detail: String },
    InsufficientFunds { need: Money, have: Money },
    InsufficientShares { need: Qty, have: Qty },
    UnknownUser { username: String },
    UnknownTicker { symbol: String },
    UnknownPortfolio { portfolio: String },
    /// Any other accounting-rule rejection (overflow, bad action, ...).
    Ledger(LedgerError),
    /// Any other storage failure.
    Store(StoreError),
}

impl std::fmt::Display for TradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriceUnavailable { symbol, source } => {
                write!(f, "cannot price '{symbol}': {source}")
            }
            Self::InvalidAmount { detail } => write!(f, "invalid amount: {detail}"),
            Self::InsufficientFunds { need, have } => {
                write!(f, "insufficient funds: need ${need}, have ${have}")
            }
            Self::InsufficientShares { need, have } => {
                write!(f, "insufficient shares: need {need}, have {have}")
            }
            Self::UnknownUser { username } => write!(f, "unknown user '{username}'"),
            Self::UnknownTicker { symbol } => write!(f, "unknown ticker '{symbol}'"),
            Self::UnknownPortfolio { portfolio } => {
                write!(f, "unknown portfolio '{portfolio}'")
            }
            Self::Ledger(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TradeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PriceUnavailable { source, .. } => Some(source),
            Self::Ledger(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for TradeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownUser { username } => TradeError::UnknownUser { username },
            StoreError::UnknownTicker { symbol } => TradeError::UnknownTicker { symbol },
            StoreError::UnknownPortfolio { portfolio } => {
                TradeError::UnknownPortfolio { portfolio }
            }
            StoreError::Ledger(LedgerError::InsufficientFunds { need, have }) => {
                TradeError::InsufficientFunds { need, have }
            }
            StoreError::Ledger(LedgerError::InsufficientShares { need, have }) => {
                TradeError::InsufficientShares { need, have }
            }
            StoreError::Ledger(le) => TradeError::Ledger(le),
            other => TradeError::Store(other),
        }
    }
}
