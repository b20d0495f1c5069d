use crate::money::{Money, Qty};

/// All rule violations the accounting core can surface.
///
/// Every variant carries enough detail to explain the cause to a user; the
/// ledger is never mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount failed to parse, or is not strictly positive.
    InvalidAmount { detail: String },
    /// A debit would take the balance below zero.
    InsufficientFunds { need: Money, have: Money },
    /// A reduction asks for more shares than are held.
    InsufficientShares { need: Qty, have: Qty },
    /// Quantity must be strictly positive.
    NonPositiveQty { qty: Qty },
    /// Cost must be strictly positive.
    NonPositiveCost { cost: Money },
    /// Trade action was neither `buy` nor `sell`.
    InvalidAction { action: String },
    /// Fixed-point arithmetic left the representable range.
    Overflow,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount { detail } => write!(f, "invalid amount: {detail}"),
            Self::InsufficientFunds { need, have } => {
                write!(f, "insufficient funds: need ${need}, have ${have}")
            }
            Self::InsufficientShares { need, have } => {
                write!(f, "insufficient shares: need {need}, have {have}")
            }
            Self::NonPositiveQty { qty } => {
                write!(f, "quantity must be > 0, got {qty}")
            }
            Self::NonPositiveCost { cost } => {
                write!(f, "cost must be > 0, got ${cost}")
            }
            Self::InvalidAction { action } => {
                write!(f, "invalid trade action '{action}' (expected buy or sell)")
            }
            Self::Overflow => write!(f, "amount out of representable range"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl LedgerError {
    pub(crate) fn invalid_amount(detail: impl Into<String>) -> Self {
        Self::InvalidAmount {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::UNIT;

    #[test]
    fn insufficient_funds_names_both_figures() {
        let err = LedgerError::InsufficientFunds {
            need: Money::new(500 * UNIT),
            have: Money::new(100 * UNIT),
        };
        assert_eq!(err.to_string(), "insufficient funds: need $500.00, have $100.00");
    }

    #[test]
    fn insufficient_shares_names_both_figures() {
        let err = LedgerError::InsufficientShares {
            need: Qty::new(10 * UNIT),
            have: Qty::new(4 * UNIT),
        };
        assert_eq!(err.to_string(), "insufficient shares: need 10, have 4");
    }

    #[test]
    fn invalid_action_names_input() {
        let err = LedgerError::InvalidAction {
            action: "hold".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid trade action 'hold' (expected buy or sell)"
        );
    }
}
