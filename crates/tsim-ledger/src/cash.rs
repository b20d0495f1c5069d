//! Cash-balance rules.
//!
//! Pure arithmetic over a balance snapshot. The store applies these inside
//! its write transaction so no persistence path can bypass the
//! non-negative-balance invariant. On error the input balance is returned
//! untouched by construction; these functions never mutate anything.

use crate::error::LedgerError;
use crate::money::Money;

/// Credit `amount` to `balance`.
///
/// # Errors
/// `InvalidAmount` unless `amount > 0`; `Overflow` if the new balance leaves
/// the representable range.
pub fn deposit(balance: Money, amount: Money) -> Result<Money, LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount(format!(
            "deposit must be > 0, got ${amount}"
        )));
    }
    balance.checked_add(amount).ok_or(LedgerError::Overflow)
}

/// Debit `amount` from `balance`. No partial withdrawal: either the full
/// amount is covered or the balance is left as it was.
///
/// # Errors
/// `InvalidAmount` unless `amount > 0`; `InsufficientFunds` when
/// `amount > balance`.
pub fn withdraw(balance: Money, amount: Money) -> Result<Money, LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount(format!(
            "withdrawal must be > 0, got ${amount}"
        )));
    }
    if amount > balance {
        return Err(LedgerError::InsufficientFunds {
            need: amount,
            have: balance,
        });
    }
    // amount <= balance and both are non-negative, so this cannot underflow
    Ok(balance.checked_sub(amount).unwrap_or(Money::ZERO))
}
