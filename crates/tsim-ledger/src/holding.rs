//! Aggregate holding lifecycle.
//!
//! One [`Holding`] is the whole position in one ticker within one portfolio:
//! total shares held plus the total dollars paid to acquire them
//! (average-cost method: there is deliberately no per-lot tracking, and a
//! partial sale reduces the cost basis proportionally).
//!
//! A holding with zero quantity does not exist: closing a position yields
//! `None`, and the store deletes the row rather than keeping a zero row.
//! `qty > 0` therefore holds for every live `Holding` by construction, which
//! is what makes [`Holding::average_price`] total.

use crate::error::LedgerError;
use crate::money::{mul_div_round, Money, Qty, UNIT};

/// The aggregate position in one ticker: shares held and total acquisition
/// cost. Immutable; lifecycle methods return the successor state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Holding {
    qty: Qty,
    cost_basis: Money,
}

impl Holding {
    /// Open a fresh holding.
    ///
    /// # Errors
    /// `NonPositiveQty` / `NonPositiveCost` when either figure is not
    /// strictly positive.
    pub fn opened(qty: Qty, cost_basis: Money) -> Result<Self, LedgerError> {
        if !qty.is_positive() {
            return Err(LedgerError::NonPositiveQty { qty });
        }
        if !cost_basis.is_positive() {
            return Err(LedgerError::NonPositiveCost { cost: cost_basis });
        }
        Ok(Holding { qty, cost_basis })
    }

    /// Used by the store to rehydrate a persisted row. The row constraints
    /// mirror [`Holding::opened`]; out-of-range stored values are a data
    /// defect and surface as the same typed errors.
    pub fn from_stored(qty: Qty, cost_basis: Money) -> Result<Self, LedgerError> {
        Self::opened(qty, cost_basis)
    }

    /// Shares held. Strictly positive.
    #[inline]
    pub fn qty(&self) -> Qty {
        self.qty
    }

    /// Total dollars paid for the currently-held shares.
    #[inline]
    pub fn cost_basis(&self) -> Money {
        self.cost_basis
    }

    /// Accumulate a purchase: both figures grow together (weighted-average
    /// accumulation, no lots).
    ///
    /// # Errors
    /// `NonPositiveQty` / `NonPositiveCost` for invalid deltas, `Overflow`
    /// if either total leaves the representable range. The holding is not
    /// changed on error.
    pub fn increased(&self, qty_delta: Qty, cost_delta: Money) -> Result<Self, LedgerError> {
        if !qty_delta.is_positive() {
            return Err(LedgerError::NonPositiveQty { qty: qty_delta });
        }
        if !cost_delta.is_positive() {
            return Err(LedgerError::NonPositiveCost { cost: cost_delta });
        }
        let qty = self.qty.checked_add(qty_delta).ok_or(LedgerError::Overflow)?;
        let cost_basis = self
            .cost_basis
            .checked_add(cost_delta)
            .ok_or(LedgerError::Overflow)?;
        Ok(Holding { qty, cost_basis })
    }

    /// Reduce the holding by a sale of `qty_delta` shares.
    ///
    /// The cost basis shrinks proportionally: selling `d` of `q` shares
    /// removes `cost * d / q` (rounded to the nearest micro-dollar). Selling
    /// everything returns `Ok(None)`: the position ceases to exist rather
    /// than persisting at zero, and the cost basis goes to exactly zero
    /// without touching the division.
    ///
    /// # Errors
    /// `NonPositiveQty` for an invalid delta; `InsufficientShares` when
    /// `qty_delta` exceeds the held quantity.
    pub fn reduced(&self, qty_delta: Qty) -> Result<Option<Self>, LedgerError> {
        if !qty_delta.is_positive() {
            return Err(LedgerError::NonPositiveQty { qty: qty_delta });
        }
        if qty_delta > self.qty {
            return Err(LedgerError::InsufficientShares {
                need: qty_delta,
                have: self.qty,
            });
        }
        if qty_delta == self.qty {
            return Ok(None);
        }

        let removed = mul_div_round(self.cost_basis.raw(), qty_delta.raw(), self.qty.raw())
            .ok_or(LedgerError::Overflow)?;
        let qty = self
            .qty
            .checked_sub(qty_delta)
            .ok_or(LedgerError::Overflow)?;
        let cost_basis = self
            .cost_basis
            .checked_sub(Money::new(removed))
            .ok_or(LedgerError::Overflow)?;
        Ok(Some(Holding { qty, cost_basis }))
    }

    /// Average acquisition price per share: `cost_basis / qty`. Total,
    /// because `qty > 0` always holds for a live holding.
    pub fn average_price(&self) -> Money {
        // qty > 0 by construction; rounding to the nearest micro-dollar
        Money::new(
            mul_div_round(self.cost_basis.raw(), UNIT, self.qty.raw()).unwrap_or(i64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: i64 = UNIT;

    fn holding(qty: i64, cost: i64) -> Holding {
        Holding::opened(Qty::new(qty * M), Money::new(cost * M)).unwrap()
    }

    #[test]
    fn opened_rejects_zero_qty() {
        let err = Holding::opened(Qty::ZERO, Money::new(M)).unwrap_err();
        assert_eq!(err, LedgerError::NonPositiveQty { qty: Qty::ZERO });
    }

    #[test]
    fn opened_rejects_zero_cost() {
        let err = Holding::opened(Qty::new(M), Money::ZERO).unwrap_err();
        assert_eq!(err, LedgerError::NonPositiveCost { cost: Money::ZERO });
    }

    #[test]
    fn increase_accumulates_both_figures() {
        let h = holding(10, 500)
            .increased(Qty::new(5 * M), Money::new(300 * M))
            .unwrap();
        assert_eq!(h.qty(), Qty::new(15 * M));
        assert_eq!(h.cost_basis(), Money::new(800 * M));
    }

    #[test]
    fn increase_rejects_bad_deltas_without_mutation() {
        let h = holding(10, 500);
        assert!(h.increased(Qty::ZERO, Money::new(M)).is_err());
        assert!(h.increased(Qty::new(M), Money::ZERO).is_err());
        // original untouched (it is Copy, but assert the source state anyway)
        assert_eq!(h.qty(), Qty::new(10 * M));
    }

    #[test]
    fn partial_sale_reduces_cost_proportionally() {
        // sell half of 10 @ $1000 basis -> 5 @ $500
        let h = holding(10, 1000).reduced(Qty::new(5 * M)).unwrap().unwrap();
        assert_eq!(h.qty(), Qty::new(5 * M));
        assert_eq!(h.cost_basis(), Money::new(500 * M));
    }

    #[test]
    fn canonical_sell_four_of_ten() {
        // basis $500 on 10 shares; selling 4 leaves 500 * (1 - 4/10) = $300
        let h = holding(10, 500).reduced(Qty::new(4 * M)).unwrap().unwrap();
        assert_eq!(h.qty(), Qty::new(6 * M));
        assert_eq!(h.cost_basis(), Money::new(300 * M));
    }

    #[test]
    fn full_sale_closes_the_holding() {
        assert_eq!(holding(10, 500).reduced(Qty::new(10 * M)).unwrap(), None);
    }

    #[test]
    fn overselling_is_rejected_with_figures() {
        let err = holding(4, 100).reduced(Qty::new(10 * M)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientShares {
                need: Qty::new(10 * M),
                have: Qty::new(4 * M),
            }
        );
    }

    #[test]
    fn reduction_rounds_to_nearest_micro() {
        // 3 shares, $1.000001 basis; selling 1 removes 333333.67 -> 333334
        let h = Holding::opened(Qty::new(3 * M), Money::new(1_000_001)).unwrap();
        let rest = h.reduced(Qty::new(M)).unwrap().unwrap();
        assert_eq!(rest.cost_basis(), Money::new(666_667));
    }

    #[test]
    fn average_price_is_cost_over_qty() {
        assert_eq!(holding(10, 500).average_price(), Money::new(50 * M));
        // fractional: $25 over 2.5 shares = $10/share
        let h = Holding::opened(Qty::new(2_500_000), Money::new(25 * M)).unwrap();
        assert_eq!(h.average_price(), Money::new(10 * M));
    }
}
