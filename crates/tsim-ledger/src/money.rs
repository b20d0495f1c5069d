//! Fixed-point money and quantity types.
//!
//! # Scale
//!
//! All monetary amounts and share quantities use a 1e-6 fixed-point
//! representation stored as `i64`: 1 USD = 1_000_000 [`Money`] units, 1 share
//! = 1_000_000 [`Qty`] units. Fractional shares are first-class: a
//! dollar-denominated buy produces a fractional quantity.
//!
//! Raw `i64` money is error-prone: it allows accidental arithmetic with
//! unrelated integers (row ids, share counts) with no compile-time signal.
//! The newtypes prevent:
//! - Implicit construction from raw `i64` (no `From<i64>` impl).
//! - Mixing money with quantity in arithmetic: the only cross-type operation
//!   is an explicit price × quantity multiplication.
//!
//! # Arithmetic
//!
//! - `checked_add` / `checked_sub` for ledger mutations, where overflow is a
//!   hard error the caller must surface.
//! - `saturating_add` for display-layer aggregation, where clamping beats
//!   aborting a report.
//! - Price × quantity and proportional division go through `i128`
//!   intermediates; the checked variants return `None` on `i64` overflow.
//!
//! # Parsing
//!
//! Amounts cross the boundary as decimal strings (`"182.34"`) and are
//! normalised deterministically (at most six fractional digits, no
//! floating-point anywhere.

use std::fmt;
use std::ops::Neg;

/// Fixed-point scale: units per whole dollar / whole share.
pub const UNIT: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// A monetary amount in millionths of a dollar.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// Construct from a raw micro-dollar count.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Money(raw)
    }

    /// The underlying micro-dollar count.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// `true` when strictly greater than zero.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `true` when strictly less than zero.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Overflow-checked addition.
    #[inline]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Overflow-checked subtraction.
    #[inline]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Saturating addition, for aggregation in display paths.
    #[inline]
    pub fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    /// Treat `self` as a per-share price and compute the value of `qty`
    /// shares, rounding to the nearest micro-dollar.
    ///
    /// Returns `None` on `i64` overflow. Callers in trade paths MUST handle
    /// `None` explicitly; an overflowing trade value is a hard error, not a
    /// routine saturation.
    #[inline]
    pub fn mul_qty(self, qty: Qty) -> Option<Money> {
        mul_div_round(self.0, qty.raw(), UNIT).map(Money)
    }

    /// Same as [`Money::mul_qty`] but clamps at the `i64` range, for
    /// valuation/report aggregation where clamping beats aborting.
    #[inline]
    pub fn mul_qty_saturating(self, qty: Qty) -> Money {
        let wide = (self.0 as i128) * (qty.raw() as i128);
        Money(clamp_i128(div_round_i128(wide, UNIT as i128)))
    }

    /// Divide a cash amount by a per-share price, yielding the share
    /// quantity that cash buys. Floors toward zero: you cannot buy more
    /// than the cash covers.
    ///
    /// Returns `None` when `price` is not strictly positive or on overflow.
    #[inline]
    pub fn div_price(self, price: Money) -> Option<Qty> {
        if price.0 <= 0 {
            return None;
        }
        mul_div_floor(self.0, UNIT, price.0).map(Qty)
    }

    /// Parse a decimal string (`"50"`, `"182.34"`, `"-0.25"`) into micro-
    /// dollars. At most six fractional digits.
    pub fn parse(s: &str) -> Result<Money, String> {
        parse_fixed(s).map(Money)
    }
}

impl Neg for Money {
    type Output = Money;
    #[inline]
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    /// Renders as a decimal dollar amount with at least two and at most six
    /// fractional digits: `50.00`, `0.500001`, `-2.75`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, whole, frac) = split_fixed(self.0);
        let mut digits = format!("{frac:06}");
        while digits.len() > 2 && digits.ends_with('0') {
            digits.pop();
        }
        write!(f, "{sign}{whole}.{digits}")
    }
}

// ---------------------------------------------------------------------------
// Qty
// ---------------------------------------------------------------------------

/// A share quantity in millionths of a share.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qty(i64);

impl Qty {
    /// Zero shares.
    pub const ZERO: Qty = Qty(0);

    /// Construct from a raw micro-share count.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Qty(raw)
    }

    /// The underlying micro-share count.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// `true` when strictly greater than zero.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Overflow-checked addition.
    #[inline]
    pub fn checked_add(self, rhs: Qty) -> Option<Qty> {
        self.0.checked_add(rhs.0).map(Qty)
    }

    /// Overflow-checked subtraction.
    #[inline]
    pub fn checked_sub(self, rhs: Qty) -> Option<Qty> {
        self.0.checked_sub(rhs.0).map(Qty)
    }

    /// Parse a decimal share count (`"10"`, `"2.5"`) into micro-shares.
    pub fn parse(s: &str) -> Result<Qty, String> {
        parse_fixed(s).map(Qty)
    }
}

impl fmt::Display for Qty {
    /// Renders as a decimal share count with trailing zeros trimmed:
    /// `10`, `2.5`, `0.000001`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, whole, frac) = split_fixed(self.0);
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let mut digits = format!("{frac:06}");
        while digits.ends_with('0') {
            digits.pop();
        }
        write!(f, "{sign}{whole}.{digits}")
    }
}

// ---------------------------------------------------------------------------
// Shared fixed-point helpers
// ---------------------------------------------------------------------------

/// `a * b / d`, rounding half away from zero. `None` on `i64` overflow.
pub(crate) fn mul_div_round(a: i64, b: i64, d: i64) -> Option<i64> {
    debug_assert!(d > 0);
    let wide = (a as i128) * (b as i128);
    let out = div_round_i128(wide, d as i128);
    in_i64(out)
}

/// `a * b / d`, truncating toward zero. `None` on `i64` overflow.
pub(crate) fn mul_div_floor(a: i64, b: i64, d: i64) -> Option<i64> {
    debug_assert!(d > 0);
    let wide = (a as i128) * (b as i128);
    in_i64(wide / (d as i128))
}

fn div_round_i128(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    let half = d / 2;
    if n >= 0 {
        (n + half) / d
    } else {
        (n - half) / d
    }
}

fn in_i64(x: i128) -> Option<i64> {
    if x > i64::MAX as i128 || x < i64::MIN as i128 {
        None
    } else {
        Some(x as i64)
    }
}

fn clamp_i128(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

fn split_fixed(raw: i64) -> (&'static str, u64, u64) {
    let sign = if raw < 0 { "-" } else { "" };
    let abs = raw.unsigned_abs();
    (sign, abs / UNIT as u64, abs % UNIT as u64)
}

/// Parse a signed decimal string at 1e-6 scale. Rejects empty input,
/// non-digit characters, and more than six fractional digits.
fn parse_fixed(s: &str) -> Result<i64, String> {
    let t = s.trim();
    if t.is_empty() {
        return Err("empty amount".to_string());
    }

    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };

    let (whole_s, frac_s) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };

    if whole_s.is_empty() && frac_s.is_empty() {
        return Err(format!("'{t}' is not a number"));
    }
    if !whole_s.chars().all(|c| c.is_ascii_digit()) || !frac_s.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{t}' is not a number"));
    }
    if frac_s.len() > 6 {
        return Err(format!("'{t}' has more than 6 fractional digits"));
    }

    let whole: i64 = if whole_s.is_empty() {
        0
    } else {
        whole_s
            .parse()
            .map_err(|_| format!("'{t}' is out of range"))?
    };

    let mut frac: i64 = 0;
    if !frac_s.is_empty() {
        frac = frac_s
            .parse()
            .map_err(|_| format!("'{t}' is out of range"))?;
        for _ in frac_s.len()..6 {
            frac *= 10;
        }
    }

    let magnitude = whole
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| format!("'{t}' is out of range"))?;

    Ok(if negative { -magnitude } else { magnitude })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const M: i64 = UNIT;

    #[test]
    fn add_sub_roundtrip() {
        let a = Money::new(100 * M);
        let b = Money::new(25 * M);
        assert_eq!(a.checked_add(b).unwrap().checked_sub(b).unwrap(), a);
    }

    #[test]
    fn checked_add_overflow_returns_none() {
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
    }

    #[test]
    fn saturating_add_clamps() {
        let x = Money::new(i64::MAX).saturating_add(Money::new(1));
        assert_eq!(x, Money::new(i64::MAX));
    }

    #[test]
    fn mul_qty_whole_shares() {
        // $50.00 x 10 shares = $500.00
        let price = Money::new(50 * M);
        let qty = Qty::new(10 * M);
        assert_eq!(price.mul_qty(qty), Some(Money::new(500 * M)));
    }

    #[test]
    fn mul_qty_fractional_shares() {
        // $10.00 x 2.5 shares = $25.00
        let price = Money::new(10 * M);
        let qty = Qty::new(2_500_000);
        assert_eq!(price.mul_qty(qty), Some(Money::new(25 * M)));
    }

    #[test]
    fn mul_qty_rounds_to_nearest_micro() {
        // $0.000001 x 0.5 shares = 0.5 micro-dollars, rounds up to 1
        let price = Money::new(1);
        let qty = Qty::new(500_000);
        assert_eq!(price.mul_qty(qty), Some(Money::new(1)));
    }

    #[test]
    fn mul_qty_overflow_returns_none() {
        let price = Money::new(i64::MAX);
        let qty = Qty::new(2 * M);
        assert_eq!(price.mul_qty(qty), None);
    }

    #[test]
    fn div_price_floors() {
        // $100 at $30/share = 3.333333 shares (floored at the sixth digit)
        let cash = Money::new(100 * M);
        let price = Money::new(30 * M);
        assert_eq!(cash.div_price(price), Some(Qty::new(3_333_333)));
    }

    #[test]
    fn div_price_zero_price_is_none() {
        assert_eq!(Money::new(100 * M).div_price(Money::ZERO), None);
    }

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!(Money::parse("50"), Ok(Money::new(50 * M)));
        assert_eq!(Money::parse("182.34"), Ok(Money::new(182_340_000)));
        assert_eq!(Money::parse("0.000001"), Ok(Money::new(1)));
        assert_eq!(Money::parse("-2.75"), Ok(Money::new(-2_750_000)));
        assert_eq!(Money::parse(".5"), Ok(Money::new(500_000)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("ten").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("1.0000001").is_err());
        assert!(Money::parse(".").is_err());
    }

    #[test]
    fn display_money() {
        assert_eq!(Money::new(50 * M).to_string(), "50.00");
        assert_eq!(Money::new(182_340_000).to_string(), "182.34");
        assert_eq!(Money::new(500_001).to_string(), "0.500001");
        assert_eq!(Money::new(-2_750_000).to_string(), "-2.75");
        // sub-dollar negative keeps its sign
        assert_eq!(Money::new(-1).to_string(), "-0.000001");
    }

    #[test]
    fn display_qty() {
        assert_eq!(Qty::new(10 * M).to_string(), "10");
        assert_eq!(Qty::new(2_500_000).to_string(), "2.5");
        assert_eq!(Qty::new(1).to_string(), "0.000001");
    }

    #[test]
    fn parse_display_roundtrip() {
        for s in ["0.00", "1.50", "12345.678901", "-0.25"] {
            let m = Money::parse(s).unwrap();
            assert_eq!(Money::parse(&m.to_string()).unwrap(), m);
        }
    }
}
