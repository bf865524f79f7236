use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of fractional digits carried by ledger/account amounts (§3).
pub const LEDGER_SCALE: u32 = 8;

/// Number of fractional digits carried by fiat catalog prices (§3).
pub const FIAT_SCALE: u32 = 2;

/// A fixed-point monetary amount. Wraps `rust_decimal::Decimal` rather than
/// a float so every arithmetic operation is exact; the ledger poster and
/// balance engine never perform floating-point math (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Builds a ledger-scale amount, rescaling to `LEDGER_SCALE` fractional
    /// digits.
    pub fn ledger(amount: Decimal) -> Self {
        Money(amount.round_dp(LEDGER_SCALE))
    }

    /// Builds a fiat-scale amount (catalog prices), rescaling to
    /// `FIAT_SCALE` fractional digits.
    pub fn fiat(amount: Decimal) -> Self {
        Money(amount.round_dp(FIAT_SCALE))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::ledger(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ledger_amount_rescales_to_eight_digits() {
        let m = Money::ledger(dec!(1.1));
        assert_eq!(m.as_decimal().scale(), LEDGER_SCALE);
    }

    #[test]
    fn fiat_amount_rescales_to_two_digits() {
        let m = Money::fiat(dec!(9.999));
        assert_eq!(m.as_decimal().scale(), FIAT_SCALE);
    }

    #[test]
    fn checked_sub_detects_underflow_is_still_exact() {
        let a = Money::ledger(dec!(1));
        let b = Money::ledger(dec!(0.3));
        let c = (a - b).checked_sub(Money::ledger(dec!(0.3))).unwrap();
        assert_eq!(c, Money::ledger(dec!(0.4)));
    }
}
