//! Value objects for stock quantities and prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of produce in the listing's unit (kg, quintal, ton).
///
/// Backed by an exact decimal so that repeated reserve/release cycles
/// return stock to exactly where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);
    /// Fractional digits a stored quantity keeps.
    pub const SCALE: u32 = 3;
    /// Largest quantity a single listing, order or cart line may carry.
    pub const MAX_UNITS: i64 = 1_000_000;

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// True when the value has at most [`Self::SCALE`] fractional digits.
    pub fn has_valid_scale(&self) -> bool {
        self.0.normalize().scale() <= Self::SCALE
    }

    pub fn exceeds_max(&self) -> bool {
        self.0 > Decimal::from(Self::MAX_UNITS)
    }

    /// Subtracts, clamping the result at zero.
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        if rhs.0 >= self.0 {
            Quantity::ZERO
        } else {
            Quantity(self.0 - rhs.0)
        }
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.normalize(), f)
    }
}

impl std::ops::Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        Quantity(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        Quantity(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

/// A money amount in rupees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    /// Fractional digits (paise) a stored amount keeps.
    pub const SCALE: u32 = 2;
    /// Largest accepted unit price in rupees.
    pub const MAX_UNIT_PRICE: i64 = 10_000_000;

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True when the value has at most [`Self::SCALE`] fractional digits.
    pub fn has_valid_scale(&self) -> bool {
        self.0.normalize().scale() <= Self::SCALE
    }

    pub fn exceeds_max_unit_price(&self) -> bool {
        self.0 > Decimal::from(Self::MAX_UNIT_PRICE)
    }

    /// Price of `quantity` units at this unit price, rounded to paise.
    ///
    /// Returns `None` if the product overflows.
    pub fn checked_times(&self, quantity: Quantity) -> Option<Money> {
        self.0
            .checked_mul(quantity.value())
            .map(|total| Money(total).round_to_scale())
    }

    /// Applies a fractional rate, e.g. `0.05` for five percent.
    pub fn percent_of(&self, rate: Decimal) -> Money {
        Money(self.0 * rate)
    }

    /// Divides by a count, returning zero when the count is zero.
    pub fn average_over(&self, count: usize) -> Money {
        if count == 0 {
            Money::ZERO
        } else {
            Money(self.0 / Decimal::from(count))
        }
    }

    /// Formats with exactly two fractional digits.
    pub fn to_fixed(&self) -> String {
        format!("{:.2}", self.rounded())
    }

    fn round_to_scale(self) -> Money {
        Money(self.rounded())
    }

    fn rounded(&self) -> Decimal {
        self.0.round_dp_with_strategy(
            Self::SCALE,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{:.2}", self.rounded())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_arithmetic_is_exact() {
        let stock = Quantity::new(Decimal::new(105, 1)); // 10.5
        let taken = Quantity::new(Decimal::new(33, 1)); // 3.3
        assert_eq!((stock - taken) + taken, stock);
    }

    #[test]
    fn quantity_saturating_sub_clamps_at_zero() {
        let q = Quantity::from(3).saturating_sub(Quantity::from(5));
        assert_eq!(q, Quantity::ZERO);
        assert_eq!(Quantity::from(5).saturating_sub(Quantity::from(3)), Quantity::from(2));
    }

    #[test]
    fn quantity_display_drops_trailing_zeros() {
        assert_eq!(Quantity::new(Decimal::new(2500, 3)).to_string(), "2.5");
        assert_eq!(Quantity::from(4).to_string(), "4");
    }

    #[test]
    fn money_times_quantity() {
        let price = Money::new(Decimal::new(4050, 2)); // 40.50
        let total = price.checked_times(Quantity::new(Decimal::new(25, 1))); // 2.5
        assert_eq!(total.map(|t| t.amount()), Some(Decimal::new(10125, 2)));
    }

    #[test]
    fn money_times_rounds_to_paise() {
        let price = Money::new(Decimal::new(1235, 2)); // 12.35
        let total = price
            .checked_times(Quantity::new(Decimal::new(1111, 3))) // 1.111
            .unwrap();
        assert_eq!(total.amount(), Decimal::new(1372, 2));
        assert!(total.has_valid_scale());
    }

    #[test]
    fn money_times_overflow_is_none() {
        let price = Money::new(Decimal::MAX);
        assert_eq!(price.checked_times(Quantity::from(10)), None);
    }

    #[test]
    fn scale_and_magnitude_bounds() {
        assert!(Quantity::new(Decimal::new(1500, 3)).has_valid_scale());
        assert!(Quantity::new(Decimal::new(15000, 4)).has_valid_scale()); // 1.5000
        assert!(!Quantity::new(Decimal::new(4, 4)).has_valid_scale()); // 0.0004
        assert!(!Quantity::from(Quantity::MAX_UNITS).exceeds_max());
        assert!(Quantity::from(Quantity::MAX_UNITS + 1).exceeds_max());

        assert!(Money::new(Decimal::new(1999, 2)).has_valid_scale());
        assert!(!Money::new(Decimal::new(19999, 3)).has_valid_scale()); // 19.999
        assert!(!Money::from(Money::MAX_UNIT_PRICE).exceeds_max_unit_price());
        assert!(Money::from(Money::MAX_UNIT_PRICE + 1).exceeds_max_unit_price());
    }

    #[test]
    fn money_percent_and_average() {
        let gross = Money::from(1000);
        assert_eq!(gross.percent_of(Decimal::new(5, 2)), Money::from(50));
        assert_eq!(gross.average_over(4), Money::from(250));
        assert_eq!(gross.average_over(0), Money::ZERO);
    }

    #[test]
    fn money_formatting() {
        assert_eq!(Money::from(12).to_fixed(), "12.00");
        assert_eq!(Money::new(Decimal::new(12345, 3)).to_fixed(), "12.35");
        assert_eq!(Money::from(7).to_string(), "₹7.00");
    }

    #[test]
    fn money_sum() {
        let total: Money = [Money::from(1), Money::from(2), Money::from(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from(6));
    }
}
