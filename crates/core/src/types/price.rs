//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog API publishes prices as plain JSON numbers in Brazilian Real
//! (e.g. `179.9`). They are held as [`Decimal`] so subtotals never pick up
//! floating-point drift, and serialized back as numbers so the persisted
//! cart snapshot keeps the catalog's shape.

use std::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency symbol prefixed by [`Price::display`].
const CURRENCY_SYMBOL: &str = "R$";

/// A price in the storefront's currency (BRL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display using pt-BR conventions (e.g., "R$ 1.234,56").
    #[must_use]
    pub fn display(&self) -> String {
        let fixed = format!("{:.2}", self.0.abs().round_dp(2));
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let digits: Vec<char> = whole.chars().collect();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(*digit);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{CURRENCY_SYMBOL} {grouped},{cents}")
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}
