//! Menu prices using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with its currency.
///
/// The dining room and the delivery menu are priced in đồng; USD exists for
/// the English-language catering sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Price in đồng.
    #[must_use]
    pub fn vnd(amount: i64) -> Self {
        Self::new(Decimal::from(amount), CurrencyCode::VND)
    }

    /// Price multiplied by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency_code {
            CurrencyCode::VND => {
                // No minor unit in circulation.
                let rounded = self
                    .amount
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
                    "-"
                } else {
                    ""
                };
                write!(
                    f,
                    "{sign}{} ₫",
                    group_thousands(&rounded.abs().to_string(), '.')
                )
            }
            CurrencyCode::USD => write!(f, "${:.2}", self.amount),
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes accepted by the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    VND,
    USD,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnd_display_groups_thousands() {
        assert_eq!(Price::vnd(45_000).to_string(), "45.000 ₫");
        assert_eq!(Price::vnd(1_250_000).to_string(), "1.250.000 ₫");
        assert_eq!(Price::vnd(500).to_string(), "500 ₫");
    }

    #[test]
    fn test_usd_display() {
        let price = Price::new(Decimal::new(1250, 2), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$12.50");
    }

    #[test]
    fn test_times_quantity() {
        assert_eq!(Price::vnd(35_000).times(3), Price::vnd(105_000));
    }
}
