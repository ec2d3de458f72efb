//! Margin policy for the futures leg and allowance planning helpers.
//!
//! The required margin for one hedge order is
//! `(fill_price + order_fee + keeper_fee_buffer) * margin_multiplier`, where
//! the keeper fee buffer is `keeper_fee_pct` percent of the fill price.
//! Every computation returns a [`MarginQuote`] recording each component.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strands_core::{Amount, Price};

use crate::config::StrategyConfig;

/// Overcollateralization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginPolicy {
    pub keeper_fee_pct: Decimal,
    pub margin_multiplier: Decimal,
}

impl MarginPolicy {
    pub fn new(keeper_fee_pct: Decimal, margin_multiplier: Decimal) -> Self {
        Self {
            keeper_fee_pct,
            margin_multiplier,
        }
    }

    /// Margin required to back an order filling at `fill_price` with
    /// `order_fee`.
    #[must_use]
    pub fn quote(&self, fill_price: Price, order_fee: Amount) -> MarginQuote {
        let keeper_fee_buffer = Amount::from(fill_price.pct(self.keeper_fee_pct));
        let required =
            (Amount::from(fill_price) + order_fee + keeper_fee_buffer) * self.margin_multiplier;
        MarginQuote {
            fill_price,
            order_fee,
            keeper_fee_buffer,
            margin_multiplier: self.margin_multiplier,
            required,
        }
    }
}

impl From<&StrategyConfig> for MarginPolicy {
    fn from(config: &StrategyConfig) -> Self {
        Self::new(config.keeper_fee_pct, config.margin_multiplier)
    }
}

/// Components of a margin requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginQuote {
    pub fill_price: Price,
    pub order_fee: Amount,
    pub keeper_fee_buffer: Amount,
    pub margin_multiplier: Decimal,
    pub required: Amount,
}

/// Quote-token allowance an owner should grant before buying `amount`
/// calls priced at `call_price`: the premium rounded up to whole units
/// plus `fee_pct` percent of it, also rounded up.
#[must_use]
pub fn estimate_premium_allowance(call_price: Price, amount: Amount, fee_pct: Decimal) -> Amount {
    let premium = Price::new(call_price.inner() * amount.inner()).ceil();
    let fee = premium.pct(fee_pct).ceil();
    Amount::from(premium + fee)
}

/// Margin-token allowance an owner should grant before opening.
#[must_use]
pub fn estimate_margin_allowance(
    policy: &MarginPolicy,
    fill_price: Price,
    order_fee: Amount,
) -> Amount {
    policy.quote(fill_price, order_fee).required
}

/// Extra margin a rehedge must pull when `remaining` is below `required`.
#[must_use]
pub fn rehedge_margin_shortfall(remaining: Amount, required: Amount) -> Amount {
    required.saturating_sub(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy() -> MarginPolicy {
        MarginPolicy::new(dec!(2), dec!(2))
    }

    #[test]
    fn test_required_margin_formula() {
        let quote = policy().quote(Price::new(dec!(1850)), Amount::new(dec!(0.33)));
        assert_eq!(quote.keeper_fee_buffer, Amount::new(dec!(37)));
        // (1850 + 0.33 + 37) * 2
        assert_eq!(quote.required, Amount::new(dec!(3774.66)));
    }

    #[test]
    fn test_multiplier_one_is_plain_sum() {
        let policy = MarginPolicy::new(dec!(0), dec!(1));
        let quote = policy.quote(Price::new(dec!(100)), Amount::new(dec!(1)));
        assert_eq!(quote.required, Amount::new(dec!(101)));
    }

    #[test]
    fn test_premium_allowance_rounds_up() {
        // ceil(56.8) = 57, ceil(57 * 2%) = ceil(1.14) = 2
        let allowance = estimate_premium_allowance(Price::new(dec!(56.8)), Amount::ONE, dec!(2));
        assert_eq!(allowance, Amount::new(dec!(59)));
        // ceil(170.4) = 171, ceil(3.42) = 4
        let allowance =
            estimate_premium_allowance(Price::new(dec!(56.8)), Amount::new(dec!(3)), dec!(2));
        assert_eq!(allowance, Amount::new(dec!(175)));
    }

    #[test]
    fn test_margin_allowance_matches_policy() {
        let policy = policy();
        assert_eq!(
            estimate_margin_allowance(&policy, Price::new(dec!(1850)), Amount::new(dec!(0.33))),
            policy.quote(Price::new(dec!(1850)), Amount::new(dec!(0.33))).required
        );
    }

    #[test]
    fn test_rehedge_shortfall() {
        assert_eq!(
            rehedge_margin_shortfall(Amount::new(dec!(3000)), Amount::new(dec!(3774.66))),
            Amount::new(dec!(774.66))
        );
        assert_eq!(
            rehedge_margin_shortfall(Amount::new(dec!(4000)), Amount::new(dec!(3774.66))),
            Amount::ZERO
        );
    }
}
