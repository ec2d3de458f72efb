//! Precision-safe decimal types for hedging.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. On-chain values are
//! fixed-point integers; keeping them as decimals in token units avoids the
//! rounding drift that floating point would introduce into margin checks.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

macro_rules! decimal_newtype {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);
            pub const ONE: Self = Self(Decimal::ONE);

            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            #[inline]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            #[inline]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            #[inline]
            pub fn is_positive(&self) -> bool {
                self.0.is_sign_positive() && !self.0.is_zero()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = rust_decimal::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<Decimal> for $name {
            fn from(d: Decimal) -> Self {
                Self(d)
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<Decimal> for $name {
            type Output = Self;

            fn mul(self, rhs: Decimal) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<Decimal> for $name {
            type Output = Self;

            fn div(self, rhs: Decimal) -> Self::Output {
                Self(self.0 / rhs)
            }
        }
    };
}

/// Price with exact decimal precision.
///
/// Used for futures fill prices and option premiums per contract.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub Decimal);

decimal_newtype!(Price);

impl Price {
    /// Percentage of this price (`pct` = 2 means 2%).
    #[inline]
    pub fn pct(&self, pct: Decimal) -> Price {
        Self(self.0 * pct / dec!(100))
    }

    /// Round up to the nearest whole unit.
    #[inline]
    pub fn ceil(&self) -> Price {
        Self(self.0.ceil())
    }
}

/// Signed size with exact decimal precision.
///
/// Positive sizes are long, negative sizes are short. Futures size deltas
/// and option deltas both use this type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

decimal_newtype!(Size);

impl Size {
    /// Absolute size.
    #[inline]
    pub fn abs(&self) -> Size {
        Self(self.0.abs())
    }

    /// Notional value: |size| * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0.abs() * price.0
    }
}

impl Neg for Size {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl AddAssign for Size {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Token amount in whole token units (not raw base units).
///
/// Margin, premiums, fees and allowances are all amounts. Tokens carry their
/// own decimals; `round_to_decimals` truncates to what the token can hold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub Decimal);

decimal_newtype!(Amount);

impl Amount {
    /// Truncate to the token's decimal precision.
    #[inline]
    pub fn round_to_decimals(&self, decimals: u8) -> Amount {
        Self(self.0.trunc_with_scale(u32::from(decimals)))
    }

    /// Subtraction that floors at zero.
    #[inline]
    pub fn saturating_sub(&self, rhs: Amount) -> Amount {
        if rhs.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - rhs.0)
        }
    }

    /// Whether the value is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Price> for Amount {
    fn from(p: Price) -> Self {
        Self(p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_pct() {
        let price = Price::new(dec!(1850));
        assert_eq!(price.pct(dec!(2)), Price::new(dec!(37)));
    }

    #[test]
    fn test_price_ceil() {
        assert_eq!(Price::new(dec!(41.0001)).ceil(), Price::new(dec!(42)));
        assert_eq!(Price::new(dec!(41)).ceil(), Price::new(dec!(41)));
    }

    #[test]
    fn test_size_notional_uses_absolute_size() {
        let size = Size::new(dec!(-0.5));
        assert_eq!(size.notional(Price::new(dec!(2000))), dec!(1000));
    }

    #[test]
    fn test_amount_round_to_decimals_truncates() {
        let amount = Amount::new(dec!(12.3456789));
        assert_eq!(amount.round_to_decimals(6), Amount::new(dec!(12.345678)));
        assert_eq!(amount.round_to_decimals(0), Amount::new(dec!(12)));
    }

    #[test]
    fn test_amount_saturating_sub() {
        let a = Amount::new(dec!(10));
        assert_eq!(a.saturating_sub(Amount::new(dec!(4))), Amount::new(dec!(6)));
        assert_eq!(a.saturating_sub(Amount::new(dec!(11))), Amount::ZERO);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Amount::new(dec!(1.5))).unwrap();
        assert_eq!(json, "\"1.5\"");
    }
}
