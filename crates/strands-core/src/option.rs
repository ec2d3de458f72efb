//! Options-market records: boards, strikes and option positions.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::ids::{BoardId, OptionPositionId, StrikeId};
use crate::{Address, Amount, Price};

/// Option type as encoded by the options market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionType {
    LongCall,
    LongPut,
    ShortCallBase,
    ShortCallQuote,
    ShortPutQuote,
}

impl OptionType {
    /// On-chain enum ordinal.
    pub fn code(&self) -> u8 {
        match self {
            Self::LongCall => 0,
            Self::LongPut => 1,
            Self::ShortCallBase => 2,
            Self::ShortCallQuote => 3,
            Self::ShortPutQuote => 4,
        }
    }

    /// Long positions carry no collateral.
    pub fn is_long(&self) -> bool {
        matches!(self, Self::LongCall | Self::LongPut)
    }
}

impl TryFrom<u8> for OptionType {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::LongCall),
            1 => Ok(Self::LongPut),
            2 => Ok(Self::ShortCallBase),
            3 => Ok(Self::ShortCallQuote),
            4 => Ok(Self::ShortPutQuote),
            other => Err(CoreError::InvalidOptionType(other)),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LongCall => write!(f, "LONG_CALL"),
            Self::LongPut => write!(f, "LONG_PUT"),
            Self::ShortCallBase => write!(f, "SHORT_CALL_BASE"),
            Self::ShortCallQuote => write!(f, "SHORT_CALL_QUOTE"),
            Self::ShortPutQuote => write!(f, "SHORT_PUT_QUOTE"),
        }
    }
}

/// Lifecycle state of an option position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    #[default]
    Empty,
    Active,
    Closed,
    Liquidated,
    Settled,
    Merged,
}

impl PositionState {
    /// On-chain enum ordinal.
    pub fn code(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Active => 1,
            Self::Closed => 2,
            Self::Liquidated => 3,
            Self::Settled => 4,
            Self::Merged => 5,
        }
    }
}

/// A board groups strikes sharing one expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionBoard {
    pub id: BoardId,
    /// Expiry as Unix seconds.
    pub expiry: u64,
    /// Base implied volatility.
    pub iv: Decimal,
    /// Frozen boards accept no trades.
    pub frozen: bool,
    pub strike_ids: Vec<StrikeId>,
}

impl OptionBoard {
    /// Expiry as a UTC timestamp.
    pub fn expiry_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expiry)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Whether the board has expired at `now` (Unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiry
    }

    /// Whether the board can be traded at `now`.
    pub fn is_tradeable(&self, now: u64) -> bool {
        !self.frozen && !self.is_expired(now)
    }
}

/// A single strike on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub id: StrikeId,
    pub strike_price: Price,
    /// Volatility skew relative to the board IV.
    pub skew: Decimal,
    pub board_id: BoardId,
}

/// An option position as held in the option-token registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPosition {
    pub position_id: OptionPositionId,
    pub strike_id: StrikeId,
    pub option_type: OptionType,
    /// Number of contracts.
    pub amount: Amount,
    pub collateral: Amount,
    pub state: PositionState,
    pub owner: Address,
}

/// GWAV option prices for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPrices {
    pub call_price: Price,
    pub put_price: Price,
}

/// Cost of buying options before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumQuote {
    pub premium: Amount,
    pub fee: Amount,
    /// premium + fee; the amount charged in quote asset.
    pub total_cost: Amount,
}

/// Result of a successful option purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenResult {
    pub position_id: OptionPositionId,
    pub total_cost: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn board(expiry: u64, frozen: bool) -> OptionBoard {
        OptionBoard {
            id: BoardId::new(20),
            expiry,
            iv: dec!(0.7),
            frozen,
            strike_ids: vec![StrikeId::new(308)],
        }
    }

    #[test]
    fn test_option_type_codes_round_trip_through_ordinal() {
        assert_eq!(OptionType::LongCall.code(), 0);
        assert_eq!(OptionType::try_from(0).unwrap(), OptionType::LongCall);
        assert!(OptionType::try_from(9).is_err());
    }

    #[test]
    fn test_position_state_active_code() {
        assert_eq!(PositionState::Active.code(), 1);
    }

    #[test]
    fn test_board_tradeable() {
        assert!(board(1_000, false).is_tradeable(999));
        assert!(!board(1_000, false).is_tradeable(1_000));
        assert!(!board(1_000, true).is_tradeable(10));
    }

    #[test]
    fn test_board_expiry_datetime() {
        let dt = board(1_700_000_000, false).expiry_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
