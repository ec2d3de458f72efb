//! Perpetual-futures records: order types, delayed orders and positions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::{Amount, Price, Size};

/// How an order reaches the futures market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuturesOrderType {
    /// Executed in the submitting transaction.
    Atomic,
    /// Executed by a keeper after a target oracle round.
    Delayed,
    /// Executed by a keeper with an off-chain price update.
    #[default]
    Offchain,
}

impl FuturesOrderType {
    /// On-chain enum ordinal.
    pub fn code(&self) -> u8 {
        match self {
            Self::Atomic => 0,
            Self::Delayed => 1,
            Self::Offchain => 2,
        }
    }
}

impl TryFrom<u8> for FuturesOrderType {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Atomic),
            1 => Ok(Self::Delayed),
            2 => Ok(Self::Offchain),
            other => Err(CoreError::InvalidOrderType(other)),
        }
    }
}

impl fmt::Display for FuturesOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::Delayed => write!(f, "delayed"),
            Self::Offchain => write!(f, "offchain"),
        }
    }
}

/// A delayed order waiting for keeper execution.
///
/// Field semantics follow the perps market's delayed-order record:
/// off-chain orders have no target round, no commit deposit and no
/// executable-at time; the keeper deposit is held back from margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedOrder {
    pub is_offchain: bool,
    pub size_delta: Size,
    pub desired_fill_price: Price,
    pub target_round_id: u64,
    pub commit_deposit: Amount,
    pub keeper_deposit: Amount,
    pub executable_at_time: u64,
    /// Block time at submission (Unix seconds).
    pub intention_time: u64,
    pub tracking_code: [u8; 32],
}

impl DelayedOrder {
    /// Build an off-chain delayed order submitted at `intention_time`.
    #[must_use]
    pub fn offchain(
        size_delta: Size,
        desired_fill_price: Price,
        keeper_deposit: Amount,
        intention_time: u64,
    ) -> Self {
        Self {
            is_offchain: true,
            size_delta,
            desired_fill_price,
            target_round_id: 0,
            commit_deposit: Amount::ZERO,
            keeper_deposit,
            executable_at_time: 0,
            intention_time,
            tracking_code: [0u8; 32],
        }
    }

    /// Returns true if the order is an empty slot.
    pub fn is_empty(&self) -> bool {
        self.size_delta.is_zero()
    }
}

/// Futures position of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturesPosition {
    pub size: Size,
    pub last_price: Price,
    /// Margin posted, before unrealized PnL.
    pub margin: Amount,
}

impl FuturesPosition {
    /// Margin plus unrealized PnL at `price`, floored at zero.
    pub fn remaining_margin(&self, price: Price) -> Amount {
        let pnl = self.size.inner() * (price.inner() - self.last_price.inner());
        let remaining = self.margin.inner() + pnl;
        if remaining.is_sign_negative() {
            Amount::ZERO
        } else {
            Amount::new(remaining)
        }
    }
}
