//! Strategy configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strands_core::{Address, FuturesOrderType};

/// What to do with a still-pending hedge order when a new one is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersessionPolicy {
    /// Cancel the pending order (refunding its keeper deposit) first.
    #[default]
    CancelPrevious,
    /// Submit directly; the futures market decides.
    DeferToMarket,
}

/// Strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Address of the strategy account holding both legs.
    #[serde(default = "default_account")]
    pub account: Address,
    /// Order type used for fee quotes.
    #[serde(default)]
    pub order_type: FuturesOrderType,
    /// Keeper fee buffer as a percentage of the fill price.
    #[serde(default = "default_keeper_fee_pct")]
    pub keeper_fee_pct: Decimal,
    /// Overcollateralization factor applied to the margin requirement.
    #[serde(default = "default_margin_multiplier")]
    pub margin_multiplier: Decimal,
    #[serde(default)]
    pub supersession: SupersessionPolicy,
    /// GWAV lookback used for delta reads (0 = current).
    #[serde(default)]
    pub seconds_ago: u64,
    /// Actor mailbox capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_account() -> Address {
    Address::repeat_byte(0x5a)
}

fn default_keeper_fee_pct() -> Decimal {
    dec!(2)
}

fn default_margin_multiplier() -> Decimal {
    dec!(2)
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            order_type: FuturesOrderType::Offchain,
            keeper_fee_pct: default_keeper_fee_pct(),
            margin_multiplier: default_margin_multiplier(),
            supersession: SupersessionPolicy::default(),
            seconds_ago: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}
