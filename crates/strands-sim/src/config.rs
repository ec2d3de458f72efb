//! Simulator seed configuration.
//!
//! Describes the market state the simulated chain starts from: tokens,
//! option boards with their strikes and oracle quotes, and perps market
//! parameters. Defaults reproduce an ETH market with one live board.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Token seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub decimals: u8,
}

/// Strike seed with its initial oracle quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeConfig {
    pub id: u64,
    pub strike_price: Decimal,
    #[serde(default = "default_skew")]
    pub skew: Decimal,
    /// GWAV call delta of one contract.
    pub delta: Decimal,
    pub call_price: Decimal,
    pub put_price: Decimal,
}

fn default_skew() -> Decimal {
    Decimal::ONE
}

/// Board seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub id: u64,
    /// Expiry relative to the start timestamp (seconds). Negative boards
    /// start out expired.
    pub expires_in_secs: i64,
    pub iv: Decimal,
    #[serde(default)]
    pub frozen: bool,
    pub strikes: Vec<StrikeConfig>,
}

/// Options market parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Fee charged on top of the premium, as a fraction.
    #[serde(default = "default_option_fee_rate")]
    pub fee_rate: Decimal,
    #[serde(default = "default_boards")]
    pub boards: Vec<BoardConfig>,
}

fn default_option_fee_rate() -> Decimal {
    dec!(0.01)
}

fn default_boards() -> Vec<BoardConfig> {
    vec![
        BoardConfig {
            id: 19,
            expires_in_secs: -86_400,
            iv: dec!(0.65),
            frozen: false,
            strikes: vec![StrikeConfig {
                id: 1,
                strike_price: dec!(1600),
                skew: Decimal::ONE,
                delta: dec!(0.9),
                call_price: dec!(250),
                put_price: dec!(0.1),
            }],
        },
        BoardConfig {
            id: 20,
            expires_in_secs: 14 * 86_400,
            iv: dec!(0.72),
            frozen: false,
            strikes: vec![
                StrikeConfig {
                    id: 306,
                    strike_price: dec!(1700),
                    skew: dec!(1.05),
                    delta: dec!(0.78),
                    call_price: dec!(172.4),
                    put_price: dec!(21.9),
                },
                StrikeConfig {
                    id: 307,
                    strike_price: dec!(1800),
                    skew: dec!(1.01),
                    delta: dec!(0.62),
                    call_price: dec!(104.3),
                    put_price: dec!(53.6),
                },
                StrikeConfig {
                    id: 308,
                    strike_price: dec!(1900),
                    skew: Decimal::ONE,
                    delta: dec!(0.44),
                    call_price: dec!(56.8),
                    put_price: dec!(105.9),
                },
                StrikeConfig {
                    id: 309,
                    strike_price: dec!(2000),
                    skew: dec!(1.02),
                    delta: dec!(0.27),
                    call_price: dec!(27.1),
                    put_price: dec!(176.0),
                },
            ],
        },
        BoardConfig {
            id: 21,
            expires_in_secs: 28 * 86_400,
            iv: dec!(0.7),
            frozen: true,
            strikes: vec![StrikeConfig {
                id: 320,
                strike_price: dec!(1900),
                skew: Decimal::ONE,
                delta: dec!(0.48),
                call_price: dec!(88.0),
                put_price: dec!(137.0),
            }],
        },
    ]
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_option_fee_rate(),
            boards: default_boards(),
        }
    }
}

/// Perps market parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerpsConfig {
    #[serde(default = "default_market_key")]
    pub market_key: String,
    #[serde(default = "default_base_asset")]
    pub base_asset: String,
    /// Initial oracle price of the base asset.
    #[serde(default = "default_price")]
    pub price: Decimal,
    /// Skew from traders outside the simulation.
    #[serde(default)]
    pub base_skew: Decimal,
    #[serde(default = "default_skew_scale")]
    pub skew_scale: Decimal,
    #[serde(default = "default_taker_fee_atomic")]
    pub taker_fee_atomic: Decimal,
    #[serde(default = "default_taker_fee_delayed")]
    pub taker_fee_delayed: Decimal,
    #[serde(default = "default_taker_fee_offchain")]
    pub taker_fee_offchain: Decimal,
    /// Keeper deposit held back from margin per delayed order.
    #[serde(default = "default_min_keeper_fee")]
    pub min_keeper_fee: Decimal,
    /// Replace a pending delayed order on submit instead of reverting.
    #[serde(default)]
    pub auto_cancel_previous: bool,
}

fn default_market_key() -> String {
    "sETHPERP".to_string()
}

fn default_base_asset() -> String {
    "sETH".to_string()
}

fn default_price() -> Decimal {
    dec!(1850)
}

fn default_skew_scale() -> Decimal {
    dec!(1000000)
}

fn default_taker_fee_atomic() -> Decimal {
    dec!(0.001)
}

fn default_taker_fee_delayed() -> Decimal {
    dec!(0.0006)
}

fn default_taker_fee_offchain() -> Decimal {
    dec!(0.0004)
}

fn default_min_keeper_fee() -> Decimal {
    dec!(2)
}

impl Default for PerpsConfig {
    fn default() -> Self {
        Self {
            market_key: default_market_key(),
            base_asset: default_base_asset(),
            price: default_price(),
            base_skew: Decimal::ZERO,
            skew_scale: default_skew_scale(),
            taker_fee_atomic: default_taker_fee_atomic(),
            taker_fee_delayed: default_taker_fee_delayed(),
            taker_fee_offchain: default_taker_fee_offchain(),
            min_keeper_fee: default_min_keeper_fee(),
            auto_cancel_previous: false,
        }
    }
}

/// Full simulator seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Block time of the first block (Unix seconds).
    #[serde(default = "default_start_timestamp")]
    pub start_timestamp: u64,
    #[serde(default = "default_quote_token")]
    pub quote_token: TokenConfig,
    #[serde(default = "default_margin_token")]
    pub margin_token: TokenConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub perps: PerpsConfig,
}

fn default_start_timestamp() -> u64 {
    1_690_000_000
}

fn default_quote_token() -> TokenConfig {
    TokenConfig {
        symbol: "USDC".to_string(),
        decimals: 6,
    }
}

fn default_margin_token() -> TokenConfig {
    TokenConfig {
        symbol: "sUSD".to_string(),
        decimals: 18,
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_timestamp: default_start_timestamp(),
            quote_token: default_quote_token(),
            margin_token: default_margin_token(),
            options: OptionsConfig::default(),
            perps: PerpsConfig::default(),
        }
    }
}
