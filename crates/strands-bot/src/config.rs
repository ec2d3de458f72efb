//! Application configuration.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strands_core::{Address, StrikeId};
use strands_hedge::StrategyConfig;
use strands_sim::SimConfig;

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "STRANDS_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

/// Parameters of the open / rehedge scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Address buying the hedged calls.
    #[serde(default = "default_owner")]
    pub owner: Address,
    /// Address executing delayed orders when `execute_keeper` is set.
    #[serde(default = "default_keeper")]
    pub keeper: Address,
    #[serde(default = "default_strike_id")]
    pub strike_id: StrikeId,
    /// Contracts to buy.
    #[serde(default = "default_amount")]
    pub amount: Decimal,
    /// Seconds the clock advances between open and rehedge.
    #[serde(default = "default_time_step_secs")]
    pub time_step_secs: u64,
    /// Quote token minted to the owner.
    #[serde(default = "default_quote_funding")]
    pub quote_funding: Decimal,
    /// Margin token minted to the owner.
    #[serde(default = "default_margin_funding")]
    pub margin_funding: Decimal,
    /// Fee percentage added to the premium allowance estimate.
    #[serde(default = "default_premium_fee_pct")]
    pub premium_fee_pct: Decimal,
    /// GWAV delta set on the strike after the time step.
    #[serde(default = "default_post_step_delta")]
    pub post_step_delta: Decimal,
    #[serde(default = "default_post_step_call_price")]
    pub post_step_call_price: Decimal,
    #[serde(default = "default_post_step_put_price")]
    pub post_step_put_price: Decimal,
    /// Run the keeper on the opening order before the time step.
    #[serde(default)]
    pub execute_keeper: bool,
}

fn default_owner() -> Address {
    Address::repeat_byte(0x0e)
}

fn default_keeper() -> Address {
    Address::repeat_byte(0x4e)
}

fn default_strike_id() -> StrikeId {
    StrikeId::new(308)
}

fn default_amount() -> Decimal {
    dec!(3)
}

fn default_time_step_secs() -> u64 {
    84_600
}

fn default_quote_funding() -> Decimal {
    dec!(10000)
}

fn default_margin_funding() -> Decimal {
    dec!(100000)
}

fn default_premium_fee_pct() -> Decimal {
    dec!(2)
}

fn default_post_step_delta() -> Decimal {
    dec!(0.5)
}

fn default_post_step_call_price() -> Decimal {
    dec!(60)
}

fn default_post_step_put_price() -> Decimal {
    dec!(100)
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            keeper: default_keeper(),
            strike_id: default_strike_id(),
            amount: default_amount(),
            time_step_secs: default_time_step_secs(),
            quote_funding: default_quote_funding(),
            margin_funding: default_margin_funding(),
            premium_fee_pct: default_premium_fee_pct(),
            post_step_delta: default_post_step_delta(),
            post_step_call_price: default_post_step_call_price(),
            post_step_put_price: default_post_step_put_price(),
            execute_keeper: false,
        }
    }
}

impl AppConfig {
    /// Config path: CLI argument > `STRANDS_CONFIG` > default path.
    pub fn resolve_path(cli: Option<String>) -> String {
        cli.or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
