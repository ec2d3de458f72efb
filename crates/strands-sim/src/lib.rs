//! In-memory simulated chain for Strands.
//!
//! Implements every `strands-venue` seam (options market, option token,
//! GWAV oracle, perps market, ERC-20 tokens, state journal) over a single
//! shared [`ChainState`]. Used by the scenario runner and by tests in place
//! of a forked network.
//!
//! # Key Components
//!
//! - [`SimChain`]: Shared state, block clock, snapshots and [`SimChain::venue`]
//! - [`SimConfig`]: Seed market state (boards, strikes, quotes, perps params)

pub mod chain;
pub mod config;
pub mod options;
pub mod oracle;
pub mod perps;
pub mod token;

pub use chain::{
    ChainState, SimChain, BASE_ASSET_ADDRESS, OPTION_MARKET_ADDRESS, OPTION_TOKEN_ADDRESS,
    PERPS_MARKET_ADDRESS, SUSD_ADDRESS, USDC_ADDRESS,
};
pub use config::{BoardConfig, OptionsConfig, PerpsConfig, SimConfig, StrikeConfig, TokenConfig};
pub use options::{SimOptionMarket, SimOptionToken};
pub use oracle::SimGwavOracle;
pub use perps::SimFuturesMarket;
pub use token::SimToken;
