//! Strands hedged-position manager.
//!
//! Buys long calls on an options market and delta-hedges each position with
//! an off-chain delayed order on a perpetual-futures market.
//!
//! # Key Components
//!
//! - [`HedgeManager`]: open / reHedge / marginOf and registry reads
//! - [`MarginPolicy`]: Overcollateralized margin requirement
//! - [`PositionRegistry`]: Dense, 1-based arena of hedged positions
//! - [`MarginLedger`]: Per-owner attribution of the shared futures margin
//! - [`spawn_strategy`]: Actor wrapper serializing state-changing calls

pub mod config;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod margin;
pub mod registry;
pub mod service;

pub use config::{StrategyConfig, SupersessionPolicy};
pub use error::{HedgeError, HedgeResult};
pub use ledger::MarginLedger;
pub use manager::{HedgeManager, HedgeQuote, OpenReceipt, RehedgeReceipt};
pub use margin::{
    estimate_margin_allowance, estimate_premium_allowance, rehedge_margin_shortfall,
    MarginPolicy, MarginQuote,
};
pub use registry::{HedgedPosition, NewPosition, PositionRegistry, SynthetixLeg};
pub use service::{spawn_strategy, StrategyHandle, StrategyMsg, StrategyTask};
