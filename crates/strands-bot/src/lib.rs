//! Strands strategy runner.
//!
//! Wires the hedged-position manager to the simulated chain and drives it:
//! - Options market exploration (boards, strikes, GWAV greeks)
//! - Perps market exploration (price, skew, fill price, fees)
//! - End-to-end open / rehedge scenario with allowance planning

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, FuturesReport, OptionsReport, ScenarioReport};
pub use config::{AppConfig, ScenarioConfig};
pub use error::{AppError, AppResult};
