//! Core domain types for the Strands hedged-option strategy.
//!
//! This crate provides fundamental types used throughout the workspace:
//! - `Price`, `Size`, `Amount`: Precision-safe numeric types
//! - `StrikeId`, `BoardId`, `OptionPositionId`, `PositionIndex`: Identifiers
//! - `OptionType`, `PositionState`, `OptionPosition`: Options-market records
//! - `FuturesOrderType`, `DelayedOrder`, `FuturesPosition`: Perps-market records

pub mod decimal;
pub mod error;
pub mod futures;
pub mod ids;
pub mod option;

pub use alloy::primitives::Address;
pub use decimal::{Amount, Price, Size};
pub use error::{CoreError, CoreResult};
pub use futures::{DelayedOrder, FuturesOrderType, FuturesPosition};
pub use ids::{BoardId, OptionPositionId, PositionIndex, StrikeId};
pub use option::{
    OpenResult, OptionBoard, OptionPosition, OptionPrices, OptionType, PositionState,
    PremiumQuote, Strike,
};
