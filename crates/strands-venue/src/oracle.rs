//! GWAV oracle seam.

use rust_decimal::Decimal;
use strands_core::{OptionPrices, StrikeId};

use crate::{BoxFuture, VenueResult};

/// Geometric time-weighted average Greeks and prices.
///
/// `seconds_ago = 0` reads the current GWAV value.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait GwavOracle: Send + Sync {
    /// Call delta of one contract.
    fn delta_gwav(&self, strike_id: StrikeId, seconds_ago: u64) -> BoxFuture<VenueResult<Decimal>>;

    /// Call and put price of one contract.
    fn option_price_gwav(
        &self,
        strike_id: StrikeId,
        seconds_ago: u64,
    ) -> BoxFuture<VenueResult<OptionPrices>>;
}
