//! Simulated GWAV oracle.
//!
//! Quotes are recorded per strike with the block time they were set at.
//! A read `seconds_ago` in the past returns the last quote set at or before
//! that time, or the earliest quote when none is that old.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use strands_core::{OptionPrices, Price, StrikeId};
use strands_venue::{BoxFuture, GwavOracle, VenueError, VenueResult};

use crate::chain::{ready, ChainState};

const CONTRACT: &str = "GWAVOracle";

/// One oracle observation for a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GwavQuote {
    pub timestamp: u64,
    pub delta: Decimal,
    pub prices: OptionPrices,
}

#[derive(Debug, Clone, Default)]
pub struct OracleState {
    history: HashMap<StrikeId, Vec<GwavQuote>>,
}

impl OracleState {
    /// Record a quote at `timestamp`. Quotes set at the same time replace
    /// each other.
    pub fn set_quote(
        &mut self,
        strike_id: StrikeId,
        timestamp: u64,
        delta: Decimal,
        call_price: Price,
        put_price: Price,
    ) {
        let quote = GwavQuote {
            timestamp,
            delta,
            prices: OptionPrices {
                call_price,
                put_price,
            },
        };
        let history = self.history.entry(strike_id).or_default();
        match history.last_mut() {
            Some(last) if last.timestamp == timestamp => *last = quote,
            _ => history.push(quote),
        }
    }

    pub fn quote_at(&self, strike_id: StrikeId, now: u64, seconds_ago: u64) -> VenueResult<GwavQuote> {
        let history = self
            .history
            .get(&strike_id)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| VenueError::reverted(CONTRACT, format!("no quote for {strike_id}")))?;
        let target = now.saturating_sub(seconds_ago);
        let quote = history
            .iter()
            .rev()
            .find(|q| q.timestamp <= target)
            .unwrap_or(&history[0]);
        Ok(*quote)
    }
}

/// `GwavOracle` handle over the simulated chain.
#[derive(Clone)]
pub struct SimGwavOracle {
    state: Arc<Mutex<ChainState>>,
}

impl SimGwavOracle {
    pub(crate) fn new(state: Arc<Mutex<ChainState>>) -> Self {
        Self { state }
    }

    fn quote(&self, strike_id: StrikeId, seconds_ago: u64) -> VenueResult<GwavQuote> {
        let guard = self.state.lock();
        guard.oracle.quote_at(strike_id, guard.timestamp, seconds_ago)
    }
}

impl GwavOracle for SimGwavOracle {
    fn delta_gwav(&self, strike_id: StrikeId, seconds_ago: u64) -> BoxFuture<VenueResult<Decimal>> {
        ready(self.quote(strike_id, seconds_ago).map(|q| q.delta))
    }

    fn option_price_gwav(
        &self,
        strike_id: StrikeId,
        seconds_ago: u64,
    ) -> BoxFuture<VenueResult<OptionPrices>> {
        ready(self.quote(strike_id, seconds_ago).map(|q| q.prices))
    }
}
