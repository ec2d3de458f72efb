//! Bundle of collaborator handles.

use std::sync::Arc;

use strands_core::Address;
use tracing::debug;

use crate::{Erc20, FuturesMarket, GwavOracle, OptionMarket, OptionToken, StateJournal};

/// Every collaborator the manager calls, behind shared trait objects.
#[derive(Clone)]
pub struct Venue {
    pub option_market: Arc<dyn OptionMarket>,
    pub option_token: Arc<dyn OptionToken>,
    pub oracle: Arc<dyn GwavOracle>,
    pub futures: Arc<dyn FuturesMarket>,
    /// Token option premiums are paid in.
    pub quote_token: Arc<dyn Erc20>,
    /// Token futures margin is posted in.
    pub margin_token: Arc<dyn Erc20>,
    pub journal: Arc<dyn StateJournal>,
}

impl Venue {
    /// Bundle collaborator handles.
    #[must_use]
    pub fn new(
        option_market: Arc<dyn OptionMarket>,
        option_token: Arc<dyn OptionToken>,
        oracle: Arc<dyn GwavOracle>,
        futures: Arc<dyn FuturesMarket>,
        quote_token: Arc<dyn Erc20>,
        margin_token: Arc<dyn Erc20>,
        journal: Arc<dyn StateJournal>,
    ) -> Self {
        debug!(
            option_market = %option_market.address(),
            quote = %quote_token.symbol(),
            margin = %margin_token.symbol(),
            futures = %futures.market_key(),
            "Venue assembled"
        );
        Self {
            option_market,
            option_token,
            oracle,
            futures,
            quote_token,
            margin_token,
            journal,
        }
    }

    /// Address premiums must be approved to.
    pub fn premium_spender(&self) -> Address {
        self.option_market.address()
    }
}

impl std::fmt::Debug for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Venue")
            .field("option_market", &self.option_market.address())
            .field("futures", &self.futures.market_key())
            .field("quote_token", &self.quote_token.symbol())
            .field("margin_token", &self.margin_token.symbol())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Checkpoint, MockErc20, MockFuturesMarket, MockGwavOracle, MockOptionMarket,
        MockOptionToken, MockStateJournal,
    };
    use rust_decimal_macros::dec;
    use strands_core::StrikeId;

    fn market_address() -> Address {
        Address::repeat_byte(0x59)
    }

    fn mock_venue() -> Venue {
        let mut option_market = MockOptionMarket::new();
        option_market.expect_address().return_const(market_address());

        let mut futures = MockFuturesMarket::new();
        futures
            .expect_market_key()
            .returning(|| "sETHPERP".to_string());

        let mut quote = MockErc20::new();
        quote.expect_symbol().returning(|| "USDC".to_string());
        let mut margin = MockErc20::new();
        margin.expect_symbol().returning(|| "sUSD".to_string());

        let mut oracle = MockGwavOracle::new();
        oracle
            .expect_delta_gwav()
            .returning(|_, _| Box::pin(async { Ok(dec!(0.55)) }));

        let mut journal = MockStateJournal::new();
        journal.expect_checkpoint().returning(|| Checkpoint(1));

        Venue::new(
            Arc::new(option_market),
            Arc::new(MockOptionToken::new()),
            Arc::new(oracle),
            Arc::new(futures),
            Arc::new(quote),
            Arc::new(margin),
            Arc::new(journal),
        )
    }

    #[test]
    fn test_premium_spender_is_option_market() {
        let venue = mock_venue();
        assert_eq!(venue.premium_spender(), market_address());
    }

    #[test]
    fn test_trait_objects_dispatch_through_bundle() {
        let venue = mock_venue();
        let delta = tokio_test::block_on(venue.oracle.delta_gwav(StrikeId::new(308), 0)).unwrap();
        assert_eq!(delta, dec!(0.55));
        assert_eq!(venue.journal.checkpoint(), Checkpoint(1));
    }

    #[test]
    fn test_debug_shows_symbols() {
        let venue = mock_venue();
        let rendered = format!("{venue:?}");
        assert!(rendered.contains("USDC"));
        assert!(rendered.contains("sETHPERP"));
    }
}
