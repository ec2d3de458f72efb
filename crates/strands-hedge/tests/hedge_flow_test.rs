//! End-to-end manager flows against the simulated chain.

use rust_decimal_macros::dec;
use strands_core::{Address, Amount, BoardId, OptionPositionId, Price, Size, StrikeId};
use strands_hedge::{
    estimate_premium_allowance, rehedge_margin_shortfall, HedgeError, HedgeManager,
    StrategyConfig, SupersessionPolicy,
};
use strands_sim::{SimChain, SimConfig, SUSD_ADDRESS, USDC_ADDRESS};
use strands_venue::{Erc20, FuturesMarket, OptionToken, Venue};

const STRIKE: StrikeId = StrikeId::new(308);

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn keeper() -> Address {
    Address::repeat_byte(0x4e)
}

struct Harness {
    chain: SimChain,
    venue: Venue,
    manager: HedgeManager,
}

impl Harness {
    fn new() -> Self {
        Self::with(SimConfig::default(), StrategyConfig::default())
    }

    fn with(sim: SimConfig, strategy: StrategyConfig) -> Self {
        let chain = SimChain::new(&sim);
        let venue = chain.venue();
        let manager = HedgeManager::new(venue.clone(), strategy);
        for owner in [alice(), bob()] {
            chain
                .mint(USDC_ADDRESS, owner, Amount::new(dec!(10000)))
                .unwrap();
            chain
                .mint(SUSD_ADDRESS, owner, Amount::new(dec!(100000)))
                .unwrap();
        }
        Self {
            chain,
            venue,
            manager,
        }
    }

    fn account(&self) -> Address {
        self.manager.account()
    }

    async fn approve_premium(&self, owner: Address, amount: Amount) {
        self.venue
            .quote_token
            .approve(owner, self.account(), amount)
            .await
            .unwrap();
    }

    async fn approve_margin(&self, owner: Address, amount: Amount) {
        self.venue
            .margin_token
            .approve(owner, self.account(), amount)
            .await
            .unwrap();
    }

    /// Approve exactly what an open of `amount` at strike 308 will pull.
    async fn approve_open(&self, owner: Address, amount: Amount) {
        let allowance = estimate_premium_allowance(Price::new(dec!(56.8)), amount, dec!(2));
        self.approve_premium(owner, allowance).await;
        let hedge = self.manager.quote_hedge(STRIKE).await.unwrap();
        self.approve_margin(owner, hedge.margin.required).await;
    }

    async fn usdc(&self, owner: Address) -> Amount {
        self.venue.quote_token.balance_of(owner).await.unwrap()
    }

    async fn susd(&self, owner: Address) -> Amount {
        self.venue.margin_token.balance_of(owner).await.unwrap()
    }

    async fn remaining_margin(&self) -> Amount {
        self.venue
            .futures
            .remaining_margin(self.account())
            .await
            .unwrap()
    }

    /// Executed plus pending futures size on the strategy account.
    async fn hedged_size(&self) -> Size {
        let executed = self.venue.futures.position(self.account()).await.unwrap().size;
        let pending = self
            .venue
            .futures
            .delayed_order(self.account())
            .await
            .unwrap()
            .map(|order| order.size_delta)
            .unwrap_or(Size::ZERO);
        executed + pending
    }

    /// Sum of the hedge sizes the registry reports.
    fn recorded_size(&self) -> Size {
        self.manager
            .positions()
            .iter()
            .fold(Size::ZERO, |acc, p| acc + p.futures_delta)
    }
}

#[tokio::test]
async fn test_open_buys_call_and_submits_hedge() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;

    let receipt = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();

    // Premium 56.8 * 3 plus 1% fee.
    assert_eq!(receipt.premium.total_cost, Amount::new(dec!(172.104)));
    assert_eq!(h.usdc(alice()).await, Amount::new(dec!(9827.896)));
    assert_eq!(h.usdc(h.account()).await, Amount::ZERO);

    // Both legs are held by the strategy account.
    let options = h
        .venue
        .option_token
        .owner_positions(h.account())
        .await
        .unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].position_id, receipt.option_position_id);
    assert_eq!(options[0].amount, Amount::new(dec!(3)));

    // fill = 1850 * (1 + 0.44 / 2e6)
    let leg = h
        .manager
        .position_synthetix(receipt.option_position_id)
        .unwrap();
    assert_eq!(leg.delta, Size::new(dec!(0.44)));
    assert_eq!(leg.price, Price::new(dec!(1850.000407)));

    // (1850.000407 + 0.325600071632 + 37.00000814) * 2
    assert_eq!(
        receipt.margin_deposited,
        Amount::new(dec!(3774.652030423264))
    );
    let order = h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .unwrap();
    assert!(order.is_offchain);
    assert_eq!(order.size_delta, Size::new(dec!(0.44)));
    assert_eq!(order.desired_fill_price, leg.price);

    // Keeper deposit of 2 is held back from margin.
    let margin = h.manager.margin_of(alice()).await.unwrap();
    assert_eq!(margin, Amount::new(dec!(3772.652030423264)));
    assert_eq!(margin, h.remaining_margin().await);

    assert_eq!(h.manager.total_position(), 1);
    assert_eq!(h.manager.position_index(1), receipt.option_position_id);
    assert_eq!(h.manager.position_index(2), OptionPositionId::NONE);
    assert_eq!(h.manager.owner_of(receipt.option_position_id), Some(alice()));
}

#[tokio::test]
async fn test_invalid_strikes_rejected() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::ONE).await;

    for strike in [StrikeId::NONE, StrikeId::new(9999), StrikeId::new(1)] {
        let err = h
            .manager
            .open(alice(), strike, Amount::ONE)
            .await
            .unwrap_err();
        assert_eq!(err, HedgeError::InvalidStrikeId, "strike {strike}");
    }

    h.chain.freeze_board(BoardId::new(20), true).unwrap();
    let err = h
        .manager
        .open(alice(), STRIKE, Amount::ONE)
        .await
        .unwrap_err();
    assert_eq!(err, HedgeError::InvalidStrikeId);
    assert_eq!(h.manager.total_position(), 0);
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::ONE).await;
    for amount in [Amount::ZERO, Amount::new(dec!(-1))] {
        let err = h
            .manager
            .open(alice(), STRIKE, amount)
            .await
            .unwrap_err();
        assert_eq!(err, HedgeError::InvalidAmount, "amount {amount}");
    }
    assert_eq!(h.usdc(alice()).await, Amount::new(dec!(10000)));
    assert_eq!(h.manager.total_position(), 0);
}

#[tokio::test]
async fn test_short_premium_allowance_rejected() {
    let mut h = Harness::new();
    h.approve_premium(alice(), Amount::new(dec!(172.103))).await;
    h.approve_margin(alice(), Amount::new(dec!(5000))).await;

    let err = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap_err();
    assert_eq!(err, HedgeError::NoApprovedLiquidity);
    assert_eq!(h.usdc(alice()).await, Amount::new(dec!(10000)));
}

#[tokio::test]
async fn test_failed_margin_pull_reverts_everything() {
    let mut h = Harness::new();
    h.approve_premium(alice(), Amount::new(dec!(200))).await;
    h.approve_margin(alice(), Amount::new(dec!(100))).await;

    let err = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, HedgeError::Venue(_)));

    // The option purchase and premium pull happened first and are undone.
    assert_eq!(h.usdc(alice()).await, Amount::new(dec!(10000)));
    assert_eq!(h.susd(alice()).await, Amount::new(dec!(100000)));
    let options = h
        .venue
        .option_token
        .owner_positions(h.account())
        .await
        .unwrap();
    assert!(options.is_empty());
    assert!(h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .is_none());
    assert_eq!(h.manager.total_position(), 0);
    assert_eq!(h.manager.margin_of(alice()).await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn test_rehedge_tops_up_margin_and_replaces_order() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;
    let opened = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();

    h.chain.increase_time(84_600);
    h.chain.mine();
    h.chain
        .set_oracle_quote(STRIKE, dec!(0.5), Price::new(dec!(60)), Price::new(dec!(100)));

    let hedge = h.manager.quote_hedge(STRIKE).await.unwrap();
    let margin = h.manager.margin_of(alice()).await.unwrap();
    let shortfall = rehedge_margin_shortfall(margin, hedge.margin.required);
    assert!(shortfall.is_positive());
    h.approve_margin(alice(), shortfall).await;

    let receipt = h.manager.re_hedge(opened.option_position_id).await.unwrap();
    assert_eq!(receipt.index, opened.index);
    assert_eq!(receipt.margin_deposited, shortfall);

    let leg = h
        .manager
        .position_synthetix(opened.option_position_id)
        .unwrap();
    assert_eq!(leg.delta, Size::new(dec!(0.5)));
    assert_eq!(leg.price, Price::new(dec!(1850.0004625)));

    // The opening order was cancelled, so only one deposit is held.
    let order = h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.size_delta, Size::new(dec!(0.5)));
    assert_eq!(
        h.manager.margin_of(alice()).await.unwrap(),
        hedge.margin.required
    );

    let position = h.manager.position(opened.index).unwrap();
    assert_eq!(position.hedge_count, 2);
    assert_eq!(position.amount, Amount::new(dec!(3)));
    assert_eq!(h.manager.total_position(), 1);
}

#[tokio::test]
async fn test_rehedge_without_margin_approval_reverts() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;
    let opened = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();
    h.chain
        .set_oracle_quote(STRIKE, dec!(0.5), Price::new(dec!(60)), Price::new(dec!(100)));
    let margin_before = h.manager.margin_of(alice()).await.unwrap();

    let err = h
        .manager
        .re_hedge(opened.option_position_id)
        .await
        .unwrap_err();
    assert!(matches!(err, HedgeError::Venue(_)));

    let leg = h
        .manager
        .position_synthetix(opened.option_position_id)
        .unwrap();
    assert_eq!(leg.delta, Size::new(dec!(0.44)));
    let order = h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.size_delta, Size::new(dec!(0.44)));
    assert_eq!(h.manager.margin_of(alice()).await.unwrap(), margin_before);
}

#[tokio::test]
async fn test_rehedge_unknown_position() {
    let mut h = Harness::new();
    for id in [OptionPositionId::NONE, OptionPositionId::new(9999)] {
        assert_eq!(
            h.manager.re_hedge(id).await.unwrap_err(),
            HedgeError::InvalidPosition
        );
    }
}

#[tokio::test]
async fn test_rehedge_after_keeper_execution() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;
    let opened = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();

    assert_eq!(h.chain.execute_pending_orders(keeper()).await.unwrap(), 1);
    assert_eq!(h.susd(keeper()).await, Amount::new(dec!(2)));
    let position = h.venue.futures.position(h.account()).await.unwrap();
    assert_eq!(position.size, Size::new(dec!(0.44)));

    // No pending order left to cancel; the new order is submitted directly.
    h.approve_margin(alice(), Amount::new(dec!(5000))).await;
    h.manager.re_hedge(opened.option_position_id).await.unwrap();
    let order = h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.size_delta, Size::new(dec!(0.44)));
    assert_eq!(
        h.manager.margin_of(alice()).await.unwrap(),
        h.remaining_margin().await
    );
}

#[tokio::test]
async fn test_two_owners_share_one_account() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;
    let first = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();
    h.approve_open(bob(), Amount::ONE).await;
    let second = h
        .manager
        .open(bob(), STRIKE, Amount::ONE)
        .await
        .unwrap();

    assert_eq!(second.index.get(), 2);
    assert_eq!(h.manager.owner_of(first.option_position_id), Some(alice()));
    assert_eq!(h.manager.owner_of(second.option_position_id), Some(bob()));
    assert_eq!(h.manager.positions().len(), 2);

    // Bob's open replaced Alice's pending order with one carrying both
    // hedges; her keeper deposit came back to her.
    let order = h
        .venue
        .futures
        .delayed_order(h.account())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.size_delta, Size::new(dec!(0.88)));
    assert_eq!(second.order.size_delta, Size::new(dec!(0.88)));
    assert_eq!(h.hedged_size().await, h.recorded_size());

    let alice_margin = h.manager.margin_of(alice()).await.unwrap();
    let bob_margin = h.manager.margin_of(bob()).await.unwrap();
    let tolerance = dec!(0.000000000001);
    assert!((alice_margin.inner() - first.margin_deposited.inner()).abs() < tolerance);
    assert!(
        (bob_margin.inner() - (second.margin_deposited.inner() - dec!(2))).abs() < tolerance
    );
    assert!(
        ((alice_margin + bob_margin).inner() - h.remaining_margin().await.inner()).abs()
            < tolerance
    );
}

#[tokio::test]
async fn test_defer_to_market_surfaces_pending_order_revert() {
    let strategy = StrategyConfig {
        supersession: SupersessionPolicy::DeferToMarket,
        ..StrategyConfig::default()
    };
    let mut h = Harness::with(SimConfig::default(), strategy);
    h.approve_open(alice(), Amount::ONE).await;
    h.manager.open(alice(), STRIKE, Amount::ONE).await.unwrap();
    let usdc_after_first = h.usdc(alice()).await;

    h.approve_open(alice(), Amount::ONE).await;
    let err = h
        .manager
        .open(alice(), STRIKE, Amount::ONE)
        .await
        .unwrap_err();
    assert_eq!(err.revert_reason(), "previous order exists");
    assert_eq!(h.usdc(alice()).await, usdc_after_first);
    assert_eq!(h.manager.total_position(), 1);
}

#[tokio::test]
async fn test_defer_to_market_with_auto_cancelling_market() {
    let mut sim = SimConfig::default();
    sim.perps.auto_cancel_previous = true;
    let strategy = StrategyConfig {
        supersession: SupersessionPolicy::DeferToMarket,
        ..StrategyConfig::default()
    };
    let mut h = Harness::with(sim, strategy);
    h.approve_open(alice(), Amount::ONE).await;
    h.manager.open(alice(), STRIKE, Amount::ONE).await.unwrap();
    h.approve_open(alice(), Amount::ONE).await;
    h.manager.open(alice(), STRIKE, Amount::ONE).await.unwrap();

    assert_eq!(h.manager.total_position(), 2);
    assert_eq!(
        h.manager.margin_of(alice()).await.unwrap(),
        h.remaining_margin().await
    );
}

#[tokio::test]
async fn test_account_hedge_covers_every_position() {
    let mut h = Harness::new();
    h.approve_open(alice(), Amount::new(dec!(3))).await;
    let first = h
        .manager
        .open(alice(), STRIKE, Amount::new(dec!(3)))
        .await
        .unwrap();
    h.approve_open(bob(), Amount::ONE).await;
    h.manager.open(bob(), STRIKE, Amount::ONE).await.unwrap();
    assert_eq!(h.recorded_size(), Size::new(dec!(0.88)));
    assert_eq!(h.hedged_size().await, h.recorded_size());

    // Rehedging Alice replaces only her share of the pending order.
    h.chain
        .set_oracle_quote(STRIKE, dec!(0.5), Price::new(dec!(60)), Price::new(dec!(100)));
    h.approve_margin(alice(), Amount::new(dec!(5000))).await;
    h.manager.re_hedge(first.option_position_id).await.unwrap();
    assert_eq!(h.recorded_size(), Size::new(dec!(0.94)));
    assert_eq!(h.hedged_size().await, h.recorded_size());

    // Once executed, the whole size sits in the position.
    assert_eq!(h.chain.execute_pending_orders(keeper()).await.unwrap(), 1);
    let position = h.venue.futures.position(h.account()).await.unwrap();
    assert_eq!(position.size, Size::new(dec!(0.94)));
    assert_eq!(h.hedged_size().await, h.recorded_size());

    let total = h.manager.margin_of(alice()).await.unwrap()
        + h.manager.margin_of(bob()).await.unwrap();
    assert!((total.inner() - h.remaining_margin().await.inner()).abs() < dec!(0.000000000001));
}
