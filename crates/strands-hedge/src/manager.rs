//! Hedged-position manager.
//!
//! Opens long calls on the options market and hedges each one with an
//! off-chain delayed order on the perps market, sized by the option's GWAV
//! delta. Both legs are held by the strategy account; owners are tracked
//! internally through the position registry and the margin ledger.
//!
//! Every state-changing operation runs between a journal checkpoint and a
//! commit. Any failure reverts the journal and leaves the registry and
//! ledger untouched, so a call either fully happens or not at all.

use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use strands_core::{
    Address, Amount, DelayedOrder, OptionPositionId, PositionIndex, PremiumQuote, Price, Size,
    StrikeId,
};
use strands_telemetry::Metrics;
use strands_venue::{Checkpoint, Venue};
use tracing::{debug, error, info, warn};

use crate::config::{StrategyConfig, SupersessionPolicy};
use crate::error::{HedgeError, HedgeResult};
use crate::ledger::MarginLedger;
use crate::margin::{MarginPolicy, MarginQuote};
use crate::registry::{HedgedPosition, NewPosition, PositionRegistry, SynthetixLeg};

/// Hedge order parameters for one strike at the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgeQuote {
    pub strike_id: StrikeId,
    pub futures_delta: Size,
    pub margin: MarginQuote,
}

impl HedgeQuote {
    pub fn desired_fill_price(&self) -> Price {
        self.margin.fill_price
    }
}

/// Outcome of a successful open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenReceipt {
    pub index: PositionIndex,
    pub option_position_id: OptionPositionId,
    pub premium: PremiumQuote,
    pub hedge: HedgeQuote,
    /// Margin pulled from the owner into the futures account.
    pub margin_deposited: Amount,
    pub order: DelayedOrder,
}

/// Outcome of a successful rehedge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehedgeReceipt {
    pub index: PositionIndex,
    pub option_position_id: OptionPositionId,
    pub hedge: HedgeQuote,
    /// Shortfall pulled from the owner; zero when margin already covered it.
    pub margin_deposited: Amount,
    pub order: DelayedOrder,
}

/// Margin movements of one operation, attributed to owners on commit.
#[derive(Debug, Default)]
struct Attribution {
    entries: Vec<(Address, Amount)>,
}

impl Attribution {
    fn push(&mut self, owner: Address, delta: Amount) {
        if !delta.is_zero() {
            self.entries.push((owner, delta));
        }
    }

    fn sum(&self) -> Amount {
        self.entries.iter().fold(Amount::ZERO, |acc, (_, d)| acc + *d)
    }
}

/// Result of the collaborator calls of one operation, before bookkeeping.
struct Executed<T> {
    value: T,
    attribution: Attribution,
    /// Other positions' hedges folded into the submitted order.
    carried: Vec<(PositionIndex, Size)>,
}

/// Outcome of replacing the account's pending order.
#[derive(Debug, Default)]
struct Superseded {
    /// Margin returned by the cancellation, attributed to its payer.
    refund: Amount,
    /// Un-executed hedges of other positions the replacement must carry.
    carried: Vec<(PositionIndex, Size)>,
}

impl Superseded {
    fn carried_size(&self) -> Size {
        self.carried.iter().fold(Size::ZERO, |acc, (_, size)| acc + *size)
    }
}

pub struct HedgeManager {
    venue: Venue,
    config: StrategyConfig,
    policy: MarginPolicy,
    registry: PositionRegistry,
    ledger: MarginLedger,
    /// Owner charged for the order currently pending on the futures account.
    pending_owner: Option<Address>,
    /// Hedge legs making up the pending order.
    pending_hedges: Vec<(PositionIndex, Size)>,
}

impl HedgeManager {
    pub fn new(venue: Venue, config: StrategyConfig) -> Self {
        let policy = MarginPolicy::from(&config);
        info!(
            account = %config.account,
            order_type = %config.order_type,
            keeper_fee_pct = %config.keeper_fee_pct,
            margin_multiplier = %config.margin_multiplier,
            supersession = ?config.supersession,
            "HedgeManager created"
        );
        Self {
            venue,
            config,
            policy,
            registry: PositionRegistry::new(),
            ledger: MarginLedger::new(),
            pending_owner: None,
            pending_hedges: Vec::new(),
        }
    }

    /// Strategy account holding both legs.
    pub fn account(&self) -> Address {
        self.config.account
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn policy(&self) -> &MarginPolicy {
        &self.policy
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }

    // === Operations ===

    /// Buy `amount` long calls at `strike_id` for `caller` and hedge them.
    ///
    /// The premium and the margin are pulled from `caller`'s allowances to
    /// the strategy account.
    pub async fn open(
        &mut self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
    ) -> HedgeResult<OpenReceipt> {
        let started = Instant::now();
        let result = self.try_open(caller, strike_id, amount).await;
        Metrics::operation_duration("open", started.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Ok(receipt) => {
                Metrics::position_opened(&strike_id.get().to_string());
                Metrics::positions_tracked(self.registry.len());
                Metrics::margin_deposited(receipt.margin_deposited.inner().to_f64().unwrap_or(0.0));
                Metrics::hedge_delta(
                    &receipt.option_position_id.get().to_string(),
                    receipt.hedge.futures_delta.inner().to_f64().unwrap_or(0.0),
                );
                info!(
                    %caller,
                    %strike_id,
                    %amount,
                    index = %receipt.index,
                    option_position_id = %receipt.option_position_id,
                    futures_delta = %receipt.hedge.futures_delta,
                    desired_fill_price = %receipt.hedge.desired_fill_price(),
                    margin = %receipt.margin_deposited,
                    "Hedged call opened"
                );
            }
            Err(err) => Self::log_rejection("open", err),
        }
        result
    }

    /// Alias of [`open`](Self::open) under the strategy contract's name.
    pub async fn buy_hedged_call(
        &mut self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
    ) -> HedgeResult<OpenReceipt> {
        self.open(caller, strike_id, amount).await
    }

    /// Resize the hedge of an existing position to the strike's current
    /// delta, topping up margin from the owner if needed.
    pub async fn re_hedge(
        &mut self,
        option_position_id: OptionPositionId,
    ) -> HedgeResult<RehedgeReceipt> {
        let started = Instant::now();
        let result = self.try_re_hedge(option_position_id).await;
        Metrics::operation_duration("rehedge", started.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Ok(receipt) => {
                if let Some(position) = self.registry.get(receipt.index) {
                    Metrics::rehedged(&position.strike_id.get().to_string());
                }
                Metrics::margin_deposited(receipt.margin_deposited.inner().to_f64().unwrap_or(0.0));
                Metrics::hedge_delta(
                    &option_position_id.get().to_string(),
                    receipt.hedge.futures_delta.inner().to_f64().unwrap_or(0.0),
                );
                info!(
                    %option_position_id,
                    index = %receipt.index,
                    futures_delta = %receipt.hedge.futures_delta,
                    desired_fill_price = %receipt.hedge.desired_fill_price(),
                    shortfall = %receipt.margin_deposited,
                    "Position rehedged"
                );
            }
            Err(err) => Self::log_rejection("rehedge", err),
        }
        result
    }

    // === Reads ===

    /// Margin attributed to `owner`.
    pub async fn margin_of(&self, owner: Address) -> HedgeResult<Amount> {
        let remaining = self
            .venue
            .futures
            .remaining_margin(self.config.account)
            .await?;
        Ok(self.ledger.share_of(&owner, remaining))
    }

    /// Futures leg recorded for an option position.
    pub fn position_synthetix(
        &self,
        option_position_id: OptionPositionId,
    ) -> HedgeResult<SynthetixLeg> {
        self.registry
            .by_option_id(option_position_id)
            .map(HedgedPosition::synthetix_leg)
            .ok_or(HedgeError::InvalidPosition)
    }

    /// Option position opened at creation sequence `sequence` (1-based);
    /// the none id when out of range.
    pub fn position_index(&self, sequence: u64) -> OptionPositionId {
        self.registry
            .get(PositionIndex::new(sequence))
            .map(|p| p.option_position_id)
            .unwrap_or(OptionPositionId::NONE)
    }

    /// Number of positions ever opened.
    pub fn total_position(&self) -> u64 {
        self.registry.len() as u64
    }

    pub fn position(&self, index: PositionIndex) -> Option<&HedgedPosition> {
        self.registry.get(index)
    }

    pub fn positions(&self) -> Vec<HedgedPosition> {
        self.registry.iter().cloned().collect()
    }

    pub fn owner_of(&self, option_position_id: OptionPositionId) -> Option<Address> {
        self.registry
            .by_option_id(option_position_id)
            .map(|p| p.owner)
    }

    /// Hedge parameters `strike_id` would get right now.
    pub async fn quote_hedge(&self, strike_id: StrikeId) -> HedgeResult<HedgeQuote> {
        let venue = &self.venue;
        let delta = venue
            .oracle
            .delta_gwav(strike_id, self.config.seconds_ago)
            .await?;
        let futures_delta = Size::new(delta);
        let fill_price = venue.futures.fill_price(futures_delta).await?;
        let order_fee = venue
            .futures
            .order_fee(futures_delta, self.config.order_type)
            .await?;
        let margin = self.policy.quote(fill_price, order_fee);
        debug!(
            %strike_id,
            %futures_delta,
            %fill_price,
            %order_fee,
            required = %margin.required,
            "Hedge quoted"
        );
        Ok(HedgeQuote {
            strike_id,
            futures_delta,
            margin,
        })
    }

    // === Internals ===

    async fn try_open(
        &mut self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
    ) -> HedgeResult<OpenReceipt> {
        if strike_id.is_none() {
            return Err(HedgeError::InvalidStrikeId);
        }
        if !amount.is_positive() {
            return Err(HedgeError::InvalidAmount);
        }
        self.ensure_live_strike(strike_id).await?;

        let premium = self
            .venue
            .option_market
            .quote_buy_call(strike_id, amount)
            .await?;
        let allowance = self
            .venue
            .quote_token
            .allowance(caller, self.config.account)
            .await?;
        if allowance < premium.total_cost {
            debug!(%caller, %allowance, required = %premium.total_cost, "Premium allowance short");
            return Err(HedgeError::NoApprovedLiquidity);
        }

        let checkpoint = self.venue.journal.checkpoint();
        let executed = self
            .execute_open(caller, strike_id, amount, premium)
            .await;
        let executed = self.settle(checkpoint, executed)?;

        let (option_position_id, hedge, margin_deposited, order) = executed.value;
        let index = self.registry.insert(NewPosition {
            option_position_id,
            strike_id,
            amount,
            futures_delta: hedge.futures_delta,
            desired_fill_price: hedge.desired_fill_price(),
            owner: caller,
            timestamp: order.intention_time,
        });
        self.apply_attribution(executed.attribution);
        self.record_pending(caller, executed.carried, index, hedge.futures_delta);

        Ok(OpenReceipt {
            index,
            option_position_id,
            premium,
            hedge,
            margin_deposited,
            order,
        })
    }

    async fn execute_open(
        &self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
        premium: PremiumQuote,
    ) -> HedgeResult<Executed<(OptionPositionId, HedgeQuote, Amount, DelayedOrder)>> {
        let venue = &self.venue;
        let account = self.config.account;

        venue
            .quote_token
            .transfer_from(account, caller, account, premium.total_cost)
            .await?;
        venue
            .quote_token
            .approve(account, venue.premium_spender(), premium.total_cost)
            .await?;
        let opened = venue
            .option_market
            .open_long_call(account, strike_id, amount, premium.total_cost)
            .await?;

        let hedge = self.quote_hedge(strike_id).await?;
        let margin = hedge
            .margin
            .required
            .round_to_decimals(venue.margin_token.decimals());

        let mut attribution = Attribution::default();
        let before = venue.futures.remaining_margin(account).await?;
        self.deposit_margin(caller, margin).await?;
        let superseded = self.supersede(None, &mut attribution).await?;
        let order = self.submit_hedge(&hedge, &superseded).await?;
        let after = venue.futures.remaining_margin(account).await?;
        attribution.push(caller, after - before - superseded.refund);

        Ok(Executed {
            value: (opened.position_id, hedge, margin, order),
            attribution,
            carried: superseded.carried,
        })
    }

    async fn try_re_hedge(
        &mut self,
        option_position_id: OptionPositionId,
    ) -> HedgeResult<RehedgeReceipt> {
        let (index, strike_id, owner) = self
            .registry
            .by_option_id(option_position_id)
            .map(|p| (p.index, p.strike_id, p.owner))
            .ok_or(HedgeError::InvalidPosition)?;

        let checkpoint = self.venue.journal.checkpoint();
        let executed = self.execute_re_hedge(index, strike_id, owner).await;
        let executed = self.settle(checkpoint, executed)?;

        let (hedge, margin_deposited, order) = executed.value;
        self.registry.update_hedge(
            index,
            hedge.futures_delta,
            hedge.desired_fill_price(),
            order.intention_time,
        );
        self.apply_attribution(executed.attribution);
        self.record_pending(owner, executed.carried, index, hedge.futures_delta);

        Ok(RehedgeReceipt {
            index,
            option_position_id,
            hedge,
            margin_deposited,
            order,
        })
    }

    async fn execute_re_hedge(
        &self,
        index: PositionIndex,
        strike_id: StrikeId,
        owner: Address,
    ) -> HedgeResult<Executed<(HedgeQuote, Amount, DelayedOrder)>> {
        let venue = &self.venue;
        let account = self.config.account;

        let hedge = self.quote_hedge(strike_id).await?;
        let before = venue.futures.remaining_margin(account).await?;
        let current = self.ledger.share_of(&owner, before);
        let shortfall = crate::margin::rehedge_margin_shortfall(current, hedge.margin.required)
            .round_to_decimals(venue.margin_token.decimals());

        let mut attribution = Attribution::default();
        if shortfall.is_positive() {
            debug!(%owner, %current, required = %hedge.margin.required, %shortfall, "Topping up margin");
            self.deposit_margin(owner, shortfall).await?;
        }
        let superseded = self.supersede(Some(index), &mut attribution).await?;
        let order = self.submit_hedge(&hedge, &superseded).await?;
        let after = venue.futures.remaining_margin(account).await?;
        attribution.push(owner, after - before - superseded.refund);

        Ok(Executed {
            value: (hedge, shortfall, order),
            attribution,
            carried: superseded.carried,
        })
    }

    async fn ensure_live_strike(&self, strike_id: StrikeId) -> HedgeResult<()> {
        let market = &self.venue.option_market;
        let strike = market
            .strike(strike_id)
            .await?
            .ok_or(HedgeError::InvalidStrikeId)?;
        let board = market
            .board(strike.board_id)
            .await?
            .ok_or(HedgeError::InvalidStrikeId)?;
        let now = self.venue.journal.block_timestamp();
        if !board.is_tradeable(now) {
            debug!(%strike_id, board = %board.id, frozen = board.frozen, expiry = board.expiry, now, "Strike not live");
            return Err(HedgeError::InvalidStrikeId);
        }
        Ok(())
    }

    /// Pull `amount` of margin token from `owner` and post it as margin.
    async fn deposit_margin(&self, owner: Address, amount: Amount) -> HedgeResult<()> {
        let account = self.config.account;
        self.venue
            .margin_token
            .transfer_from(account, owner, account, amount)
            .await?;
        self.venue.futures.transfer_margin(account, amount).await?;
        Ok(())
    }

    /// Apply the supersession policy to a still-pending order.
    ///
    /// The pending order may carry hedges of positions other than
    /// `replacing`; those are returned so the replacement order keeps them.
    /// A cancellation refund is attributed to the owner who paid for the
    /// cancelled order.
    async fn supersede(
        &self,
        replacing: Option<PositionIndex>,
        attribution: &mut Attribution,
    ) -> HedgeResult<Superseded> {
        let account = self.config.account;
        let futures = &self.venue.futures;
        if futures.delayed_order(account).await?.is_none() {
            // Executed by a keeper; nothing left to carry.
            return Ok(Superseded::default());
        }
        let carried: Vec<(PositionIndex, Size)> = self
            .pending_hedges
            .iter()
            .filter(|(index, _)| Some(*index) != replacing)
            .copied()
            .collect();
        if self.config.supersession == SupersessionPolicy::DeferToMarket {
            return Ok(Superseded {
                refund: Amount::ZERO,
                carried,
            });
        }

        let before = futures.remaining_margin(account).await?;
        futures.cancel_offchain_delayed_order(account).await?;
        let after = futures.remaining_margin(account).await?;
        let refund = after - before;
        match self.pending_owner {
            Some(owner) => {
                debug!(%owner, %refund, carried = carried.len(), "Pending hedge order cancelled");
                attribution.push(owner, refund);
                Ok(Superseded { refund, carried })
            }
            // Not ours to attribute; the current caller keeps it.
            None => Ok(Superseded {
                refund: Amount::ZERO,
                carried,
            }),
        }
    }

    /// Submit `hedge`, enlarged by any carried hedges.
    async fn submit_hedge(
        &self,
        hedge: &HedgeQuote,
        superseded: &Superseded,
    ) -> HedgeResult<DelayedOrder> {
        let futures = &self.venue.futures;
        let carried = superseded.carried_size();
        let (size_delta, desired_fill_price) = if carried.is_zero() {
            (hedge.futures_delta, hedge.desired_fill_price())
        } else {
            let size_delta = hedge.futures_delta + carried;
            (size_delta, futures.fill_price(size_delta).await?)
        };
        let order = futures
            .submit_offchain_delayed_order(self.config.account, size_delta, desired_fill_price)
            .await?;
        Ok(order)
    }

    fn record_pending(
        &mut self,
        payer: Address,
        carried: Vec<(PositionIndex, Size)>,
        index: PositionIndex,
        futures_delta: Size,
    ) {
        self.pending_owner = Some(payer);
        self.pending_hedges = carried;
        self.pending_hedges.push((index, futures_delta));
    }

    /// Commit on success, revert on failure.
    fn settle<T>(
        &self,
        checkpoint: Checkpoint,
        executed: HedgeResult<Executed<T>>,
    ) -> HedgeResult<Executed<T>> {
        let journal = &self.venue.journal;
        match executed {
            Ok(executed) => {
                journal.commit(checkpoint)?;
                Ok(executed)
            }
            Err(err) => {
                if let Err(revert_err) = journal.revert(checkpoint) {
                    error!(error = %revert_err, "Journal revert failed");
                }
                Err(err)
            }
        }
    }

    fn apply_attribution(&mut self, attribution: Attribution) {
        debug!(net = %attribution.sum(), entries = attribution.entries.len(), "Margin attributed");
        for (owner, delta) in attribution.entries {
            self.ledger.attribute(owner, delta);
        }
    }

    fn log_rejection(operation: &'static str, err: &HedgeError) {
        Metrics::rejected(operation, err.kind());
        if err.is_validation() {
            warn!(operation, reason = %err.revert_reason(), "Rejected");
        } else {
            error!(
                operation,
                error = %err,
                revert_data = %err.revert_data_hex(),
                "Reverted"
            );
        }
    }
}
