//! Simulated perpetual-futures market with off-chain delayed orders.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strands_core::{
    Address, Amount, DelayedOrder, FuturesOrderType, FuturesPosition, Price, Size,
};
use strands_venue::{BoxFuture, FuturesMarket, VenueError, VenueResult};
use tracing::debug;

use crate::chain::{ready, ChainState};
use crate::config::PerpsConfig;

const CONTRACT: &str = "PerpsV2Market";

/// Market parameters, positions and pending orders.
#[derive(Debug, Clone)]
pub struct PerpsState {
    pub address: Address,
    pub params: PerpsConfig,
    pub price: Price,
    positions: HashMap<Address, FuturesPosition>,
    pending: HashMap<Address, DelayedOrder>,
}

impl PerpsState {
    pub fn new(address: Address, params: PerpsConfig) -> Self {
        Self {
            address,
            price: Price::new(params.price),
            params,
            positions: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn skew(&self) -> Size {
        let open: Decimal = self.positions.values().map(|p| p.size.inner()).sum();
        Size::new(self.params.base_skew + open)
    }

    pub fn size(&self) -> Size {
        let open: Decimal = self.positions.values().map(|p| p.size.inner().abs()).sum();
        Size::new(self.params.base_skew.abs() + open)
    }

    /// Oracle price adjusted for the skew premium before and after the
    /// order, averaged.
    pub fn fill_price(&self, size_delta: Size) -> Price {
        let skew = self.skew().inner();
        let premium = (dec!(2) * skew + size_delta.inner()) / (dec!(2) * self.params.skew_scale);
        Price::new(self.price.inner() * (Decimal::ONE + premium))
    }

    pub fn fee_rate(&self, order_type: FuturesOrderType) -> Decimal {
        match order_type {
            FuturesOrderType::Atomic => self.params.taker_fee_atomic,
            FuturesOrderType::Delayed => self.params.taker_fee_delayed,
            FuturesOrderType::Offchain => self.params.taker_fee_offchain,
        }
    }

    pub fn order_fee(&self, size_delta: Size, order_type: FuturesOrderType) -> Amount {
        let fill = self.fill_price(size_delta);
        Amount::new(size_delta.notional(fill) * self.fee_rate(order_type))
    }

    pub fn position(&self, account: &Address) -> FuturesPosition {
        self.positions.get(account).copied().unwrap_or_default()
    }

    pub fn remaining_margin(&self, account: &Address) -> Amount {
        self.position(account).remaining_margin(self.price)
    }

    pub fn delayed_order(&self, account: &Address) -> Option<DelayedOrder> {
        self.pending.get(account).cloned()
    }

    /// Accounts with a pending delayed order.
    pub fn pending_accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self.pending.keys().copied().collect();
        accounts.sort();
        accounts
    }

    fn keeper_deposit(&self) -> Amount {
        Amount::new(self.params.min_keeper_fee)
    }

    /// Settle unrealized PnL into margin at the current price.
    fn mark(&mut self, account: Address) -> FuturesPosition {
        let price = self.price;
        let position = self.positions.entry(account).or_default();
        position.margin = position.remaining_margin(price);
        position.last_price = price;
        *position
    }

    fn cancel(&mut self, account: Address) -> VenueResult<DelayedOrder> {
        let order = self
            .pending
            .remove(&account)
            .ok_or_else(|| VenueError::reverted(CONTRACT, "no previous order"))?;
        let position = self.positions.entry(account).or_default();
        position.margin += order.keeper_deposit;
        Ok(order)
    }

    fn submit(
        &mut self,
        account: Address,
        size_delta: Size,
        desired_fill_price: Price,
        now: u64,
    ) -> VenueResult<DelayedOrder> {
        if size_delta.is_zero() {
            return Err(VenueError::reverted(CONTRACT, "cannot submit empty order"));
        }
        if self.pending.contains_key(&account) {
            if !self.params.auto_cancel_previous {
                return Err(VenueError::reverted(CONTRACT, "previous order exists"));
            }
            self.cancel(account)?;
        }
        let deposit = self.keeper_deposit();
        let position = self.mark(account);
        if position.margin < deposit {
            return Err(VenueError::reverted(CONTRACT, "insufficient margin"));
        }
        if let Some(p) = self.positions.get_mut(&account) {
            p.margin -= deposit;
        }
        let order = DelayedOrder::offchain(size_delta, desired_fill_price, deposit, now);
        self.pending.insert(account, order.clone());
        Ok(order)
    }

    /// Apply `account`'s pending order at `price`. Returns the keeper
    /// deposit owed to the keeper. Leaves the market untouched on error.
    fn execute(&mut self, account: Address, price: Price) -> VenueResult<Amount> {
        let order = self
            .pending
            .get(&account)
            .cloned()
            .ok_or_else(|| VenueError::reverted(CONTRACT, "no previous order"))?;
        let mut next = self.clone();
        next.price = price;
        let fee = next.order_fee(order.size_delta, FuturesOrderType::Offchain);
        let mut position = next.mark(account);
        if position.margin < fee {
            return Err(VenueError::reverted(CONTRACT, "insufficient margin"));
        }
        position.margin -= fee;
        position.size += order.size_delta;
        next.positions.insert(account, position);
        next.pending.remove(&account);
        *self = next;
        Ok(order.keeper_deposit)
    }
}

fn transfer_margin(state: &mut ChainState, account: Address, delta: Amount) -> VenueResult<()> {
    let margin_token = state.margin_token;
    let market = state.perps.address;
    if delta.is_negative() {
        let withdraw = Amount::ZERO - delta;
        let position = state.perps.mark(account);
        if position.margin < withdraw {
            return Err(VenueError::reverted(CONTRACT, "insufficient margin"));
        }
        state.token_mut(&margin_token)?.transfer(market, account, withdraw)?;
        if let Some(p) = state.perps.positions.get_mut(&account) {
            p.margin -= withdraw;
        }
    } else if delta.is_positive() {
        state.token_mut(&margin_token)?.transfer(account, market, delta)?;
        state.perps.mark(account);
        if let Some(p) = state.perps.positions.get_mut(&account) {
            p.margin += delta;
        }
    }
    debug!(%account, %delta, "Margin transferred");
    Ok(())
}

fn execute(
    state: &mut ChainState,
    keeper: Address,
    account: Address,
    price: Price,
) -> VenueResult<()> {
    let deposit = state.perps.execute(account, price)?;
    let margin_token = state.margin_token;
    let market = state.perps.address;
    state.token_mut(&margin_token)?.transfer(market, keeper, deposit)?;
    debug!(%account, %keeper, %price, "Delayed order executed");
    Ok(())
}

/// `FuturesMarket` handle over the simulated chain.
#[derive(Clone)]
pub struct SimFuturesMarket {
    state: Arc<Mutex<ChainState>>,
    market_key: String,
    base_asset: String,
}

impl SimFuturesMarket {
    pub(crate) fn new(state: Arc<Mutex<ChainState>>) -> Self {
        let (market_key, base_asset) = {
            let guard = state.lock();
            (
                guard.perps.params.market_key.clone(),
                guard.perps.params.base_asset.clone(),
            )
        };
        Self {
            state,
            market_key,
            base_asset,
        }
    }
}

impl FuturesMarket for SimFuturesMarket {
    fn market_key(&self) -> String {
        self.market_key.clone()
    }

    fn base_asset(&self) -> String {
        self.base_asset.clone()
    }

    fn market_size(&self) -> BoxFuture<VenueResult<Size>> {
        ready(Ok(self.state.lock().perps.size()))
    }

    fn market_skew(&self) -> BoxFuture<VenueResult<Size>> {
        ready(Ok(self.state.lock().perps.skew()))
    }

    fn asset_price(&self) -> BoxFuture<VenueResult<Price>> {
        ready(Ok(self.state.lock().perps.price))
    }

    fn fill_price(&self, size_delta: Size) -> BoxFuture<VenueResult<Price>> {
        ready(Ok(self.state.lock().perps.fill_price(size_delta)))
    }

    fn order_fee(
        &self,
        size_delta: Size,
        order_type: FuturesOrderType,
    ) -> BoxFuture<VenueResult<Amount>> {
        ready(Ok(self.state.lock().perps.order_fee(size_delta, order_type)))
    }

    fn transfer_margin(&self, account: Address, margin_delta: Amount) -> BoxFuture<VenueResult<()>> {
        let mut guard = self.state.lock();
        ready(transfer_margin(&mut guard, account, margin_delta))
    }

    fn submit_offchain_delayed_order(
        &self,
        account: Address,
        size_delta: Size,
        desired_fill_price: Price,
    ) -> BoxFuture<VenueResult<DelayedOrder>> {
        let mut guard = self.state.lock();
        let now = guard.timestamp;
        ready(guard.perps.submit(account, size_delta, desired_fill_price, now))
    }

    fn cancel_offchain_delayed_order(&self, account: Address) -> BoxFuture<VenueResult<()>> {
        let mut guard = self.state.lock();
        ready(guard.perps.cancel(account).map(|_| ()))
    }

    fn execute_offchain_delayed_order(
        &self,
        keeper: Address,
        account: Address,
        price: Price,
    ) -> BoxFuture<VenueResult<()>> {
        let mut guard = self.state.lock();
        ready(execute(&mut guard, keeper, account, price))
    }

    fn delayed_order(&self, account: Address) -> BoxFuture<VenueResult<Option<DelayedOrder>>> {
        ready(Ok(self.state.lock().perps.delayed_order(&account)))
    }

    fn remaining_margin(&self, account: Address) -> BoxFuture<VenueResult<Amount>> {
        ready(Ok(self.state.lock().perps.remaining_margin(&account)))
    }

    fn position(&self, account: Address) -> BoxFuture<VenueResult<FuturesPosition>> {
        ready(Ok(self.state.lock().perps.position(&account)))
    }
}
