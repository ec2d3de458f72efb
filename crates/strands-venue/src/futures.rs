//! Perpetual-futures market seam.

use strands_core::{Address, Amount, DelayedOrder, FuturesOrderType, FuturesPosition, Price, Size};

use crate::{BoxFuture, VenueResult};

/// Perpetual-futures market with delayed (keeper-executed) orders.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait FuturesMarket: Send + Sync {
    /// Market key (e.g. "sETHPERP").
    fn market_key(&self) -> String;

    /// Base asset key (e.g. "sETH").
    fn base_asset(&self) -> String;

    /// Sum of absolute open position sizes.
    fn market_size(&self) -> BoxFuture<VenueResult<Size>>;

    /// Net long minus short open interest.
    fn market_skew(&self) -> BoxFuture<VenueResult<Size>>;

    /// Current oracle price of the base asset.
    fn asset_price(&self) -> BoxFuture<VenueResult<Price>>;

    /// Price an order of `size_delta` would fill at, including skew premium.
    fn fill_price(&self, size_delta: Size) -> BoxFuture<VenueResult<Price>>;

    /// Fee an order of `size_delta` and `order_type` would pay.
    fn order_fee(
        &self,
        size_delta: Size,
        order_type: FuturesOrderType,
    ) -> BoxFuture<VenueResult<Amount>>;

    /// Move margin between `account`'s token balance and its futures margin.
    /// Positive deposits, negative withdraws.
    fn transfer_margin(&self, account: Address, margin_delta: Amount) -> BoxFuture<VenueResult<()>>;

    /// Submit an off-chain delayed order for `account`.
    fn submit_offchain_delayed_order(
        &self,
        account: Address,
        size_delta: Size,
        desired_fill_price: Price,
    ) -> BoxFuture<VenueResult<DelayedOrder>>;

    /// Cancel `account`'s pending off-chain order, refunding the keeper deposit.
    fn cancel_offchain_delayed_order(&self, account: Address) -> BoxFuture<VenueResult<()>>;

    /// Keeper execution of `account`'s pending order at `price`.
    fn execute_offchain_delayed_order(
        &self,
        keeper: Address,
        account: Address,
        price: Price,
    ) -> BoxFuture<VenueResult<()>>;

    /// `account`'s pending delayed order, if any.
    fn delayed_order(&self, account: Address) -> BoxFuture<VenueResult<Option<DelayedOrder>>>;

    /// Margin plus unrealized PnL of `account`.
    fn remaining_margin(&self, account: Address) -> BoxFuture<VenueResult<Amount>>;

    /// Futures position of `account`.
    fn position(&self, account: Address) -> BoxFuture<VenueResult<FuturesPosition>>;
}
