//! Options-market and option-token seams.

use strands_core::{
    Address, Amount, BoardId, OpenResult, OptionBoard, OptionPosition, OptionPositionId,
    PremiumQuote, Strike, StrikeId,
};

use crate::{BoxFuture, VenueResult};

/// Options market: boards, strikes and option purchases.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait OptionMarket: Send + Sync {
    /// Address of the quote asset premiums are paid in.
    fn quote_asset(&self) -> Address;

    /// Address of the base asset the options are written on.
    fn base_asset(&self) -> Address;

    /// Address of the market itself (the spender premiums are approved to).
    fn address(&self) -> Address;

    /// Ids of boards that have not expired.
    fn live_boards(&self) -> BoxFuture<VenueResult<Vec<BoardId>>>;

    /// Board record, or `None` if the id was never issued.
    fn board(&self, board_id: BoardId) -> BoxFuture<VenueResult<Option<OptionBoard>>>;

    /// Strike ids listed on a board.
    fn board_strikes(&self, board_id: BoardId) -> BoxFuture<VenueResult<Vec<StrikeId>>>;

    /// Strike record, or `None` if the id was never issued.
    fn strike(&self, strike_id: StrikeId) -> BoxFuture<VenueResult<Option<Strike>>>;

    /// Premium and fee for buying `amount` calls at `strike_id`.
    fn quote_buy_call(
        &self,
        strike_id: StrikeId,
        amount: Amount,
    ) -> BoxFuture<VenueResult<PremiumQuote>>;

    /// Buy `amount` long calls for `caller`, charging at most `max_total_cost`
    /// of quote asset from `caller`'s balance.
    fn open_long_call(
        &self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
        max_total_cost: Amount,
    ) -> BoxFuture<VenueResult<OpenResult>>;
}

/// Option-token registry: who holds which option position.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait OptionToken: Send + Sync {
    /// All active positions held by `owner`.
    fn owner_positions(&self, owner: Address) -> BoxFuture<VenueResult<Vec<OptionPosition>>>;

    /// Position record by id.
    fn position_with_owner(
        &self,
        position_id: OptionPositionId,
    ) -> BoxFuture<VenueResult<Option<OptionPosition>>>;

    /// Number of position tokens held by `owner`.
    fn balance_of(&self, owner: Address) -> BoxFuture<VenueResult<u64>>;
}
