//! Simulated options market and option-token registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use strands_core::{
    Address, Amount, BoardId, OpenResult, OptionBoard, OptionPosition, OptionPositionId,
    OptionType, PositionState, PremiumQuote, Strike, StrikeId,
};
use strands_venue::{BoxFuture, OptionMarket, OptionToken, VenueError, VenueResult};
use tracing::debug;

use crate::chain::{ready, ChainState};

const MARKET: &str = "OptionMarket";
const TOKEN: &str = "OptionToken";

/// Boards, strikes and issued positions.
#[derive(Debug, Clone)]
pub struct OptionsState {
    pub fee_rate: Decimal,
    pub boards: BTreeMap<BoardId, OptionBoard>,
    pub strikes: BTreeMap<StrikeId, Strike>,
    pub positions: BTreeMap<OptionPositionId, OptionPosition>,
    next_position_id: u64,
}

impl OptionsState {
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            boards: BTreeMap::new(),
            strikes: BTreeMap::new(),
            positions: BTreeMap::new(),
            next_position_id: 1,
        }
    }

    pub fn add_board(&mut self, board: OptionBoard) {
        self.boards.insert(board.id, board);
    }

    pub fn add_strike(&mut self, strike: Strike) {
        if let Some(board) = self.boards.get_mut(&strike.board_id) {
            if !board.strike_ids.contains(&strike.id) {
                board.strike_ids.push(strike.id);
            }
        }
        self.strikes.insert(strike.id, strike);
    }

    /// Strike and board of a strike that can be traded at `now`.
    pub fn tradeable_strike(&self, strike_id: StrikeId, now: u64) -> VenueResult<(&Strike, &OptionBoard)> {
        let strike = self
            .strikes
            .get(&strike_id)
            .ok_or_else(|| VenueError::reverted(MARKET, format!("invalid {strike_id}")))?;
        let board = self
            .boards
            .get(&strike.board_id)
            .ok_or_else(|| VenueError::reverted(MARKET, format!("invalid {}", strike.board_id)))?;
        if board.frozen {
            return Err(VenueError::reverted(MARKET, format!("{} frozen", board.id)));
        }
        if board.is_expired(now) {
            return Err(VenueError::reverted(MARKET, format!("{} expired", board.id)));
        }
        Ok((strike, board))
    }

    fn issue(&mut self, owner: Address, strike_id: StrikeId, amount: Amount) -> OptionPositionId {
        let position_id = OptionPositionId::new(self.next_position_id);
        self.next_position_id += 1;
        self.positions.insert(
            position_id,
            OptionPosition {
                position_id,
                strike_id,
                option_type: OptionType::LongCall,
                amount,
                collateral: Amount::ZERO,
                state: PositionState::Active,
                owner,
            },
        );
        position_id
    }
}

fn quote(state: &ChainState, strike_id: StrikeId, amount: Amount) -> VenueResult<PremiumQuote> {
    state.options.tradeable_strike(strike_id, state.timestamp)?;
    let prices = state
        .oracle
        .quote_at(strike_id, state.timestamp, 0)?
        .prices;
    let decimals = state.token(&state.quote_token)?.decimals;
    let premium =
        Amount::new(prices.call_price.inner() * amount.inner()).round_to_decimals(decimals);
    let fee = (premium * state.options.fee_rate).round_to_decimals(decimals);
    Ok(PremiumQuote {
        premium,
        fee,
        total_cost: premium + fee,
    })
}

fn open_long_call(
    state: &mut ChainState,
    market: Address,
    caller: Address,
    strike_id: StrikeId,
    amount: Amount,
    max_total_cost: Amount,
) -> VenueResult<OpenResult> {
    if amount.is_zero() {
        return Err(VenueError::reverted(MARKET, "zero amount"));
    }
    let quote = quote(state, strike_id, amount)?;
    if quote.total_cost > max_total_cost {
        return Err(VenueError::reverted(MARKET, "total cost above max"));
    }
    let quote_token = state.quote_token;
    state
        .token_mut(&quote_token)?
        .transfer_from(market, caller, market, quote.total_cost)?;
    let position_id = state.options.issue(caller, strike_id, amount);
    debug!(
        %caller,
        %strike_id,
        %amount,
        %position_id,
        total_cost = %quote.total_cost,
        "Long call opened"
    );
    Ok(OpenResult {
        position_id,
        total_cost: quote.total_cost,
    })
}

/// `OptionMarket` handle over the simulated chain.
#[derive(Clone)]
pub struct SimOptionMarket {
    state: Arc<Mutex<ChainState>>,
    address: Address,
    quote_asset: Address,
    base_asset: Address,
}

impl SimOptionMarket {
    pub(crate) fn new(
        state: Arc<Mutex<ChainState>>,
        address: Address,
        quote_asset: Address,
        base_asset: Address,
    ) -> Self {
        Self {
            state,
            address,
            quote_asset,
            base_asset,
        }
    }
}

impl OptionMarket for SimOptionMarket {
    fn quote_asset(&self) -> Address {
        self.quote_asset
    }

    fn base_asset(&self) -> Address {
        self.base_asset
    }

    fn address(&self) -> Address {
        self.address
    }

    fn live_boards(&self) -> BoxFuture<VenueResult<Vec<BoardId>>> {
        let guard = self.state.lock();
        let now = guard.timestamp;
        ready(Ok(guard
            .options
            .boards
            .values()
            .filter(|b| !b.is_expired(now))
            .map(|b| b.id)
            .collect()))
    }

    fn board(&self, board_id: BoardId) -> BoxFuture<VenueResult<Option<OptionBoard>>> {
        let guard = self.state.lock();
        ready(Ok(guard.options.boards.get(&board_id).cloned()))
    }

    fn board_strikes(&self, board_id: BoardId) -> BoxFuture<VenueResult<Vec<StrikeId>>> {
        let guard = self.state.lock();
        ready(Ok(guard
            .options
            .boards
            .get(&board_id)
            .map(|b| b.strike_ids.clone())
            .unwrap_or_default()))
    }

    fn strike(&self, strike_id: StrikeId) -> BoxFuture<VenueResult<Option<Strike>>> {
        let guard = self.state.lock();
        ready(Ok(guard.options.strikes.get(&strike_id).cloned()))
    }

    fn quote_buy_call(
        &self,
        strike_id: StrikeId,
        amount: Amount,
    ) -> BoxFuture<VenueResult<PremiumQuote>> {
        let guard = self.state.lock();
        ready(quote(&guard, strike_id, amount))
    }

    fn open_long_call(
        &self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
        max_total_cost: Amount,
    ) -> BoxFuture<VenueResult<OpenResult>> {
        let mut guard = self.state.lock();
        ready(open_long_call(
            &mut guard,
            self.address,
            caller,
            strike_id,
            amount,
            max_total_cost,
        ))
    }
}

/// `OptionToken` handle over the simulated chain.
#[derive(Clone)]
pub struct SimOptionToken {
    state: Arc<Mutex<ChainState>>,
}

impl SimOptionToken {
    pub(crate) fn new(state: Arc<Mutex<ChainState>>) -> Self {
        Self { state }
    }
}

impl OptionToken for SimOptionToken {
    fn owner_positions(&self, owner: Address) -> BoxFuture<VenueResult<Vec<OptionPosition>>> {
        let guard = self.state.lock();
        ready(Ok(guard
            .options
            .positions
            .values()
            .filter(|p| p.owner == owner && p.state == PositionState::Active)
            .cloned()
            .collect()))
    }

    fn position_with_owner(
        &self,
        position_id: OptionPositionId,
    ) -> BoxFuture<VenueResult<Option<OptionPosition>>> {
        let guard = self.state.lock();
        if position_id.is_none() {
            return ready(Err(VenueError::reverted(TOKEN, "invalid position id")));
        }
        ready(Ok(guard.options.positions.get(&position_id).cloned()))
    }

    fn balance_of(&self, owner: Address) -> BoxFuture<VenueResult<u64>> {
        let guard = self.state.lock();
        let count = guard
            .options
            .positions
            .values()
            .filter(|p| p.owner == owner && p.state == PositionState::Active)
            .count();
        ready(Ok(count as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use strands_core::Price;

    fn state() -> OptionsState {
        let mut options = OptionsState::new(dec!(0.01));
        options.add_board(OptionBoard {
            id: BoardId::new(20),
            expiry: 2_000,
            iv: dec!(0.7),
            frozen: false,
            strike_ids: vec![],
        });
        options.add_board(OptionBoard {
            id: BoardId::new(21),
            expiry: 2_000,
            iv: dec!(0.7),
            frozen: true,
            strike_ids: vec![],
        });
        options.add_strike(Strike {
            id: StrikeId::new(308),
            strike_price: Price::new(dec!(1900)),
            skew: Decimal::ONE,
            board_id: BoardId::new(20),
        });
        options.add_strike(Strike {
            id: StrikeId::new(320),
            strike_price: Price::new(dec!(1900)),
            skew: Decimal::ONE,
            board_id: BoardId::new(21),
        });
        options
    }

    #[test]
    fn test_add_strike_lists_on_board() {
        let options = state();
        assert_eq!(options.boards[&BoardId::new(20)].strike_ids, vec![StrikeId::new(308)]);
    }

    #[test]
    fn test_tradeable_strike() {
        let options = state();
        assert!(options.tradeable_strike(StrikeId::new(308), 1_000).is_ok());
        // Expired, frozen and unknown all revert.
        assert!(options.tradeable_strike(StrikeId::new(308), 2_000).is_err());
        assert!(options.tradeable_strike(StrikeId::new(320), 1_000).is_err());
        assert!(options.tradeable_strike(StrikeId::new(999), 1_000).is_err());
    }

    #[test]
    fn test_issue_assigns_sequential_ids() {
        let mut options = state();
        let owner = Address::repeat_byte(0x11);
        let first = options.issue(owner, StrikeId::new(308), Amount::new(dec!(3)));
        let second = options.issue(owner, StrikeId::new(308), Amount::new(dec!(1)));
        assert_eq!(first, OptionPositionId::new(1));
        assert_eq!(second, OptionPositionId::new(2));
        let position = &options.positions[&first];
        assert_eq!(position.option_type, OptionType::LongCall);
        assert_eq!(position.state, PositionState::Active);
        assert_eq!(position.collateral, Amount::ZERO);
    }
}
