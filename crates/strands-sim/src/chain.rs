//! Simulated chain: shared protocol state, block clock and snapshots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::address;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use strands_core::{Address, Amount, BoardId, OptionBoard, Price, Strike, StrikeId};
use strands_venue::{
    BoxFuture, Checkpoint, FuturesMarket, StateJournal, Venue, VenueError, VenueResult,
};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::options::{OptionsState, SimOptionMarket, SimOptionToken};
use crate::oracle::{OracleState, SimGwavOracle};
use crate::perps::{PerpsState, SimFuturesMarket};
use crate::token::{SimToken, TokenState};

/// Optimism mainnet USDC.
pub const USDC_ADDRESS: Address = address!("7F5c764cBc14f9669B88837ca1490cCa17c31607");
/// Optimism mainnet sUSD.
pub const SUSD_ADDRESS: Address = address!("8c6f28f2F1A3C87F0f938b96d27520d9751ec8d9");
/// Lyra ETH option market.
pub const OPTION_MARKET_ADDRESS: Address = address!("59c671B1a1F261FB2192974B43ce1608aeFd328E");
/// Lyra ETH option token.
pub const OPTION_TOKEN_ADDRESS: Address = address!("A48C5363698Cef655D374675fAf810137a1b2EC0");
/// Synthetix sETH perps market proxy.
pub const PERPS_MARKET_ADDRESS: Address = address!("2B3bb4c683BFc5239B029131EEf3B1d214478d93");
/// Lyra ETH base asset (sETH) as seen by the option market.
pub const BASE_ASSET_ADDRESS: Address = address!("E405de8F52ba7559f9df3C368500B6E6ae6Cee49");

/// Wrap an already-computed result as a `BoxFuture`.
pub(crate) fn ready<T: Send + 'static>(value: T) -> BoxFuture<T> {
    Box::pin(std::future::ready(value))
}

/// Every piece of protocol state, cloned wholesale for snapshots.
#[derive(Debug, Clone)]
pub struct ChainState {
    /// Block time of the latest mined block (Unix seconds).
    pub timestamp: u64,
    pub block_number: u64,
    /// Time advanced but not yet mined.
    pending_time: u64,
    pub quote_token: Address,
    pub margin_token: Address,
    tokens: HashMap<Address, TokenState>,
    pub options: OptionsState,
    pub oracle: OracleState,
    pub perps: PerpsState,
}

impl ChainState {
    pub fn token(&self, address: &Address) -> VenueResult<&TokenState> {
        self.tokens
            .get(address)
            .ok_or_else(|| VenueError::reverted("ERC20", format!("no token at {address}")))
    }

    pub fn token_mut(&mut self, address: &Address) -> VenueResult<&mut TokenState> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| VenueError::reverted("ERC20", format!("no token at {address}")))
    }

    fn from_config(config: &SimConfig) -> Self {
        let start = config.start_timestamp;
        let mut tokens = HashMap::new();
        tokens.insert(
            USDC_ADDRESS,
            TokenState::new(
                USDC_ADDRESS,
                config.quote_token.symbol.clone(),
                config.quote_token.decimals,
            ),
        );
        tokens.insert(
            SUSD_ADDRESS,
            TokenState::new(
                SUSD_ADDRESS,
                config.margin_token.symbol.clone(),
                config.margin_token.decimals,
            ),
        );

        let mut options = OptionsState::new(config.options.fee_rate);
        let mut oracle = OracleState::default();
        for board in &config.options.boards {
            let expiry = start.saturating_add_signed(board.expires_in_secs);
            options.add_board(OptionBoard {
                id: BoardId::new(board.id),
                expiry,
                iv: board.iv,
                frozen: board.frozen,
                strike_ids: Vec::new(),
            });
            for strike in &board.strikes {
                let strike_id = StrikeId::new(strike.id);
                options.add_strike(Strike {
                    id: strike_id,
                    strike_price: Price::new(strike.strike_price),
                    skew: strike.skew,
                    board_id: BoardId::new(board.id),
                });
                oracle.set_quote(
                    strike_id,
                    start,
                    strike.delta,
                    Price::new(strike.call_price),
                    Price::new(strike.put_price),
                );
            }
        }

        Self {
            timestamp: start,
            block_number: 1,
            pending_time: 0,
            quote_token: USDC_ADDRESS,
            margin_token: SUSD_ADDRESS,
            tokens,
            options,
            oracle,
            perps: PerpsState::new(PERPS_MARKET_ADDRESS, config.perps.clone()),
        }
    }
}

/// In-memory chain shared by every simulated collaborator.
///
/// Cloning yields another handle onto the same state.
#[derive(Clone)]
pub struct SimChain {
    state: Arc<Mutex<ChainState>>,
    snapshots: Arc<Mutex<Vec<(u64, ChainState)>>>,
    next_snapshot: Arc<AtomicU64>,
}

impl SimChain {
    pub fn new(config: &SimConfig) -> Self {
        let state = ChainState::from_config(config);
        info!(
            timestamp = state.timestamp,
            boards = state.options.boards.len(),
            strikes = state.options.strikes.len(),
            market = %config.perps.market_key,
            "Simulated chain started"
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            snapshots: Arc::new(Mutex::new(Vec::new())),
            next_snapshot: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Record the current state; returns the snapshot id.
    pub fn snapshot(&self) -> u64 {
        let id = self.next_snapshot.fetch_add(1, Ordering::Relaxed);
        let copy = self.state.lock().clone();
        self.snapshots.lock().push((id, copy));
        id
    }

    /// Restore the state recorded at `id`. Later snapshots are dropped.
    pub fn revert_to(&self, id: u64) -> VenueResult<()> {
        let mut snapshots = self.snapshots.lock();
        let pos = snapshots
            .iter()
            .position(|(sid, _)| *sid == id)
            .ok_or(VenueError::UnknownCheckpoint(id))?;
        let mut dropped = snapshots.split_off(pos);
        let (_, state) = dropped.swap_remove(0);
        *self.state.lock() = state;
        debug!(snapshot = id, "Reverted to snapshot");
        Ok(())
    }

    /// Drop the snapshot at `id` and every later one, keeping current state.
    pub fn discard(&self, id: u64) -> VenueResult<()> {
        let mut snapshots = self.snapshots.lock();
        let pos = snapshots
            .iter()
            .position(|(sid, _)| *sid == id)
            .ok_or(VenueError::UnknownCheckpoint(id))?;
        snapshots.truncate(pos);
        Ok(())
    }

    /// Advance the clock for the next mined block.
    pub fn increase_time(&self, secs: u64) {
        self.state.lock().pending_time += secs;
    }

    /// Mine one block, applying any pending time increase.
    pub fn mine(&self) {
        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.pending_time);
        state.timestamp += pending;
        state.block_number += 1;
        debug!(block = state.block_number, timestamp = state.timestamp, "Block mined");
    }

    pub fn block_timestamp(&self) -> u64 {
        self.state.lock().timestamp
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    /// Credit `amount` of `token` to `to` out of thin air.
    pub fn mint(&self, token: Address, to: Address, amount: Amount) -> VenueResult<()> {
        self.state.lock().token_mut(&token)?.credit(to, amount);
        Ok(())
    }

    /// Set a new GWAV quote for a strike at the current block time.
    pub fn set_oracle_quote(
        &self,
        strike_id: StrikeId,
        delta: Decimal,
        call_price: Price,
        put_price: Price,
    ) {
        let mut state = self.state.lock();
        let now = state.timestamp;
        state
            .oracle
            .set_quote(strike_id, now, delta, call_price, put_price);
    }

    /// Set the perps oracle price.
    pub fn set_perps_price(&self, price: Price) {
        self.state.lock().perps.price = price;
    }

    pub fn freeze_board(&self, board_id: BoardId, frozen: bool) -> VenueResult<()> {
        let mut state = self.state.lock();
        let board = state
            .options
            .boards
            .get_mut(&board_id)
            .ok_or_else(|| VenueError::reverted("OptionMarket", format!("invalid {board_id}")))?;
        board.frozen = frozen;
        Ok(())
    }

    /// Read arbitrary state.
    pub fn with_state<T>(&self, f: impl FnOnce(&ChainState) -> T) -> T {
        f(&self.state.lock())
    }

    /// Collaborator bundle backed by this chain.
    pub fn venue(&self) -> Venue {
        let (quote, margin) = self.with_state(|s| {
            let describe = |addr: &Address| {
                s.token(addr)
                    .map(|t| (t.symbol.clone(), t.decimals))
                    .unwrap_or_default()
            };
            (describe(&s.quote_token), describe(&s.margin_token))
        });
        Venue::new(
            Arc::new(SimOptionMarket::new(
                self.state.clone(),
                OPTION_MARKET_ADDRESS,
                USDC_ADDRESS,
                BASE_ASSET_ADDRESS,
            )),
            Arc::new(SimOptionToken::new(self.state.clone())),
            Arc::new(SimGwavOracle::new(self.state.clone())),
            Arc::new(SimFuturesMarket::new(self.state.clone())),
            Arc::new(SimToken::new(self.state.clone(), USDC_ADDRESS, quote.0, quote.1)),
            Arc::new(SimToken::new(self.state.clone(), SUSD_ADDRESS, margin.0, margin.1)),
            Arc::new(self.clone()),
        )
    }

    /// Run a keeper over every pending order at the current perps price.
    /// Either every order executes or none does.
    pub async fn execute_pending_orders(&self, keeper: Address) -> VenueResult<usize> {
        let market = SimFuturesMarket::new(self.state.clone());
        let (accounts, price) = self.with_state(|s| (s.perps.pending_accounts(), s.perps.price));
        let snapshot = self.snapshot();
        for account in &accounts {
            if let Err(err) = market
                .execute_offchain_delayed_order(keeper, *account, price)
                .await
            {
                self.revert_to(snapshot)?;
                return Err(err);
            }
        }
        self.discard(snapshot)?;
        Ok(accounts.len())
    }
}

impl Default for SimChain {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl StateJournal for SimChain {
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.snapshot())
    }

    fn commit(&self, checkpoint: Checkpoint) -> VenueResult<()> {
        self.discard(checkpoint.0)
    }

    fn revert(&self, checkpoint: Checkpoint) -> VenueResult<()> {
        self.revert_to(checkpoint.0)
    }

    fn block_timestamp(&self) -> u64 {
        SimChain::block_timestamp(self)
    }
}
