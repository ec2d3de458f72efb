//! Arena of hedged positions.
//!
//! Positions live in a dense `Vec` addressed by their 1-based creation
//! index. A reverse map resolves the external option-position id to the
//! index. Entries are never removed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strands_core::{Address, Amount, OptionPositionId, PositionIndex, Price, Size, StrikeId};

/// One option leg and its futures hedge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgedPosition {
    pub index: PositionIndex,
    pub option_position_id: OptionPositionId,
    pub strike_id: StrikeId,
    /// Contracts bought. Never changes.
    pub amount: Amount,
    /// Size delta of the latest hedge order.
    pub futures_delta: Size,
    /// Desired fill price of the latest hedge order.
    pub desired_fill_price: Price,
    pub owner: Address,
    /// Block time of the opening call.
    pub opened_at: u64,
    /// Block time of the latest hedge order.
    pub hedged_at: u64,
    /// Hedge orders submitted, the opening one included.
    pub hedge_count: u32,
}

/// The `{delta, price}` futures leg of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthetixLeg {
    pub delta: Size,
    pub price: Price,
}

impl HedgedPosition {
    pub fn synthetix_leg(&self) -> SynthetixLeg {
        SynthetixLeg {
            delta: self.futures_delta,
            price: self.desired_fill_price,
        }
    }
}

/// Parameters of a newly opened position.
#[derive(Debug, Clone)]
pub struct NewPosition {
    pub option_position_id: OptionPositionId,
    pub strike_id: StrikeId,
    pub amount: Amount,
    pub futures_delta: Size,
    pub desired_fill_price: Price,
    pub owner: Address,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PositionRegistry {
    positions: Vec<HedgedPosition>,
    by_option: HashMap<OptionPositionId, PositionIndex>,
}

impl PositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position and return its index.
    pub fn insert(&mut self, new: NewPosition) -> PositionIndex {
        let index = PositionIndex::new(self.positions.len() as u64).next();
        self.by_option.insert(new.option_position_id, index);
        self.positions.push(HedgedPosition {
            index,
            option_position_id: new.option_position_id,
            strike_id: new.strike_id,
            amount: new.amount,
            futures_delta: new.futures_delta,
            desired_fill_price: new.desired_fill_price,
            owner: new.owner,
            opened_at: new.timestamp,
            hedged_at: new.timestamp,
            hedge_count: 1,
        });
        index
    }

    fn slot(index: PositionIndex) -> Option<usize> {
        if index.is_none() {
            return None;
        }
        usize::try_from(index.get() - 1).ok()
    }

    pub fn get(&self, index: PositionIndex) -> Option<&HedgedPosition> {
        Self::slot(index).and_then(|i| self.positions.get(i))
    }

    pub fn get_mut(&mut self, index: PositionIndex) -> Option<&mut HedgedPosition> {
        Self::slot(index).and_then(move |i| self.positions.get_mut(i))
    }

    pub fn index_of(&self, option_position_id: OptionPositionId) -> Option<PositionIndex> {
        if option_position_id.is_none() {
            return None;
        }
        self.by_option.get(&option_position_id).copied()
    }

    pub fn by_option_id(&self, option_position_id: OptionPositionId) -> Option<&HedgedPosition> {
        self.index_of(option_position_id).and_then(|i| self.get(i))
    }

    /// Record a new hedge order on an existing position.
    pub fn update_hedge(
        &mut self,
        index: PositionIndex,
        futures_delta: Size,
        desired_fill_price: Price,
        timestamp: u64,
    ) -> Option<&HedgedPosition> {
        let position = self.get_mut(index)?;
        position.futures_delta = futures_delta;
        position.desired_fill_price = desired_fill_price;
        position.hedged_at = timestamp;
        position.hedge_count += 1;
        Some(&*position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HedgedPosition> {
        self.positions.iter()
    }
}
