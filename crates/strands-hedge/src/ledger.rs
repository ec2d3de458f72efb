//! Per-owner margin ledger.
//!
//! All hedges share one futures account, so the market only reports a
//! single remaining margin. The ledger records how much of it each owner
//! caused: every operation attributes the change in remaining margin it
//! produced to the owner of the position it touched. An owner's margin is
//! their attributed share of the account's current remaining margin, which
//! spreads PnL between operations pro rata.

use std::collections::HashMap;

use rust_decimal::Decimal;
use strands_core::{Address, Amount};

#[derive(Debug, Clone, Default)]
pub struct MarginLedger {
    attributed: HashMap<Address, Amount>,
}

impl MarginLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute a change of remaining margin to `owner`. Negative deltas
    /// (fees, keeper deposits) reduce the owner's entry.
    pub fn attribute(&mut self, owner: Address, delta: Amount) {
        *self.attributed.entry(owner).or_default() += delta;
    }

    pub fn attributed(&self, owner: &Address) -> Amount {
        self.attributed.get(owner).copied().unwrap_or_default()
    }

    pub fn total(&self) -> Amount {
        self.attributed
            .values()
            .fold(Amount::ZERO, |acc, a| acc + *a)
    }

    /// `owner`'s share of `remaining` margin.
    pub fn share_of(&self, owner: &Address, remaining: Amount) -> Amount {
        let own = self.attributed(owner);
        let total = self.total();
        if !own.is_positive() || !total.is_positive() {
            return Amount::ZERO;
        }
        let ratio: Decimal = own.inner() / total.inner();
        remaining * ratio
    }

    pub fn owners(&self) -> impl Iterator<Item = &Address> {
        self.attributed.keys()
    }
}
