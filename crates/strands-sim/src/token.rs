//! Simulated ERC-20 tokens.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use strands_core::{Address, Amount};
use strands_venue::{BoxFuture, Erc20, VenueError, VenueResult};

use crate::chain::{ready, ChainState};

const CONTRACT: &str = "ERC20";

/// Balances and allowances of one token.
#[derive(Debug, Clone)]
pub struct TokenState {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
}

impl TokenState {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn balance(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        let amount = amount.round_to_decimals(self.decimals);
        self.allowances.insert((owner, spender), amount);
    }

    pub fn credit(&mut self, to: Address, amount: Amount) {
        let amount = amount.round_to_decimals(self.decimals);
        *self.balances.entry(to).or_default() += amount;
    }

    pub fn debit(&mut self, from: Address, amount: Amount) -> VenueResult<()> {
        let amount = amount.round_to_decimals(self.decimals);
        let balance = self.balance(&from);
        if balance < amount {
            return Err(VenueError::reverted(
                CONTRACT,
                format!("{}: transfer amount exceeds balance", self.symbol),
            ));
        }
        self.balances.insert(from, balance - amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> VenueResult<()> {
        if amount.is_negative() {
            return Err(VenueError::reverted(CONTRACT, "negative amount"));
        }
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    /// Spend `spender`'s allowance over `owner`'s balance.
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> VenueResult<()> {
        let amount = amount.round_to_decimals(self.decimals);
        let allowance = self.allowance(&owner, &spender);
        if allowance < amount {
            return Err(VenueError::reverted(
                CONTRACT,
                format!("{}: insufficient allowance", self.symbol),
            ));
        }
        self.allowances.insert((owner, spender), allowance - amount);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> VenueResult<()> {
        self.spend_allowance(from, spender, amount)?;
        self.transfer(from, to, amount)
    }
}

/// `Erc20` handle over a token in the simulated chain.
#[derive(Clone)]
pub struct SimToken {
    state: Arc<Mutex<ChainState>>,
    address: Address,
    symbol: String,
    decimals: u8,
}

impl SimToken {
    pub(crate) fn new(
        state: Arc<Mutex<ChainState>>,
        address: Address,
        symbol: String,
        decimals: u8,
    ) -> Self {
        Self {
            state,
            address,
            symbol,
            decimals,
        }
    }

    fn with_token<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut TokenState) -> VenueResult<T>,
    ) -> BoxFuture<VenueResult<T>> {
        let mut guard = self.state.lock();
        ready(guard.token_mut(&self.address).and_then(f))
    }
}

impl Erc20 for SimToken {
    fn address(&self) -> Address {
        self.address
    }

    fn symbol(&self) -> String {
        self.symbol.clone()
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn balance_of(&self, owner: Address) -> BoxFuture<VenueResult<Amount>> {
        self.with_token(|t| Ok(t.balance(&owner)))
    }

    fn allowance(&self, owner: Address, spender: Address) -> BoxFuture<VenueResult<Amount>> {
        self.with_token(|t| Ok(t.allowance(&owner, &spender)))
    }

    fn approve(
        &self,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> BoxFuture<VenueResult<()>> {
        self.with_token(|t| {
            t.approve(caller, spender, amount);
            Ok(())
        })
    }

    fn transfer(
        &self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> BoxFuture<VenueResult<()>> {
        self.with_token(|t| t.transfer(caller, to, amount))
    }

    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> BoxFuture<VenueResult<()>> {
        self.with_token(|t| t.transfer_from(caller, from, to, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn usdc() -> TokenState {
        TokenState::new(Address::repeat_byte(0x7f), "USDC", 6)
    }

    #[test]
    fn test_credit_truncates_to_decimals() {
        let mut token = usdc();
        token.credit(alice(), Amount::new(dec!(1.23456789)));
        assert_eq!(token.balance(&alice()), Amount::new(dec!(1.234567)));
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let mut token = usdc();
        token.credit(alice(), Amount::new(dec!(100)));

        let err = token
            .transfer_from(bob(), alice(), bob(), Amount::new(dec!(10)))
            .unwrap_err();
        assert!(err.revert_reason().unwrap().contains("insufficient allowance"));

        token.approve(alice(), bob(), Amount::new(dec!(10)));
        token
            .transfer_from(bob(), alice(), bob(), Amount::new(dec!(10)))
            .unwrap();
        assert_eq!(token.balance(&bob()), Amount::new(dec!(10)));
        assert_eq!(token.allowance(&alice(), &bob()), Amount::ZERO);
    }

    #[test]
    fn test_transfer_exceeding_balance_reverts() {
        let mut token = usdc();
        token.credit(alice(), Amount::new(dec!(5)));
        let err = token
            .transfer(alice(), bob(), Amount::new(dec!(6)))
            .unwrap_err();
        assert!(err.revert_reason().unwrap().contains("exceeds balance"));
        assert_eq!(token.balance(&alice()), Amount::new(dec!(5)));
    }
}
