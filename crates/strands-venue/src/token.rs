//! ERC-20 token seam.

use strands_core::{Address, Amount};

use crate::{BoxFuture, VenueResult};

/// Standard allowance/transfer token semantics.
///
/// `caller` plays the role of `msg.sender`.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Erc20: Send + Sync {
    fn address(&self) -> Address;

    fn symbol(&self) -> String;

    fn decimals(&self) -> u8;

    fn balance_of(&self, owner: Address) -> BoxFuture<VenueResult<Amount>>;

    fn allowance(&self, owner: Address, spender: Address) -> BoxFuture<VenueResult<Amount>>;

    /// Set `caller`'s allowance for `spender` to `amount`.
    fn approve(
        &self,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> BoxFuture<VenueResult<()>>;

    fn transfer(&self, caller: Address, to: Address, amount: Amount)
        -> BoxFuture<VenueResult<()>>;

    /// Move `amount` from `from` to `to`, spending `caller`'s allowance.
    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> BoxFuture<VenueResult<()>>;
}
