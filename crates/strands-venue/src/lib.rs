//! Collaborator seams for the Strands hedged-position manager.
//!
//! The manager never talks to a chain directly. Every external protocol it
//! depends on is a trait here, so the same manager runs against the
//! in-memory simulator, a live RPC adapter, or mockall doubles in tests.
//!
//! # Key Components
//!
//! - [`OptionMarket`]: Strike/board lookup and long-call purchase
//! - [`OptionToken`]: Option-position registry (ownership, balances)
//! - [`GwavOracle`]: GWAV delta and option prices
//! - [`FuturesMarket`]: Fill price, fees, margin and delayed orders
//! - [`Erc20`]: Allowance and transfer semantics of quote/margin tokens
//! - [`StateJournal`]: Checkpoint/commit/revert for all-or-nothing calls
//! - [`Venue`]: Bundle of the above handed to the manager

pub mod error;
pub mod futures;
pub mod journal;
pub mod options;
pub mod oracle;
pub mod token;
pub mod venue;

use std::future::Future;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
///
/// Futures are `'static` so implementations clone their shared state into
/// the future instead of borrowing `self`.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub use error::{VenueError, VenueResult};
pub use futures::FuturesMarket;
pub use journal::{Checkpoint, StateJournal};
pub use options::{OptionMarket, OptionToken};
pub use oracle::GwavOracle;
pub use token::Erc20;
pub use venue::Venue;

#[cfg(any(test, feature = "mock"))]
pub use futures::MockFuturesMarket;
#[cfg(any(test, feature = "mock"))]
pub use journal::MockStateJournal;
#[cfg(any(test, feature = "mock"))]
pub use options::{MockOptionMarket, MockOptionToken};
#[cfg(any(test, feature = "mock"))]
pub use oracle::MockGwavOracle;
#[cfg(any(test, feature = "mock"))]
pub use token::MockErc20;
