//! Strategy actor.
//!
//! The manager mutates its registry and ledger and must see collaborator
//! state between checkpoint and commit without interleaving, so all
//! state-changing calls are serialized through one task. Callers hold a
//! cloneable [`StrategyHandle`].
//!
//! ## Actor State (`StrategyTask`)
//! - Owns the [`HedgeManager`]; processes one message at a time.
//!
//! ## Handle State (`StrategyHandle`)
//! - `positions_data` / `option_index`: DashMap caches refreshed by the
//!   task after every successful operation.
//! - Registry reads (`position_synthetix`, `position_index`,
//!   `total_position`, `owner_of`) are answered from the caches without a
//!   channel round-trip.
//!
//! The caches are written only after the manager commits, so a read never
//! sees a position whose open was reverted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use strands_core::{Address, Amount, OptionPositionId, PositionIndex, StrikeId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{HedgeError, HedgeResult};
use crate::manager::{HedgeManager, HedgeQuote, OpenReceipt, RehedgeReceipt};
use crate::registry::{HedgedPosition, SynthetixLeg};

// ============================================================================
// StrategyMsg
// ============================================================================

/// Messages for the strategy actor.
#[derive(Debug)]
pub enum StrategyMsg {
    Open {
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
        reply: oneshot::Sender<HedgeResult<OpenReceipt>>,
    },

    ReHedge {
        option_position_id: OptionPositionId,
        reply: oneshot::Sender<HedgeResult<RehedgeReceipt>>,
    },

    MarginOf {
        owner: Address,
        reply: oneshot::Sender<HedgeResult<Amount>>,
    },

    QuoteHedge {
        strike_id: StrikeId,
        reply: oneshot::Sender<HedgeResult<HedgeQuote>>,
    },

    /// Graceful shutdown.
    Shutdown,
}

// ============================================================================
// StrategyTask
// ============================================================================

pub struct StrategyTask {
    rx: mpsc::Receiver<StrategyMsg>,
    manager: HedgeManager,
    caches: Caches,
}

impl StrategyTask {
    /// Process messages until Shutdown is received or every handle is gone.
    pub async fn run(mut self) {
        debug!(account = %self.manager.account(), "StrategyTask started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                StrategyMsg::Shutdown => {
                    debug!("StrategyTask shutting down");
                    break;
                }
                msg => self.handle_message(msg).await,
            }
        }

        debug!(positions = self.manager.total_position(), "StrategyTask terminated");
    }

    async fn handle_message(&mut self, msg: StrategyMsg) {
        match msg {
            StrategyMsg::Open {
                caller,
                strike_id,
                amount,
                reply,
            } => {
                let result = self.manager.open(caller, strike_id, amount).await;
                if let Ok(receipt) = &result {
                    self.caches.refresh(&self.manager, receipt.index);
                }
                Self::send_reply(reply, result);
            }
            StrategyMsg::ReHedge {
                option_position_id,
                reply,
            } => {
                let result = self.manager.re_hedge(option_position_id).await;
                if let Ok(receipt) = &result {
                    self.caches.refresh(&self.manager, receipt.index);
                }
                Self::send_reply(reply, result);
            }
            StrategyMsg::MarginOf { owner, reply } => {
                Self::send_reply(reply, self.manager.margin_of(owner).await);
            }
            StrategyMsg::QuoteHedge { strike_id, reply } => {
                Self::send_reply(reply, self.manager.quote_hedge(strike_id).await);
            }
            StrategyMsg::Shutdown => {}
        }
    }

    fn send_reply<T>(reply: oneshot::Sender<T>, value: T) {
        if reply.send(value).is_err() {
            warn!("Strategy caller dropped before reply");
        }
    }
}

// ============================================================================
// Caches
// ============================================================================

#[derive(Clone, Default)]
struct Caches {
    positions_data: Arc<DashMap<PositionIndex, HedgedPosition>>,
    option_index: Arc<DashMap<OptionPositionId, PositionIndex>>,
    total: Arc<AtomicU64>,
}

impl Caches {
    fn refresh(&self, manager: &HedgeManager, index: PositionIndex) {
        if let Some(position) = manager.position(index) {
            self.option_index
                .insert(position.option_position_id, position.index);
            self.positions_data.insert(index, position.clone());
        }
        self.total.store(manager.total_position(), Ordering::Release);
    }

    fn seed(&self, manager: &HedgeManager) {
        for position in manager.positions() {
            self.refresh(manager, position.index);
        }
        self.total.store(manager.total_position(), Ordering::Release);
    }
}

// ============================================================================
// StrategyHandle
// ============================================================================

/// Cloneable handle to the strategy actor.
#[derive(Clone)]
pub struct StrategyHandle {
    tx: mpsc::Sender<StrategyMsg>,
    account: Address,
    caches: Caches,
}

impl StrategyHandle {
    /// Strategy account holding both legs.
    pub fn account(&self) -> Address {
        self.account
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<HedgeResult<T>>) -> StrategyMsg,
    ) -> HedgeResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| HedgeError::ServiceUnavailable)?;
        rx.await.map_err(|_| HedgeError::ServiceUnavailable)?
    }

    pub async fn open(
        &self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
    ) -> HedgeResult<OpenReceipt> {
        self.request(|reply| StrategyMsg::Open {
            caller,
            strike_id,
            amount,
            reply,
        })
        .await
    }

    pub async fn buy_hedged_call(
        &self,
        caller: Address,
        strike_id: StrikeId,
        amount: Amount,
    ) -> HedgeResult<OpenReceipt> {
        self.open(caller, strike_id, amount).await
    }

    pub async fn re_hedge(
        &self,
        option_position_id: OptionPositionId,
    ) -> HedgeResult<RehedgeReceipt> {
        // Rejected here to spare the round-trip; the manager checks again.
        if option_position_id.is_none() {
            return Err(HedgeError::InvalidPosition);
        }
        self.request(|reply| StrategyMsg::ReHedge {
            option_position_id,
            reply,
        })
        .await
    }

    pub async fn margin_of(&self, owner: Address) -> HedgeResult<Amount> {
        self.request(|reply| StrategyMsg::MarginOf { owner, reply })
            .await
    }

    pub async fn quote_hedge(&self, strike_id: StrikeId) -> HedgeResult<HedgeQuote> {
        self.request(|reply| StrategyMsg::QuoteHedge { strike_id, reply })
            .await
    }

    // === Sync reads (cache) ===

    pub fn position_synthetix(
        &self,
        option_position_id: OptionPositionId,
    ) -> HedgeResult<SynthetixLeg> {
        self.position_by_option(option_position_id)
            .map(|p| p.synthetix_leg())
            .ok_or(HedgeError::InvalidPosition)
    }

    pub fn position_index(&self, sequence: u64) -> OptionPositionId {
        self.caches
            .positions_data
            .get(&PositionIndex::new(sequence))
            .map(|p| p.option_position_id)
            .unwrap_or(OptionPositionId::NONE)
    }

    pub fn total_position(&self) -> u64 {
        self.caches.total.load(Ordering::Acquire)
    }

    pub fn position(&self, index: PositionIndex) -> Option<HedgedPosition> {
        self.caches
            .positions_data
            .get(&index)
            .map(|p| p.value().clone())
    }

    /// All positions in creation order.
    pub fn positions(&self) -> Vec<HedgedPosition> {
        let mut positions: Vec<HedgedPosition> = self
            .caches
            .positions_data
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        positions.sort_by_key(|p| p.index);
        positions
    }

    pub fn owner_of(&self, option_position_id: OptionPositionId) -> Option<Address> {
        self.position_by_option(option_position_id).map(|p| p.owner)
    }

    fn position_by_option(&self, option_position_id: OptionPositionId) -> Option<HedgedPosition> {
        let index = *self.caches.option_index.get(&option_position_id)?;
        self.position(index)
    }

    /// Ask the actor to stop after the messages already queued.
    pub async fn shutdown(&self) -> HedgeResult<()> {
        self.tx
            .send(StrategyMsg::Shutdown)
            .await
            .map_err(|_| HedgeError::ServiceUnavailable)
    }
}

// ============================================================================
// Spawn function
// ============================================================================

/// Spawn the strategy actor around `manager`.
///
/// Returns a handle for interaction and a join handle for the task.
#[must_use]
pub fn spawn_strategy(manager: HedgeManager) -> (StrategyHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(manager.config().channel_capacity.max(1));
    let caches = Caches::default();
    caches.seed(&manager);

    let handle = StrategyHandle {
        tx,
        account: manager.account(),
        caches: caches.clone(),
    };
    let task = StrategyTask {
        rx,
        manager,
        caches,
    };
    let join_handle = tokio::spawn(task.run());

    (handle, join_handle)
}

// ============================================================================
// Tests
// ============================================================================
