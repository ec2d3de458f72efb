//! Main application orchestration.
//!
//! Builds the simulated chain, spawns the strategy actor over it and runs
//! one of three flows:
//! - Options exploration: live boards, strikes and their GWAV greeks
//! - Futures exploration: market parameters, fill price and fees
//! - Scenario: fund an owner, open a hedged call, advance time, move the
//!   oracle and rehedge, checking margin bookkeeping after each step

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use strands_core::{
    Address, Amount, BoardId, DelayedOrder, FuturesOrderType, OptionPosition, OptionPositionId, Price,
    Size, StrikeId,
};
use strands_hedge::{
    estimate_margin_allowance, estimate_premium_allowance, rehedge_margin_shortfall,
    spawn_strategy, HedgeManager, MarginPolicy, OpenReceipt, RehedgeReceipt, StrategyHandle,
};
use strands_sim::{SimChain, SUSD_ADDRESS, USDC_ADDRESS};
use strands_venue::Venue;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// One strike as seen by the options market and the GWAV oracle.
#[derive(Debug, Clone, Serialize)]
pub struct StrikeSummary {
    pub strike_id: StrikeId,
    pub strike_price: Price,
    pub delta: Decimal,
    pub call_price: Price,
    pub put_price: Price,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    pub board_id: BoardId,
    pub expiry: Option<DateTime<Utc>>,
    pub frozen: bool,
    pub strikes: Vec<StrikeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionsReport {
    pub block_timestamp: u64,
    pub boards: Vec<BoardSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuturesReport {
    pub market_key: String,
    pub base_asset: String,
    pub asset_price: Price,
    pub market_skew: Size,
    pub market_size: Size,
    /// Size used for the fill price and fee quotes.
    pub sample_size: Size,
    pub fill_price: Price,
    pub fee_atomic: Amount,
    pub fee_delayed: Amount,
    pub fee_offchain: Amount,
    /// Margin the strategy would require for `sample_size`.
    pub required_margin: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub opened: OpenReceipt,
    pub option_position: OptionPosition,
    pub order_after_open: DelayedOrder,
    pub margin_after_open: Amount,
    /// Orders executed by the keeper between open and rehedge.
    pub keeper_executions: usize,
    pub rehedged: RehedgeReceipt,
    pub order_after_rehedge: DelayedOrder,
    pub margin_after_rehedge: Amount,
    pub option_positions: usize,
    pub total_positions: u64,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    chain: SimChain,
    venue: Venue,
    strategy: StrategyHandle,
    strategy_task: JoinHandle<()>,
}

impl Application {
    /// Create the simulated chain and spawn the strategy actor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let chain = SimChain::new(&config.sim);
        let venue = chain.venue();
        let manager = HedgeManager::new(venue.clone(), config.strategy.clone());
        let (strategy, strategy_task) = spawn_strategy(manager);
        info!(
            account = %strategy.account(),
            block_timestamp = chain.block_timestamp(),
            "Application initialized"
        );
        Ok(Self {
            config,
            chain,
            venue,
            strategy,
            strategy_task,
        })
    }

    pub fn chain(&self) -> &SimChain {
        &self.chain
    }

    pub fn strategy(&self) -> &StrategyHandle {
        &self.strategy
    }

    /// List live boards with strike prices and current GWAV greeks.
    pub async fn explore_options(&self) -> AppResult<OptionsReport> {
        let market = &self.venue.option_market;
        let oracle = &self.venue.oracle;
        let mut boards = Vec::new();

        for board_id in market.live_boards().await? {
            let Some(board) = market.board(board_id).await? else {
                continue;
            };
            let mut strikes = Vec::new();
            for strike_id in market.board_strikes(board_id).await? {
                let Some(strike) = market.strike(strike_id).await? else {
                    continue;
                };
                let delta = oracle.delta_gwav(strike_id, 0).await?;
                let prices = oracle.option_price_gwav(strike_id, 0).await?;
                debug!(%strike_id, strike_price = %strike.strike_price, %delta, "Strike");
                strikes.push(StrikeSummary {
                    strike_id,
                    strike_price: strike.strike_price,
                    delta,
                    call_price: prices.call_price,
                    put_price: prices.put_price,
                });
            }
            info!(
                %board_id,
                expiry = board.expiry,
                frozen = board.frozen,
                strikes = strikes.len(),
                "Live board"
            );
            boards.push(BoardSummary {
                board_id,
                expiry: board.expiry_datetime(),
                frozen: board.frozen,
                strikes,
            });
        }

        Ok(OptionsReport {
            block_timestamp: self.chain.block_timestamp(),
            boards,
        })
    }

    /// Perps market parameters and quotes for the scenario strike's delta.
    pub async fn explore_futures(&self) -> AppResult<FuturesReport> {
        let futures = &self.venue.futures;
        let hedge = self
            .strategy
            .quote_hedge(self.config.scenario.strike_id)
            .await?;
        let sample_size = hedge.futures_delta;

        let report = FuturesReport {
            market_key: futures.market_key(),
            base_asset: futures.base_asset(),
            asset_price: futures.asset_price().await?,
            market_skew: futures.market_skew().await?,
            market_size: futures.market_size().await?,
            sample_size,
            fill_price: futures.fill_price(sample_size).await?,
            fee_atomic: futures.order_fee(sample_size, FuturesOrderType::Atomic).await?,
            fee_delayed: futures.order_fee(sample_size, FuturesOrderType::Delayed).await?,
            fee_offchain: futures
                .order_fee(sample_size, FuturesOrderType::Offchain)
                .await?,
            required_margin: hedge.margin.required,
        };
        info!(
            market = %report.market_key,
            price = %report.asset_price,
            skew = %report.market_skew,
            fill_price = %report.fill_price,
            required_margin = %report.required_margin,
            "Futures market"
        );
        Ok(report)
    }

    /// Open a hedged call for the scenario owner, advance time, move the
    /// oracle and rehedge.
    pub async fn run_scenario(&self) -> AppResult<ScenarioReport> {
        let scenario = &self.config.scenario;
        let owner = scenario.owner;
        let account = self.strategy.account();
        let amount = Amount::new(scenario.amount);

        self.chain
            .mint(USDC_ADDRESS, owner, Amount::new(scenario.quote_funding))?;
        self.chain
            .mint(SUSD_ADDRESS, owner, Amount::new(scenario.margin_funding))?;

        // Allowances sized from the same reads the strategy will make.
        let prices = self
            .venue
            .oracle
            .option_price_gwav(scenario.strike_id, 0)
            .await?;
        let premium_allowance =
            estimate_premium_allowance(prices.call_price, amount, scenario.premium_fee_pct);
        let hedge = self.strategy.quote_hedge(scenario.strike_id).await?;
        let policy = MarginPolicy::from(&self.config.strategy);
        let margin_allowance = estimate_margin_allowance(
            &policy,
            hedge.margin.fill_price,
            hedge.margin.order_fee,
        );
        self.venue
            .quote_token
            .approve(owner, account, premium_allowance)
            .await?;
        self.venue
            .margin_token
            .approve(owner, account, margin_allowance)
            .await?;
        info!(%owner, %premium_allowance, %margin_allowance, "Allowances granted");

        let opened = self
            .strategy
            .open(owner, scenario.strike_id, amount)
            .await?;
        let option_position = self.option_position(opened.option_position_id).await?;
        let order_after_open = self.pending_order().await?;
        let margin_after_open = self.check_margin(owner, "open").await?;

        let keeper_executions = if scenario.execute_keeper {
            self.chain.execute_pending_orders(scenario.keeper).await?
        } else {
            0
        };

        self.chain.increase_time(scenario.time_step_secs);
        self.chain.mine();
        self.chain.set_oracle_quote(
            scenario.strike_id,
            scenario.post_step_delta,
            Price::new(scenario.post_step_call_price),
            Price::new(scenario.post_step_put_price),
        );

        let hedge = self.strategy.quote_hedge(scenario.strike_id).await?;
        let margin = self.strategy.margin_of(owner).await?;
        let shortfall = rehedge_margin_shortfall(margin, hedge.margin.required);
        if shortfall.is_positive() {
            self.venue
                .margin_token
                .approve(owner, account, shortfall)
                .await?;
            info!(%owner, %shortfall, "Rehedge shortfall approved");
        }

        let rehedged = self.strategy.re_hedge(opened.option_position_id).await?;
        let order_after_rehedge = self.pending_order().await?;
        let margin_after_rehedge = self.check_margin(owner, "rehedge").await?;
        let option_positions = self
            .venue
            .option_token
            .owner_positions(account)
            .await?
            .len();

        Ok(ScenarioReport {
            opened,
            option_position,
            order_after_open,
            margin_after_open,
            keeper_executions,
            rehedged,
            order_after_rehedge,
            margin_after_rehedge,
            option_positions,
            total_positions: self.strategy.total_position(),
        })
    }

    async fn option_position(&self, id: OptionPositionId) -> AppResult<OptionPosition> {
        self.venue
            .option_token
            .position_with_owner(id)
            .await?
            .ok_or_else(|| AppError::Check(format!("{id} not found on option token")))
    }

    async fn pending_order(&self) -> AppResult<DelayedOrder> {
        self.venue
            .futures
            .delayed_order(self.strategy.account())
            .await?
            .ok_or_else(|| AppError::Check("no pending hedge order".to_string()))
    }

    /// `owner`'s margin, checked against the account's remaining margin.
    async fn check_margin(&self, owner: Address, step: &str) -> AppResult<Amount> {
        let first = self.strategy.margin_of(owner).await?;
        let second = self.strategy.margin_of(owner).await?;
        if first != second {
            return Err(AppError::Check(format!(
                "margin_of changed between reads after {step}: {first} != {second}"
            )));
        }
        let remaining = self
            .venue
            .futures
            .remaining_margin(self.strategy.account())
            .await?;
        if first != remaining {
            warn!(%owner, %first, %remaining, step, "Margin mismatch");
            return Err(AppError::Check(format!(
                "margin_of {first} != remaining margin {remaining} after {step}"
            )));
        }
        info!(%owner, margin = %first, step, "Margin verified");
        Ok(first)
    }

    /// Stop the strategy actor and wait for it.
    pub async fn shutdown(self) -> AppResult<()> {
        self.strategy.shutdown().await?;
        if let Err(e) = self.strategy_task.await {
            warn!(error = %e, "Strategy task ended abnormally");
        }
        info!("Application stopped");
        Ok(())
    }
}
