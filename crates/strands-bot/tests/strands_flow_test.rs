//! Strategy runner flows against the simulated chain.

use rust_decimal_macros::dec;
use strands_bot::{AppConfig, AppError, Application};
use strands_core::{
    Amount, BoardId, OptionPositionId, OptionType, PositionIndex, PositionState, Price, Size,
    StrikeId,
};
use strands_hedge::HedgeError;

fn default_config_path() -> String {
    format!("{}/../../config/default.toml", env!("CARGO_MANIFEST_DIR"))
}

#[tokio::test]
async fn test_scenario_opens_and_rehedges() {
    let app = Application::new(AppConfig::default()).unwrap();
    let account = app.strategy().account();

    let report = app.run_scenario().await.unwrap();

    // Option leg: 3 long calls held by the strategy account, no collateral.
    let option = &report.option_position;
    assert_eq!(option.option_type, OptionType::LongCall);
    assert_eq!(option.amount, Amount::new(dec!(3)));
    assert_eq!(option.collateral, Amount::ZERO);
    assert_eq!(option.state, PositionState::Active);
    assert_eq!(option.owner, account);

    // Futures leg: an off-chain delayed order with a keeper deposit.
    let order = &report.order_after_open;
    assert!(order.is_offchain);
    assert_eq!(order.target_round_id, 0);
    assert_eq!(order.commit_deposit, Amount::ZERO);
    assert!(order.keeper_deposit.is_positive());
    assert_eq!(order.size_delta, Size::new(dec!(0.44)));

    // Rehedge replaces the order without adding an option position.
    assert_eq!(report.order_after_rehedge.size_delta, Size::new(dec!(0.5)));
    assert_eq!(report.option_positions, 1);
    assert_eq!(report.total_positions, 1);
    assert_eq!(report.rehedged.option_position_id, report.opened.option_position_id);
    let position = app.strategy().position(PositionIndex::new(1)).unwrap();
    assert_eq!(position.hedge_count, 2);
    assert_eq!(report.margin_after_rehedge, report.rehedged.hedge.margin.required);

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scenario_with_keeper_execution() {
    let mut config = AppConfig::default();
    config.scenario.execute_keeper = true;
    let app = Application::new(config).unwrap();

    let report = app.run_scenario().await.unwrap();
    assert_eq!(report.keeper_executions, 1);
    assert_eq!(report.order_after_rehedge.size_delta, Size::new(dec!(0.5)));

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scenario_on_frozen_board_fails_with_invalid_strike() {
    let app = Application::new(AppConfig::default()).unwrap();
    app.chain().freeze_board(BoardId::new(20), true).unwrap();

    let err = app.run_scenario().await.unwrap_err();
    assert!(matches!(err, AppError::Hedge(HedgeError::InvalidStrikeId)));
    assert_eq!(app.strategy().total_position(), 0);

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_explore_options_lists_live_boards() {
    let app = Application::new(AppConfig::default()).unwrap();
    let report = app.explore_options().await.unwrap();

    // The expired board is not listed; the frozen one is.
    let ids: Vec<BoardId> = report.boards.iter().map(|b| b.board_id).collect();
    assert_eq!(ids, vec![BoardId::new(20), BoardId::new(21)]);

    let strike = report.boards[0]
        .strikes
        .iter()
        .find(|s| s.strike_id == StrikeId::new(308))
        .unwrap();
    assert_eq!(strike.strike_price, Price::new(dec!(1900)));
    assert_eq!(strike.delta, dec!(0.44));
    assert_eq!(strike.call_price, Price::new(dec!(56.8)));
    assert!(report.boards[0].expiry.is_some());

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_explore_futures_quotes_hedge_size() {
    let app = Application::new(AppConfig::default()).unwrap();
    let report = app.explore_futures().await.unwrap();

    assert_eq!(report.market_key, "sETHPERP");
    assert_eq!(report.sample_size, Size::new(dec!(0.44)));
    assert_eq!(report.fill_price, Price::new(dec!(1850.000407)));
    assert_eq!(report.fee_offchain, Amount::new(dec!(0.325600071632)));
    assert!(report.fee_atomic > report.fee_delayed);
    assert_eq!(report.required_margin, Amount::new(dec!(3774.652030423264)));

    app.shutdown().await.unwrap();
}

#[test]
fn test_margin_reads_are_idempotent() {
    tokio_test::block_on(async {
        let app = Application::new(AppConfig::default()).unwrap();
        let owner = AppConfig::default().scenario.owner;
        app.run_scenario().await.unwrap();

        let first = app.strategy().margin_of(owner).await.unwrap();
        let second = app.strategy().margin_of(owner).await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_positive());

        app.shutdown().await.unwrap();
    });
}

#[tokio::test]
async fn test_unknown_position_reads() {
    let app = Application::new(AppConfig::default()).unwrap();
    assert_eq!(app.strategy().position_index(1), OptionPositionId::NONE);
    assert_eq!(
        app.strategy()
            .position_synthetix(OptionPositionId::new(9999))
            .unwrap_err(),
        HedgeError::InvalidPosition
    );
    assert_eq!(
        app.strategy()
            .re_hedge(OptionPositionId::new(9999))
            .await
            .unwrap_err(),
        HedgeError::InvalidPosition
    );
    app.shutdown().await.unwrap();
}

#[test]
fn test_shipped_config_parses() {
    let config = AppConfig::from_file(&default_config_path()).unwrap();
    let defaults = AppConfig::default();
    assert_eq!(config.strategy.account, defaults.strategy.account);
    assert_eq!(config.scenario.owner, defaults.scenario.owner);
    assert_eq!(config.scenario.strike_id, StrikeId::new(308));
    assert_eq!(config.sim.perps.price, dec!(1850));
    assert_eq!(config.sim.options.boards.len(), 3);
}
