//! Prometheus metrics for the Strands hedged-position manager.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup configuration error. These
//! panics only happen during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, register_histogram_vec,
    register_int_gauge, Counter, CounterVec, GaugeVec, HistogramVec, IntGauge,
};

/// Hedged positions opened.
/// Labels: strike_id
pub static POSITIONS_OPENED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "strands_positions_opened_total",
        "Total hedged positions opened",
        &["strike_id"]
    )
    .unwrap()
});

/// Positions currently tracked by the strategy.
pub static POSITIONS_TRACKED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "strands_positions_tracked",
        "Hedged positions tracked by the strategy"
    )
    .unwrap()
});

/// Rehedges submitted.
/// Labels: strike_id
pub static REHEDGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "strands_rehedges_total",
        "Total rehedge orders submitted",
        &["strike_id"]
    )
    .unwrap()
});

/// Rejected operations.
/// Labels: operation (open/rehedge), reason (error name)
pub static REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "strands_rejections_total",
        "Total rejected hedging operations",
        &["operation", "reason"]
    )
    .unwrap()
});

/// Margin pulled from owners into the futures account.
pub static MARGIN_DEPOSITED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "strands_margin_deposited_total",
        "Total margin deposited into the futures account"
    )
    .unwrap()
});

/// Futures size delta of the latest hedge order.
/// Labels: option_position_id
pub static HEDGE_DELTA: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "strands_hedge_delta",
        "Futures size delta of the latest hedge order per option position",
        &["option_position_id"]
    )
    .unwrap()
});

/// Wall time of a hedging operation, collaborator calls included.
pub static OPERATION_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "strands_operation_duration_ms",
        "Hedging operation duration in milliseconds",
        &["operation"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a hedged position opened.
    pub fn position_opened(strike_id: &str) {
        POSITIONS_OPENED_TOTAL.with_label_values(&[strike_id]).inc();
    }

    /// Set the number of tracked positions.
    pub fn positions_tracked(count: usize) {
        POSITIONS_TRACKED.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record a rehedge order.
    pub fn rehedged(strike_id: &str) {
        REHEDGES_TOTAL.with_label_values(&[strike_id]).inc();
    }

    /// Record a rejected operation.
    pub fn rejected(operation: &str, reason: &str) {
        REJECTIONS_TOTAL
            .with_label_values(&[operation, reason])
            .inc();
    }

    /// Record margin deposited. Non-positive amounts are ignored.
    pub fn margin_deposited(amount: f64) {
        if amount > 0.0 {
            MARGIN_DEPOSITED_TOTAL.inc_by(amount);
        }
    }

    /// Record the latest hedge delta of an option position.
    pub fn hedge_delta(option_position_id: &str, delta: f64) {
        HEDGE_DELTA
            .with_label_values(&[option_position_id])
            .set(delta);
    }

    /// Record an operation duration.
    pub fn operation_duration(operation: &str, duration_ms: f64) {
        OPERATION_DURATION_MS
            .with_label_values(&[operation])
            .observe(duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_counter_increments() {
        let before = REJECTIONS_TOTAL
            .with_label_values(&["open", "InvalidAmount"])
            .get();
        Metrics::rejected("open", "InvalidAmount");
        let after = REJECTIONS_TOTAL
            .with_label_values(&["open", "InvalidAmount"])
            .get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_margin_deposited_ignores_non_positive() {
        let before = MARGIN_DEPOSITED_TOTAL.get();
        Metrics::margin_deposited(0.0);
        Metrics::margin_deposited(-3.0);
        assert!(MARGIN_DEPOSITED_TOTAL.get() >= before);
        Metrics::margin_deposited(2.5);
        assert!(MARGIN_DEPOSITED_TOTAL.get() >= before + 2.5);
    }

    #[test]
    fn test_hedge_delta_gauge() {
        Metrics::hedge_delta("test-77", 0.44);
        let value = HEDGE_DELTA.with_label_values(&["test-77"]).get();
        assert!((value - 0.44).abs() < 1e-9);
    }
}
