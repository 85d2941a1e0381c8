//! End-to-end backtest pipeline.
//!
//! bars → (Heikin-Ashi) → price source → StdFilter → ClutterFilter →
//! NonLagMA → SignalDetector → PositionSimulator → Summary.
//!
//! Configuration is validated before any bar is looked at.

use chrono::NaiveDateTime;

use super::error::NlmaError;
use super::heikin_ashi::heikin_ashi;
use super::metrics::Summary;
use super::ohlcv::{PriceBar, extract_prices, validate_bars};
use super::signal::{SignalCounts, SignalKind};
use super::simulator::{PositionSimulator, SimulationResult};
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
        }
    }
}

/// One row of the per-bar output.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub std_filtered: f64,
    pub clutter_filtered: f64,
    pub nonlagma: f64,
    pub signal: SignalKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub records: Vec<BarRecord>,
    pub simulation: SimulationResult,
    pub summary: Summary,
    pub signal_counts: SignalCounts,
}

pub fn run_backtest(
    bars: &[PriceBar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, NlmaError> {
    let chain = strategy.filter_chain()?;
    let simulator = PositionSimulator::new(config.initial_capital)?;
    validate_bars(bars)?;

    let source_bars = if strategy.heikin_ashi {
        heikin_ashi(bars)
    } else {
        bars.to_vec()
    };
    let timestamps: Vec<NaiveDateTime> = source_bars.iter().map(|b| b.timestamp).collect();
    let prices = extract_prices(&source_bars, strategy.price_source);

    tracing::info!(
        strategy = %strategy.name,
        bars = prices.len(),
        period = strategy.period,
        source = %strategy.price_source,
        heikin_ashi = strategy.heikin_ashi,
        "running backtest"
    );

    let filtered = chain.apply(&prices);

    let mut signal_counts = SignalCounts::default();
    let signals = strategy.detector().detect_with(
        &timestamps,
        &prices,
        &filtered.nonlagma,
        &mut signal_counts,
    );

    let simulation = simulator.run(&signals, &prices);
    let summary = Summary::compute(&simulation, &prices);

    tracing::info!(
        buys = signal_counts.buys,
        sells = signal_counts.sells,
        trades = simulation.trades.len(),
        final_equity = summary.final_equity,
        "backtest complete"
    );

    let records = signals
        .iter()
        .enumerate()
        .map(|(i, signal)| BarRecord {
            timestamp: signal.timestamp,
            price: prices[i],
            std_filtered: filtered.std_filtered[i],
            clutter_filtered: filtered.clutter_filtered[i],
            nonlagma: filtered.nonlagma[i],
            signal: signal.kind,
        })
        .collect();

    Ok(BacktestResult {
        records,
        simulation,
        summary,
        signal_counts,
    })
}
