//! Integration tests for the backtest pipeline.
//!
//! Tests cover:
//! - Full pipeline with a mock data port and a known trade sequence
//! - Constant-price invariance and equity bookkeeping
//! - Outlier rejection by the std filter inside the full chain
//! - Signal modes and the Heikin-Ashi transform
//! - Report port receives the result
//! - CSV data adapter feeding the pipeline

mod common;

use approx::assert_relative_eq;
use common::*;
use nlmatrader::adapters::csv_adapter::CsvAdapter;
use nlmatrader::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use nlmatrader::domain::error::NlmaError;
use nlmatrader::domain::signal::{SignalKind, SignalMode};
use nlmatrader::domain::simulator::TradeAction;
use nlmatrader::domain::strategy::Strategy;
use nlmatrader::ports::data_port::DataPort;
use nlmatrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

const REFERENCE_PRICES: [f64; 9] = [10.0, 10.0, 10.0, 12.0, 12.0, 12.0, 8.0, 8.0, 8.0];

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn full_pipeline_with_mock_data_port() {
        let port = MockDataPort::new().with_bars("SPY", make_bars(&REFERENCE_PRICES));

        let bars = port.fetch_bars("SPY", None, None).unwrap();
        let config = BacktestConfig {
            initial_capital: 100.0,
        };
        let result = run_backtest(&bars, &pass_through_strategy(5), &config).unwrap();

        let kinds: Vec<SignalKind> = result.records.iter().map(|r| r.signal).collect();
        assert_eq!(kinds[3], SignalKind::Buy);
        assert_eq!(kinds[6], SignalKind::Sell);
        assert_eq!(
            kinds.iter().filter(|k| **k != SignalKind::None).count(),
            2
        );

        let trades = &result.simulation.trades;
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].action, TradeAction::Buy);
        assert_eq!(trades[0].quantity, 8);
        assert_relative_eq!(trades[0].cash_after, 4.0, epsilon = 1e-9);
        assert_eq!(trades[1].action, TradeAction::Sell);
        assert_relative_eq!(trades[1].cash_after, 68.0, epsilon = 1e-9);

        assert_relative_eq!(result.summary.final_equity, 68.0, epsilon = 1e-9);
        assert_relative_eq!(result.summary.profit, -32.0, epsilon = 1e-9);
        assert_relative_eq!(result.summary.cumulative_return, -0.32, epsilon = 1e-9);
        assert_relative_eq!(result.summary.buy_hold_return, -0.2, epsilon = 1e-9);
    }

    #[test]
    fn date_range_limits_bars() {
        let port = MockDataPort::new().with_bars("SPY", generate_bars(60, 100.0));

        let bars = port
            .fetch_bars("SPY", Some(date(2024, 1, 11)), Some(date(2024, 1, 20)))
            .unwrap();
        assert_eq!(bars.len(), 10);

        let result = run_backtest(&bars, &Strategy::default(), &sample_config()).unwrap();
        assert_eq!(result.records.len(), 10);
        assert_eq!(result.records[0].timestamp, day(10));
    }

    #[test]
    fn fetch_error_propagates() {
        let port = MockDataPort::new().with_error("BAD", "corrupt file");
        let err = port.fetch_bars("BAD", None, None).unwrap_err();
        assert!(matches!(err, NlmaError::Data { .. }));
    }

    #[test]
    fn unordered_bars_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.swap(1, 2);
        let err = run_backtest(&bars, &Strategy::default(), &sample_config()).unwrap_err();
        assert!(matches!(err, NlmaError::UnorderedTimestamps { index: 2 }));
    }
}

mod invariants {
    use super::*;

    #[test]
    fn constant_series_never_trades() {
        let bars = make_bars(&[50.0; 120]);
        let result = run_backtest(&bars, &Strategy::default(), &sample_config()).unwrap();

        for rec in &result.records {
            assert_eq!(rec.std_filtered, 50.0);
            assert_eq!(rec.clutter_filtered, 50.0);
            assert_eq!(rec.nonlagma, 50.0);
            assert_eq!(rec.signal, SignalKind::None);
        }
        assert!(result.simulation.trades.is_empty());
        for point in &result.simulation.equity_curve {
            assert_eq!(point.equity, 10_000.0);
        }
        assert_eq!(result.summary.cumulative_return, 0.0);
        assert_eq!(result.summary.max_drawdown, 0.0);
        assert_eq!(result.summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn series_lengths_align() {
        let bars = generate_bars(150, 100.0);
        let result = run_backtest(&bars, &Strategy::default(), &sample_config()).unwrap();
        assert_eq!(result.records.len(), 150);
        assert_eq!(result.simulation.equity_curve.len(), 150);
        assert_eq!(result.records[0].signal, SignalKind::None);
    }

    #[test]
    fn trades_alternate_and_never_overdraw() {
        let bars = generate_bars(300, 100.0);
        let result = run_backtest(&bars, &pass_through_strategy(10), &sample_config()).unwrap();
        let trades = &result.simulation.trades;
        assert!(!trades.is_empty());

        let mut held = 0u64;
        for trade in trades {
            assert!(trade.cash_after >= 0.0);
            match trade.action {
                TradeAction::Buy => held += trade.quantity,
                TradeAction::Sell => {
                    assert_eq!(trade.quantity, held);
                    held = 0;
                }
            }
        }
        assert_eq!(held, result.simulation.final_position.quantity);
    }

    #[test]
    fn final_equity_is_cash_plus_holding() {
        let bars = generate_bars(200, 100.0);
        let result = run_backtest(&bars, &pass_through_strategy(8), &sample_config()).unwrap();

        let last_price = result.records.last().unwrap().price;
        let pos = result.simulation.final_position;
        assert_relative_eq!(
            result.summary.final_equity,
            pos.cash + pos.quantity as f64 * last_price,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            result.summary.profit,
            result.summary.final_equity - 10_000.0,
            epsilon = 1e-9
        );
        assert_eq!(result.summary.total_trades, result.simulation.trades.len());
    }

    #[test]
    fn runs_are_deterministic() {
        let bars = generate_bars(250, 80.0);
        let strategy = Strategy::default();
        let a = run_backtest(&bars, &strategy, &sample_config()).unwrap();
        let b = run_backtest(&bars, &strategy, &sample_config()).unwrap();
        assert_eq!(a, b);
    }
}

mod outlier_rejection {
    use super::*;

    #[test]
    fn spike_is_forward_filled_and_never_reaches_the_average() {
        let mut prices = vec![100.0; 10];
        prices.push(150.0);
        prices.extend([100.0; 5]);
        let strategy = Strategy {
            period: 10,
            std_threshold: 1.0,
            enable_clutter_filter: false,
            ..Strategy::default()
        };

        let result = run_backtest(&make_bars(&prices), &strategy, &sample_config()).unwrap();

        assert_eq!(result.records[10].price, 150.0);
        assert_eq!(result.records[10].std_filtered, 100.0);
        for rec in &result.records {
            assert_eq!(rec.nonlagma, 100.0);
        }
    }

    #[test]
    fn disabled_filter_lets_spike_through() {
        let mut prices = vec![100.0; 10];
        prices.push(150.0);
        let strategy = Strategy {
            period: 10,
            enable_std_filter: false,
            enable_clutter_filter: false,
            ..Strategy::default()
        };

        let result = run_backtest(&make_bars(&prices), &strategy, &sample_config()).unwrap();
        assert_eq!(result.records[10].std_filtered, 150.0);
        assert!(result.records[10].nonlagma > 100.0);
    }
}

mod signal_modes {
    use super::*;

    fn run_with_mode(mode: SignalMode) -> BacktestResult {
        let strategy = Strategy {
            signal_mode: mode,
            ..pass_through_strategy(10)
        };
        run_backtest(&generate_bars(300, 100.0), &strategy, &sample_config()).unwrap()
    }

    #[test]
    fn both_emits_buys_and_sells() {
        let result = run_with_mode(SignalMode::Both);
        assert!(result.signal_counts.buys > 0);
        assert!(result.signal_counts.sells > 0);
    }

    #[test]
    fn buy_only_never_sells() {
        let both = run_with_mode(SignalMode::Both);
        let result = run_with_mode(SignalMode::BuyOnly);

        assert_eq!(result.signal_counts.sells, 0);
        assert_eq!(result.signal_counts.buys, both.signal_counts.buys);
        assert!(
            result
                .simulation
                .trades
                .iter()
                .all(|t| t.action == TradeAction::Buy)
        );
    }

    #[test]
    fn sell_only_never_trades_from_flat() {
        let result = run_with_mode(SignalMode::SellOnly);
        assert_eq!(result.signal_counts.buys, 0);
        assert!(result.signal_counts.sells > 0);
        assert!(result.simulation.trades.is_empty());
    }
}

mod heikin_ashi_pipeline {
    use super::*;

    #[test]
    fn heikin_ashi_changes_price_series() {
        let bars = generate_bars(100, 100.0);
        let plain = run_backtest(&bars, &Strategy::default(), &sample_config()).unwrap();
        let ha = run_backtest(
            &bars,
            &Strategy {
                heikin_ashi: true,
                ..Strategy::default()
            },
            &sample_config(),
        )
        .unwrap();

        assert_eq!(ha.records.len(), plain.records.len());
        assert_ne!(ha.records[5].price, plain.records[5].price);
        for (a, b) in ha.records.iter().zip(&plain.records) {
            assert_eq!(a.timestamp, b.timestamp);
        }
    }
}

struct MockReportPort {
    calls: RefCell<Vec<(BacktestResult, Strategy, PathBuf)>>,
}

impl MockReportPort {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &Path,
    ) -> Result<(), NlmaError> {
        self.calls.borrow_mut().push((
            result.clone(),
            strategy.clone(),
            output_path.to_path_buf(),
        ));
        Ok(())
    }
}

mod report_generation {
    use super::*;

    #[test]
    fn report_receives_result_and_strategy() {
        let bars = make_bars(&REFERENCE_PRICES);
        let strategy = Strategy {
            name: "Reference".into(),
            ..pass_through_strategy(5)
        };
        let config = BacktestConfig {
            initial_capital: 100.0,
        };
        let result = run_backtest(&bars, &strategy, &config).unwrap();

        let report = MockReportPort::new();
        report
            .write(&result, &strategy, Path::new("out/reference"))
            .expect("report write should succeed");

        let calls = report.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (ref res, ref strat, ref path) = calls[0];
        assert_eq!(strat.name, "Reference");
        assert_eq!(strat.period, 5);
        assert_eq!(res.simulation.trades.len(), 2);
        assert_eq!(res.simulation.equity_curve.len(), 9);
        assert_eq!(path, Path::new("out/reference"));
    }
}

mod csv_data_source {
    use super::*;

    #[test]
    fn pipeline_over_csv_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = make_bars(&REFERENCE_PRICES);
        write_csv(dir.path(), "REF", &bars);

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["REF"]);

        let loaded = adapter.fetch_bars("REF", None, None).unwrap();
        assert_eq!(loaded, bars);

        let config = BacktestConfig {
            initial_capital: 100.0,
        };
        let result = run_backtest(&loaded, &pass_through_strategy(5), &config).unwrap();
        assert_relative_eq!(result.summary.final_equity, 68.0, epsilon = 1e-9);
    }
}
