//! CSV report adapter.
//!
//! Writes three files next to the output path, named after its stem:
//! `<stem>_bars.csv` (per-bar series and signals), `<stem>_trades.csv`
//! and `<stem>_summary.csv`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::csv_adapter::format_timestamp;
use crate::domain::backtest::{BacktestResult, BarRecord};
use crate::domain::error::NlmaError;
use crate::domain::simulator::{EquityPoint, Trade};
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;

const BAR_HEADER: &[&str] = &[
    "timestamp",
    "price",
    "std_filtered",
    "clutter_filtered",
    "nonlagma",
    "signal",
    "equity",
];

const TRADE_HEADER: &[&str] = &["timestamp", "action", "price", "quantity", "cash_after"];

const SUMMARY_HEADER: &[&str] = &[
    "strategy",
    "period",
    "price_source",
    "signal_mode",
    "initial_capital",
    "final_equity",
    "profit",
    "cumulative_return",
    "max_drawdown",
    "sharpe_ratio",
    "buy_hold_return",
    "total_trades",
    "buy_signals",
    "sell_signals",
];

#[derive(Debug, Serialize)]
struct BarRow {
    timestamp: String,
    price: f64,
    std_filtered: f64,
    clutter_filtered: f64,
    nonlagma: f64,
    signal: String,
    equity: f64,
}

impl BarRow {
    fn new(record: &BarRecord, equity: Option<&EquityPoint>) -> Self {
        BarRow {
            timestamp: format_timestamp(&record.timestamp),
            price: record.price,
            std_filtered: record.std_filtered,
            clutter_filtered: record.clutter_filtered,
            nonlagma: record.nonlagma,
            signal: record.signal.to_string(),
            equity: equity.map(|p| p.equity).unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Serialize)]
struct TradeRow {
    timestamp: String,
    action: String,
    price: f64,
    quantity: u64,
    cash_after: f64,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        TradeRow {
            timestamp: format_timestamp(&trade.timestamp),
            action: trade.action.to_string(),
            price: trade.price,
            quantity: trade.quantity,
            cash_after: trade.cash_after,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    strategy: &'a str,
    period: usize,
    price_source: String,
    signal_mode: String,
    initial_capital: f64,
    final_equity: f64,
    profit: f64,
    cumulative_return: f64,
    max_drawdown: f64,
    sharpe_ratio: f64,
    buy_hold_return: f64,
    total_trades: usize,
    buy_signals: usize,
    sell_signals: usize,
}

/// Paths of the three report files derived from `output_path`.
pub fn report_paths(output_path: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let dir = output_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    (
        dir.join(format!("{stem}_bars.csv")),
        dir.join(format!("{stem}_trades.csv")),
        dir.join(format!("{stem}_summary.csv")),
    )
}

/// Headers are written up front so a file with no rows still has one.
fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), NlmaError> {
    let report_err = |e: csv::Error| NlmaError::Report {
        reason: format!("{}: {}", path.display(), e),
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(report_err)?;
    writer.write_record(header).map_err(report_err)?;
    for row in rows {
        writer.serialize(row).map_err(report_err)?;
    }
    writer.flush()?;
    Ok(())
}

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &Path,
    ) -> Result<(), NlmaError> {
        let (bars_path, trades_path, summary_path) = report_paths(output_path);

        if let Some(dir) = bars_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let equity = &result.simulation.equity_curve;
        write_rows(
            &bars_path,
            BAR_HEADER,
            result
                .records
                .iter()
                .enumerate()
                .map(|(i, rec)| BarRow::new(rec, equity.get(i))),
        )?;

        write_rows(
            &trades_path,
            TRADE_HEADER,
            result.simulation.trades.iter().map(TradeRow::from),
        )?;

        let summary = &result.summary;
        write_rows(
            &summary_path,
            SUMMARY_HEADER,
            [SummaryRow {
                strategy: &strategy.name,
                period: strategy.period,
                price_source: strategy.price_source.to_string(),
                signal_mode: strategy.signal_mode.to_string(),
                initial_capital: result.simulation.initial_capital,
                final_equity: summary.final_equity,
                profit: summary.profit,
                cumulative_return: summary.cumulative_return,
                max_drawdown: summary.max_drawdown,
                sharpe_ratio: summary.sharpe_ratio,
                buy_hold_return: summary.buy_hold_return,
                total_trades: summary.total_trades,
                buy_signals: result.signal_counts.buys,
                sell_signals: result.signal_counts.sells,
            }],
        )?;

        tracing::info!(
            bars = %bars_path.display(),
            trades = %trades_path.display(),
            summary = %summary_path.display(),
            "report written"
        );
        Ok(())
    }
}
