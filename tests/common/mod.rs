#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use nlmatrader::domain::backtest::BacktestConfig;
use nlmatrader::domain::error::NlmaError;
pub use nlmatrader::domain::ohlcv::PriceBar;
use nlmatrader::domain::strategy::Strategy;
use nlmatrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), NlmaError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(NlmaError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, NlmaError> {
        self.check(symbol)?;
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| {
                let d = b.timestamp.date();
                start_date.is_none_or(|s| d >= s) && end_date.is_none_or(|e| d <= e)
            })
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, NlmaError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, NlmaError> {
        self.check(symbol)?;
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.timestamp).min().unwrap();
                let max = bars.iter().map(|b| b.timestamp).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

/// Flat bars (open = high = low = close) on consecutive days.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: day(i),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect()
}

/// Deterministic oscillating series with a slow drift.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = start_price + t * 0.05 + 5.0 * (t / 7.0).sin();
            PriceBar {
                timestamp: day(i),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
            }
        })
        .collect()
}

/// Filters disabled, so NonLagMA runs directly on price.
pub fn pass_through_strategy(period: usize) -> Strategy {
    Strategy {
        period,
        enable_std_filter: false,
        enable_clutter_filter: false,
        ..Strategy::default()
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 10_000.0,
    }
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},1000\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
