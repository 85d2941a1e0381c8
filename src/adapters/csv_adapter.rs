//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row and columns
//! `date,open,high,low,close` (further columns such as volume are ignored).

use crate::domain::error::NlmaError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Accepts a plain date (midnight) or a date with time of day.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Daily bars print as a plain date, intraday bars with their time.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, NlmaError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| NlmaError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| NlmaError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = row + 2;

            let date_str = record.get(0).ok_or_else(|| NlmaError::Data {
                reason: format!("line {line}: missing date column"),
            })?;
            let timestamp = parse_timestamp(date_str).ok_or_else(|| NlmaError::Data {
                reason: format!("line {line}: invalid timestamp '{date_str}'"),
            })?;

            bars.push(PriceBar {
                timestamp,
                open: price_field(&record, 1, "open", line)?,
                high: price_field(&record, 2, "high", line)?,
                low: price_field(&record, 3, "low", line)?,
                close: price_field(&record, 4, "close", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn price_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, NlmaError> {
    record
        .get(index)
        .ok_or_else(|| NlmaError::Data {
            reason: format!("line {line}: missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| NlmaError::Data {
            reason: format!("line {line}: invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, NlmaError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| {
                let date = b.timestamp.date();
                start_date.is_none_or(|s| date >= s) && end_date.is_none_or(|e| date <= e)
            })
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, NlmaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| NlmaError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| NlmaError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, NlmaError> {
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
