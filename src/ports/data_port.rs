//! Market data access port trait.

use crate::domain::error::NlmaError;
use crate::domain::ohlcv::PriceBar;
use chrono::{NaiveDate, NaiveDateTime};

pub trait DataPort {
    /// Bars for `symbol` whose date falls inside the optional inclusive range,
    /// ordered by timestamp.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, NlmaError>;

    fn list_symbols(&self) -> Result<Vec<String>, NlmaError>;

    /// First timestamp, last timestamp and bar count, or `None` without data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, NlmaError>;
}
