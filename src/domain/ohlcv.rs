//! OHLC bar representation and price-source selection.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use super::error::NlmaError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// (high + low) / 2
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// (open + high + low + close) / 4
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    pub fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Open => self.open,
            PriceSource::High => self.high,
            PriceSource::Low => self.low,
            PriceSource::Close => self.close,
            PriceSource::Hl2 => self.hl2(),
            PriceSource::Hlc3 => self.typical_price(),
            PriceSource::Ohlc4 => self.ohlc4(),
        }
    }
}

/// Which scalar of a bar feeds the filter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    Hl2,
    Hlc3,
    Ohlc4,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceSource::Open => "open",
            PriceSource::High => "high",
            PriceSource::Low => "low",
            PriceSource::Close => "close",
            PriceSource::Hl2 => "hl2",
            PriceSource::Hlc3 => "hlc3",
            PriceSource::Ohlc4 => "ohlc4",
        };
        f.write_str(name)
    }
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceSource::Open),
            "high" => Ok(PriceSource::High),
            "low" => Ok(PriceSource::Low),
            "close" => Ok(PriceSource::Close),
            "hl2" => Ok(PriceSource::Hl2),
            "hlc3" => Ok(PriceSource::Hlc3),
            "ohlc4" => Ok(PriceSource::Ohlc4),
            other => Err(format!(
                "unknown price source '{other}' (expected open, high, low, close, hl2, hlc3 or ohlc4)"
            )),
        }
    }
}

/// Select one scalar per bar.
pub fn extract_prices(bars: &[PriceBar], source: PriceSource) -> Vec<f64> {
    bars.iter().map(|b| b.price(source)).collect()
}

/// A series must hold at least one bar and strictly increasing timestamps.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), NlmaError> {
    if bars.is_empty() {
        return Err(NlmaError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }

    if let Some(pos) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(NlmaError::UnorderedTimestamps { index: pos + 1 });
    }

    Ok(())
}
