//! Heikin-Ashi bar synthesis.
//!
//! An alternative price source applied upstream of the filter pipeline:
//! HA close = ohlc4, HA open[0] = (open + close) / 2,
//! HA open[i] = (HA open[i-1] + HA close[i-1]) / 2,
//! HA high/low extend the raw high/low to cover HA open and close.

use super::ohlcv::PriceBar;

pub fn heikin_ashi(bars: &[PriceBar]) -> Vec<PriceBar> {
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());

    for bar in bars {
        let ha_close = bar.ohlc4();
        let ha_open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        out.push(PriceBar {
            timestamp: bar.timestamp,
            open: ha_open,
            high: bar.high.max(ha_open).max(ha_close),
            low: bar.low.min(ha_open).min(ha_close),
            close: ha_close,
        });
    }

    out
}
