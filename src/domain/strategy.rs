//! NonLagMA strategy parameters.

use super::error::NlmaError;
use super::filter::{ClutterFilter, FilterChain, NonLagMa, StdFilter};
use super::ohlcv::PriceSource;
use super::signal::{SignalDetector, SignalMode};

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub period: usize,
    pub price_source: PriceSource,
    pub std_threshold: f64,
    pub filter_strength: f64,
    pub enable_std_filter: bool,
    pub enable_clutter_filter: bool,
    pub signal_mode: SignalMode,
    pub heikin_ashi: bool,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            name: "NonLagMA".into(),
            period: 25,
            price_source: PriceSource::Close,
            std_threshold: 0.1,
            filter_strength: 0.5,
            enable_std_filter: true,
            enable_clutter_filter: true,
            signal_mode: SignalMode::Both,
            heikin_ashi: false,
        }
    }
}

impl Strategy {
    /// Build the filter pipeline. Every parameter is checked, including those
    /// of disabled stages, so a bad config never waits for a flag flip.
    pub fn filter_chain(&self) -> Result<FilterChain, NlmaError> {
        let std_filter = StdFilter::new(self.period, self.std_threshold)?;
        let clutter = ClutterFilter::new(self.period, self.filter_strength)?;
        let nonlag = NonLagMa::new(self.period)?;

        Ok(FilterChain::new(
            self.enable_std_filter.then_some(std_filter),
            self.enable_clutter_filter.then_some(clutter),
            nonlag,
        ))
    }

    pub fn detector(&self) -> SignalDetector {
        SignalDetector::new(self.signal_mode)
    }
}
