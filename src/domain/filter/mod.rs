//! Filter pipeline producing the NonLagMA reference line.
//!
//! - `StdFilter`: rolling mean/deviation band, rejected bars forward-filled
//! - `ClutterFilter`: exponential smoothing with span = round(period * strength)
//! - `NonLagMa`: second exponential recursion with alpha = 2/(period+1)
//!
//! Every stage preserves length and bar alignment. The two exponential stages
//! implement [`RecursiveFilter`], so they can be driven one bar at a time with
//! an explicit [`FilterState`] as well as over a whole series.

pub mod clutter;
pub mod ema;
pub mod nonlag_ma;
pub mod std_filter;

pub use clutter::ClutterFilter;
pub use ema::ExponentialSmoother;
pub use nonlag_ma::NonLagMa;
pub use std_filter::StdFilter;

/// The single carried value of an exponential recursion.
///
/// Empty until the first finite sample has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterState {
    last: Option<f64>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(value: f64) -> Self {
        Self { last: Some(value) }
    }

    pub fn value(&self) -> Option<f64> {
        self.last
    }
}

/// A filter whose output depends on the previous output and the current sample.
pub trait RecursiveFilter {
    /// Advance one bar. Returns the new state and this bar's output.
    fn step(&self, state: FilterState, sample: f64) -> (FilterState, f64);

    /// Fold `step` over a whole series starting from an empty state.
    fn apply(&self, input: &[f64]) -> Vec<f64> {
        input
            .iter()
            .scan(FilterState::new(), |state, &sample| {
                let (next, out) = self.step(*state, sample);
                *state = next;
                Some(out)
            })
            .collect()
    }
}

/// Intermediate and final series of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub std_filtered: Vec<f64>,
    pub clutter_filtered: Vec<f64>,
    pub nonlagma: Vec<f64>,
}

/// StdFilter → ClutterFilter → NonLagMA, with the first two stages optional.
///
/// A disabled stage passes its input through unchanged.
#[derive(Debug, Clone)]
pub struct FilterChain {
    std_filter: Option<StdFilter>,
    clutter: Option<ClutterFilter>,
    nonlag: NonLagMa,
}

impl FilterChain {
    pub fn new(
        std_filter: Option<StdFilter>,
        clutter: Option<ClutterFilter>,
        nonlag: NonLagMa,
    ) -> Self {
        Self {
            std_filter,
            clutter,
            nonlag,
        }
    }

    pub fn apply(&self, prices: &[f64]) -> FilterOutput {
        let std_filtered = match &self.std_filter {
            Some(f) => f.apply(prices),
            None => prices.to_vec(),
        };
        let clutter_filtered = match &self.clutter {
            Some(f) => f.apply(&std_filtered),
            None => std_filtered.clone(),
        };
        let nonlagma = self.nonlag.apply(&clutter_filtered);

        FilterOutput {
            std_filtered,
            clutter_filtered,
            nonlagma,
        }
    }
}
