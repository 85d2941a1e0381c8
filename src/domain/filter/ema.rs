//! Exponential recursion shared by the clutter filter and NonLagMA.
//!
//! alpha = 2/(span+1), y[0] = x[0], y[i] = alpha*x[i] + (1-alpha)*y[i-1].
//! Unlike a charting EMA there is no SMA seed and no warm-up: bar 0 is its
//! own output.

use super::{FilterState, RecursiveFilter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    alpha: f64,
}

impl ExponentialSmoother {
    /// `span` below 1 is treated as 1 (alpha = 1, pass-through).
    pub fn from_span(span: usize) -> Self {
        let span = span.max(1);
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl RecursiveFilter for ExponentialSmoother {
    fn step(&self, state: FilterState, sample: f64) -> (FilterState, f64) {
        // missing samples leave the carried value untouched
        if !sample.is_finite() {
            return (state, state.value().unwrap_or(f64::NAN));
        }

        // prev + alpha*(x - prev) is alpha*x + (1-alpha)*prev rearranged;
        // it keeps a constant input exactly constant.
        let next = match state.value() {
            None => sample,
            Some(prev) => prev + self.alpha * (sample - prev),
        };
        (FilterState::seeded(next), next)
    }
}
