//! NonLagMA reference line.
//!
//! An ordinary exponential recursion with alpha = 2/(period+1) over the
//! clutter-filtered series. Its lag is reduced only because the input is
//! already smoothed; there is no separate lag-cancellation term.

use super::{ExponentialSmoother, FilterState, RecursiveFilter};
use crate::domain::error::NlmaError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonLagMa {
    period: usize,
    smoother: ExponentialSmoother,
}

impl NonLagMa {
    pub fn new(period: usize) -> Result<Self, NlmaError> {
        if period == 0 {
            return Err(NlmaError::invalid(
                "strategy",
                "period",
                "period must be positive",
            ));
        }
        Ok(Self {
            period,
            smoother: ExponentialSmoother::from_span(period),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn alpha(&self) -> f64 {
        self.smoother.alpha()
    }
}

impl RecursiveFilter for NonLagMa {
    fn step(&self, state: FilterState, sample: f64) -> (FilterState, f64) {
        self.smoother.step(state, sample)
    }
}
