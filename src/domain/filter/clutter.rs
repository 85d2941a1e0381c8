//! Clutter filter: exponential smoothing of the std-filtered series.
//!
//! span = max(1, round(period * filter_strength)), halves to even, alpha = 2/(span+1).

use super::{ExponentialSmoother, FilterState, RecursiveFilter};
use crate::domain::error::NlmaError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClutterFilter {
    span: usize,
    smoother: ExponentialSmoother,
}

impl ClutterFilter {
    pub fn new(period: usize, filter_strength: f64) -> Result<Self, NlmaError> {
        if period == 0 {
            return Err(NlmaError::invalid(
                "strategy",
                "period",
                "period must be positive",
            ));
        }
        if !filter_strength.is_finite() || filter_strength <= 0.0 {
            return Err(NlmaError::invalid(
                "strategy",
                "filter_strength",
                "filter_strength must be positive",
            ));
        }

        let span = Self::span_for(period, filter_strength);
        Ok(Self {
            span,
            smoother: ExponentialSmoother::from_span(span),
        })
    }

    pub fn span_for(period: usize, filter_strength: f64) -> usize {
        ((period as f64 * filter_strength).round_ties_even() as usize).max(1)
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn alpha(&self) -> f64 {
        self.smoother.alpha()
    }
}

impl RecursiveFilter for ClutterFilter {
    fn step(&self, state: FilterState, sample: f64) -> (FilterState, f64) {
        self.smoother.step(state, sample)
    }
}
