//! Rolling standard-deviation outlier filter.
//!
//! A bar is accepted when |x[i] - mean| < threshold * std over the trailing
//! window of up to `period` samples ending at i. Rejected bars repeat the
//! last accepted value. Partial windows are used during warm-up, so every
//! bar has a defined statistic and the first bar is always accepted.
//!
//! std is the sample deviation (n-1 denominator); a one-sample window has
//! deviation 0, and a zero-deviation window accepts everything.

use crate::domain::error::NlmaError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Mean and sample deviation over the finite samples of `window`.
///
/// Returns `None` when the window holds no finite sample.
pub fn window_stats(window: &[f64]) -> Option<WindowStats> {
    let mut finite = window.iter().copied().filter(|v| v.is_finite());
    let shift = finite.next()?;

    // shifted sums keep a constant window at exactly zero deviation
    let (count, sum) = finite.fold((1usize, 0.0), |(n, s), v| (n + 1, s + (v - shift)));
    let mean = shift + sum / count as f64;

    let std_dev = if count < 2 {
        0.0
    } else {
        let ss: f64 = window
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum();
        (ss / (count - 1) as f64).sqrt()
    };

    Some(WindowStats { mean, std_dev })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StdFilter {
    period: usize,
    threshold: f64,
}

impl StdFilter {
    pub fn new(period: usize, threshold: f64) -> Result<Self, NlmaError> {
        if period == 0 {
            return Err(NlmaError::invalid(
                "strategy",
                "period",
                "period must be positive",
            ));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(NlmaError::invalid(
                "strategy",
                "std_threshold",
                "std_threshold must be non-negative",
            ));
        }
        Ok(Self { period, threshold })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accepts(&self, price: f64, stats: &WindowStats) -> bool {
        stats.std_dev == 0.0 || (price - stats.mean).abs() < self.threshold * stats.std_dev
    }

    pub fn apply(&self, prices: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(prices.len());
        let mut last_accepted: Option<f64> = None;
        let mut rejected = 0usize;

        for (i, &price) in prices.iter().enumerate() {
            let start = (i + 1).saturating_sub(self.period);
            let accepted = price.is_finite()
                && (last_accepted.is_none()
                    || window_stats(&prices[start..=i])
                        .is_some_and(|stats| self.accepts(price, &stats)));

            if accepted {
                last_accepted = Some(price);
                out.push(price);
            } else {
                rejected += 1;
                out.push(last_accepted.unwrap_or(f64::NAN));
            }
        }

        if rejected > 0 {
            tracing::debug!(
                rejected,
                period = self.period,
                threshold = self.threshold,
                "std filter forward-filled rejected bars"
            );
        }

        out
    }
}
