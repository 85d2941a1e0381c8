//! Performance summary of a simulated equity curve.
//!
//! Ratios are computed on equity normalised by initial capital. Undefined
//! values (leading warm-up bars, non-finite equity) are dropped, never
//! treated as zero.

use super::simulator::{EquityPoint, SimulationResult};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub cumulative_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub final_equity: f64,
    pub profit: f64,
    pub total_trades: usize,
    pub buy_hold_return: f64,
}

impl Summary {
    /// `prices` is the series the simulator traded at, used for the
    /// buy-and-hold benchmark.
    pub fn compute(result: &SimulationResult, prices: &[f64]) -> Self {
        let normalized = normalized_equity(&result.equity_curve, result.initial_capital);
        let returns = strategy_returns(&normalized);

        let final_equity = result.final_equity();

        Summary {
            cumulative_return: cumulative_return(&normalized),
            max_drawdown: max_drawdown(&normalized),
            sharpe_ratio: sharpe_ratio(&returns),
            final_equity,
            profit: final_equity - result.initial_capital,
            total_trades: result.trades.len(),
            buy_hold_return: buy_hold_return(prices),
        }
    }
}

/// equity / capital, keeping only defined points.
pub fn normalized_equity(curve: &[EquityPoint], initial_capital: f64) -> Vec<f64> {
    if initial_capital <= 0.0 {
        return Vec::new();
    }
    curve
        .iter()
        .map(|p| p.equity / initial_capital)
        .filter(|v| v.is_finite())
        .collect()
}

/// return[i] = equity[i]/equity[i-1] - 1; the first bar has no return.
pub fn strategy_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

pub fn cumulative_return(normalized: &[f64]) -> f64 {
    normalized.last().map(|v| v - 1.0).unwrap_or(0.0)
}

pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// mean / sample std * sqrt(252); 0 when the deviation is 0 or undefined.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let shift = returns[0];
    let mean = shift + returns.iter().map(|r| r - shift).sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// price[last]/price[first] - 1 over the defined prices.
pub fn buy_hold_return(prices: &[f64]) -> f64 {
    let mut defined = prices.iter().copied().filter(|p| p.is_finite() && *p > 0.0);
    match (defined.next(), defined.last()) {
        (Some(first), Some(last)) => last / first - 1.0,
        _ => 0.0,
    }
}
