//! Price / NonLagMA crossover detection.
//!
//! Per bar i > 0, comparing (price[i], ma[i]) with (price[i-1], ma[i-1]):
//! - Buy:  price[i] > ma[i] and price[i-1] <= ma[i-1]
//! - Sell: price[i] < ma[i] and price[i-1] >= ma[i-1]
//! - None: otherwise, or when any of the four values is undefined.
//!
//! Bar 0 has no predecessor and is always None.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalKind {
    Buy,
    Sell,
    #[default]
    None,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Buy => "buy",
            SignalKind::Sell => "sell",
            SignalKind::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub kind: SignalKind,
}

/// Which signal directions are kept; the others are reported as None.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalMode {
    #[default]
    Both,
    BuyOnly,
    SellOnly,
}

impl SignalMode {
    pub fn admits(&self, kind: SignalKind) -> bool {
        match (self, kind) {
            (_, SignalKind::None) => true,
            (SignalMode::Both, _) => true,
            (SignalMode::BuyOnly, SignalKind::Buy) => true,
            (SignalMode::SellOnly, SignalKind::Sell) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SignalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalMode::Both => "both",
            SignalMode::BuyOnly => "buy",
            SignalMode::SellOnly => "sell",
        };
        f.write_str(name)
    }
}

impl FromStr for SignalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(SignalMode::Both),
            "buy" => Ok(SignalMode::BuyOnly),
            "sell" => Ok(SignalMode::SellOnly),
            other => Err(format!(
                "unknown signal mode '{other}' (expected both, buy or sell)"
            )),
        }
    }
}

/// Hook notified of every Buy/Sell the detector emits.
pub trait SignalObserver {
    fn on_signal(&mut self, index: usize, signal: &Signal);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub buys: usize,
    pub sells: usize,
}

impl SignalObserver for SignalCounts {
    fn on_signal(&mut self, _index: usize, signal: &Signal) {
        match signal.kind {
            SignalKind::Buy => self.buys += 1,
            SignalKind::Sell => self.sells += 1,
            SignalKind::None => {}
        }
    }
}

/// The (price, ma) pair of the previous bar, if one has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossoverState {
    prev: Option<(f64, f64)>,
}

impl CrossoverState {
    pub fn previous(&self) -> Option<(f64, f64)> {
        self.prev
    }
}

/// Classify one bar against its predecessor.
pub fn classify(prev_price: f64, prev_ma: f64, price: f64, ma: f64) -> SignalKind {
    let defined = [prev_price, prev_ma, price, ma]
        .iter()
        .all(|v| v.is_finite());
    if !defined {
        return SignalKind::None;
    }

    if price > ma && prev_price <= prev_ma {
        SignalKind::Buy
    } else if price < ma && prev_price >= prev_ma {
        SignalKind::Sell
    } else {
        SignalKind::None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector {
    mode: SignalMode,
}

impl SignalDetector {
    pub fn new(mode: SignalMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    /// Advance one bar.
    pub fn step(&self, state: CrossoverState, price: f64, ma: f64) -> (CrossoverState, SignalKind) {
        let kind = match state.prev {
            Some((prev_price, prev_ma)) => classify(prev_price, prev_ma, price, ma),
            None => SignalKind::None,
        };
        let kind = if self.mode.admits(kind) {
            kind
        } else {
            SignalKind::None
        };
        (
            CrossoverState {
                prev: Some((price, ma)),
            },
            kind,
        )
    }

    pub fn detect(&self, timestamps: &[NaiveDateTime], prices: &[f64], ma: &[f64]) -> Vec<Signal> {
        self.detect_with(timestamps, prices, ma, &mut SignalCounts::default())
    }

    /// One signal per timestamp. A missing price or ma value counts as undefined.
    pub fn detect_with(
        &self,
        timestamps: &[NaiveDateTime],
        prices: &[f64],
        ma: &[f64],
        observer: &mut dyn SignalObserver,
    ) -> Vec<Signal> {
        let mut state = CrossoverState::default();
        let mut signals = Vec::with_capacity(timestamps.len());
        let mut counts = SignalCounts::default();

        for (i, &timestamp) in timestamps.iter().enumerate() {
            let price = prices.get(i).copied().unwrap_or(f64::NAN);
            let line = ma.get(i).copied().unwrap_or(f64::NAN);
            let (next, kind) = self.step(state, price, line);
            state = next;

            let signal = Signal { timestamp, kind };
            if kind != SignalKind::None {
                counts.on_signal(i, &signal);
                observer.on_signal(i, &signal);
            }
            signals.push(signal);
        }

        tracing::debug!(
            buys = counts.buys,
            sells = counts.sells,
            mode = %self.mode,
            "crossover signals detected"
        );
        signals
    }
}
