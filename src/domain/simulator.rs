//! Single-asset long-only position simulator.
//!
//! Buy spends cash on whole units while `cash > price`; Sell liquidates the
//! whole holding. Neither ever opens a short, and both are silent no-ops when
//! they cannot act (insufficient cash, or nothing held).

use chrono::NaiveDateTime;
use std::fmt;

use super::error::NlmaError;
use super::signal::{Signal, SignalKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub quantity: u64,
    pub cash: f64,
}

impl Position {
    pub fn flat(cash: f64) -> Self {
        Position { quantity: 0, cash }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("buy"),
            TradeAction::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: u64,
    pub cash_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub initial_capital: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_position: Position,
}

impl SimulationResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }

    pub fn profit(&self) -> f64 {
        self.final_equity() - self.initial_capital
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSimulator {
    initial_capital: f64,
}

impl PositionSimulator {
    pub fn new(initial_capital: f64) -> Result<Self, NlmaError> {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(NlmaError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        Ok(Self { initial_capital })
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn initial_position(&self) -> Position {
        Position::flat(self.initial_capital)
    }

    /// Apply one bar's signal. Bars without a usable price never trade.
    pub fn step(
        &self,
        position: Position,
        timestamp: NaiveDateTime,
        price: f64,
        kind: SignalKind,
    ) -> (Position, Option<Trade>) {
        if !price.is_finite() || price <= 0.0 {
            return (position, None);
        }

        match kind {
            SignalKind::Buy if position.cash > price => {
                let mut quantity = (position.cash / price).floor() as u64;
                // division can round up across an integer boundary
                if quantity as f64 * price > position.cash {
                    quantity -= 1;
                }
                // the holding is capped at u64::MAX units
                let quantity = quantity.min(u64::MAX - position.quantity);
                if quantity == 0 {
                    return (position, None);
                }

                let cost = quantity as f64 * price;
                let next = Position {
                    quantity: position.quantity + quantity,
                    cash: position.cash - cost,
                };
                let trade = Trade {
                    timestamp,
                    action: TradeAction::Buy,
                    price,
                    quantity,
                    cash_after: next.cash,
                };
                (next, Some(trade))
            }
            SignalKind::Sell if position.is_long() => {
                let next = Position::flat(position.cash + position.market_value(price));
                let trade = Trade {
                    timestamp,
                    action: TradeAction::Sell,
                    price,
                    quantity: position.quantity,
                    cash_after: next.cash,
                };
                (next, Some(trade))
            }
            _ => (position, None),
        }
    }

    /// Run every bar in order. Equity is marked at the latest usable price.
    pub fn run(&self, signals: &[Signal], prices: &[f64]) -> SimulationResult {
        let mut position = self.initial_position();
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(signals.len());
        let mut mark: Option<f64> = None;

        for (i, signal) in signals.iter().enumerate() {
            let price = prices.get(i).copied().unwrap_or(f64::NAN);
            let (next, trade) = self.step(position, signal.timestamp, price, signal.kind);
            position = next;

            if let Some(trade) = trade {
                tracing::debug!(
                    action = %trade.action,
                    price = trade.price,
                    quantity = trade.quantity,
                    cash_after = trade.cash_after,
                    "trade executed"
                );
                trades.push(trade);
            }

            if price.is_finite() {
                mark = Some(price);
            }
            let equity = match mark {
                Some(p) => position.equity(p),
                None => position.cash,
            };
            equity_curve.push(EquityPoint {
                timestamp: signal.timestamp,
                equity,
            });
        }

        SimulationResult {
            initial_capital: self.initial_capital,
            trades,
            equity_curve,
            final_position: position,
        }
    }
}
