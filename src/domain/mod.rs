//! Core domain types and logic: bars, filters, signals, simulation, metrics.

pub mod ohlcv;
pub mod heikin_ashi;
pub mod filter;
pub mod signal;
pub mod simulator;
pub mod metrics;
pub mod strategy;
pub mod backtest;
pub mod config_validation;
pub mod error;
