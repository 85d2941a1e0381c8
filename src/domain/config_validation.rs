//! Configuration validation.
//!
//! Every key is checked before a backtest runs. Missing optional keys fall
//! back to their defaults; present keys must parse and be in range.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::error::NlmaError;
use crate::domain::ohlcv::PriceSource;
use crate::domain::signal::SignalMode;
use crate::ports::config_port::ConfigPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

const STRATEGY_FLAGS: [&str; 3] = ["enable_std_filter", "enable_clutter_filter", "heikin_ashi"];

/// The symbol is resolved separately since it may come from the command line.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    validate_period(config)?;
    validate_std_threshold(config)?;
    validate_filter_strength(config)?;
    parse_value::<PriceSource>(config, "strategy", "price_source")?;
    parse_value::<SignalMode>(config, "strategy", "signal_mode")?;
    for key in STRATEGY_FLAGS {
        validate_flag(config, "strategy", key)?;
    }
    Ok(())
}

/// A present, non-blank value parsed as `T`; `None` when absent.
pub fn parse_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, NlmaError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| NlmaError::invalid(section, key, e.to_string())),
        _ => Ok(None),
    }
}

/// Optional `YYYY-MM-DD` date.
pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, NlmaError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                NlmaError::invalid(
                    section,
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
        _ => Ok(None),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    if let Some(value) = parse_value::<f64>(config, "backtest", "initial_capital")? {
        if !value.is_finite() || value <= 0.0 {
            return Err(NlmaError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    let start = parse_date(config, "backtest", "start_date")?;
    let end = parse_date(config, "backtest", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(NlmaError::invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    if let Some(period) = parse_value::<i64>(config, "strategy", "period")? {
        if period < 1 {
            return Err(NlmaError::invalid(
                "strategy",
                "period",
                "period must be a positive integer",
            ));
        }
    }
    Ok(())
}

fn validate_std_threshold(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    if let Some(value) = parse_value::<f64>(config, "strategy", "std_threshold")? {
        if !value.is_finite() || value < 0.0 {
            return Err(NlmaError::invalid(
                "strategy",
                "std_threshold",
                "std_threshold must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_filter_strength(config: &dyn ConfigPort) -> Result<(), NlmaError> {
    if let Some(value) = parse_value::<f64>(config, "strategy", "filter_strength")? {
        if !value.is_finite() || value <= 0.0 {
            return Err(NlmaError::invalid(
                "strategy",
                "filter_strength",
                "filter_strength must be positive",
            ));
        }
    }
    Ok(())
}

/// An unrecognised boolean reads back as whichever default is supplied.
fn validate_flag(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), NlmaError> {
    let present = config
        .get_string(section, key)
        .is_some_and(|raw| !raw.trim().is_empty());
    if present && config.get_bool(section, key, true) != config.get_bool(section, key, false) {
        return Err(NlmaError::invalid(
            section,
            key,
            format!("{key} must be true or false"),
        ));
    }
    Ok(())
}
