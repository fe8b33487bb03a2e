//! Configuration validation.
//!
//! Checks the `[backtest]` and `[strategy]` sections before a run starts.

use crate::domain::error::ProbtraderError;
use crate::domain::strategy::STRATEGY_NAMES;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const BACKTEST_SECTION: &str = "backtest";
pub const STRATEGY_SECTION: &str = "strategy";

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1000.0;
pub const DEFAULT_FEE_RATE: f64 = 0.0;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    validate_initial_capital(config)?;
    validate_fee_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

/// Strategy name from the command line, else from `[strategy] name`.
pub fn resolve_strategy_name(
    config: Option<&dyn ConfigPort>,
    cli_name: Option<&str>,
) -> Result<String, ProbtraderError> {
    let name = cli_name
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string(STRATEGY_SECTION, "name")))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProbtraderError::ConfigMissing {
            section: STRATEGY_SECTION.to_string(),
            key: "name".to_string(),
        })?;
    validate_strategy_name(&name)?;
    Ok(name)
}

pub fn validate_strategy_name(name: &str) -> Result<(), ProbtraderError> {
    if STRATEGY_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(ProbtraderError::UnknownStrategy {
            name: name.to_string(),
        })
    }
}

/// A numeric `[backtest]` key. Absent keys take `default`; present but
/// unparseable values are an error rather than a silent fallback.
pub(crate) fn backtest_number(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<f64, ProbtraderError> {
    match config.get_string(BACKTEST_SECTION, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(key, format!("{key} must be a number, got {raw:?}"))),
    }
}

/// An optional `YYYY-MM-DD` `[backtest]` key.
pub(crate) fn backtest_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, ProbtraderError> {
    config
        .get_string(BACKTEST_SECTION, key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| invalid(key, format!("invalid {key} format, expected YYYY-MM-DD")))
        })
        .transpose()
}

fn invalid(key: &str, reason: String) -> ProbtraderError {
    ProbtraderError::ConfigInvalid {
        section: BACKTEST_SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = backtest_number(config, "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if value <= 0.0 {
        return Err(invalid(
            "initial_capital",
            "initial_capital must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = backtest_number(config, "fee_rate", DEFAULT_FEE_RATE)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "fee_rate",
            "fee_rate must be at least 0 and below 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let start = backtest_date(config, "start_date")?;
    let end = backtest_date(config, "end_date")?;
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(invalid(
            "start_date",
            "start_date must not be after end_date".to_string(),
        )),
        _ => Ok(()),
    }
}
