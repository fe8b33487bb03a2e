//! Consecutive-bar pattern.
//!
//! Buys after `consec_bars` down closes when `buy_on_dip` is set, or after
//! that many up closes otherwise. Exits on a run of `exit_bars` down closes.
//! `buy_on_dip` has no default and must be configured.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::detector::RunCounter;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

/// Closes required before the first decision, beyond the run itself.
const MIN_HISTORY: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RunPatternConfig {
    pub consec_bars: usize,
    pub exit_bars: usize,
    pub buy_on_dip: bool,
}

impl RunPatternConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            consec_bars: params.period("consec_bars", 2, 1)?,
            exit_bars: params.period("exit_bars", 1, 1)?,
            buy_on_dip: params.require_flag("buy_on_dip")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunPattern {
    config: RunPatternConfig,
}

impl RunPattern {
    pub fn new(config: RunPatternConfig) -> Self {
        Self { config }
    }

    fn required_bars(&self) -> u64 {
        (self.config.consec_bars.max(MIN_HISTORY) + 1) as u64
    }
}

impl SignalModel for RunPattern {
    type State = RunCounter;

    fn name(&self) -> &'static str {
        "run_pattern"
    }

    fn new_state(&self) -> RunCounter {
        RunCounter::new()
    }

    fn update(&self, runs: &mut RunCounter, bar: &Bar, bar_index: u64) -> bool {
        runs.push(bar.close);
        bar_index >= self.required_bars()
    }

    fn entry_signal(&self, runs: &RunCounter, _bar: &Bar, _bar_index: u64) -> bool {
        let run = if self.config.buy_on_dip {
            runs.down_run()
        } else {
            runs.up_run()
        };
        run >= self.config.consec_bars
    }

    fn exit_signal(&self, runs: &RunCounter, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        (runs.down_run() >= self.config.exit_bars).then_some("down_run")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        Vec::new()
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<RunPattern>, ProbtraderError> {
    let config = RunPatternConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.08,
            stop_loss: 0.03,
            trailing_stop: 0.02,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(RunPattern::new(config), risk.lifecycle()))
}
