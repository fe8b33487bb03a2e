//! Range mean reversion.
//!
//! Only trades when the lookback window is tight relative to its mean. Buys
//! a bounce from the bottom of the range and sells back at the mean or when
//! the close ranks overbought within the window.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Indicator, IndicatorKind, PercentileRank};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct RangeReversionConfig {
    pub lookback: usize,
    pub range_percentile: f64,
    pub oversold_percentile: f64,
    pub overbought_percentile: f64,
}

impl RangeReversionConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            lookback: params.period("lookback", 25, 3)?,
            range_percentile: params.number("range_percentile", 0.1),
            oversold_percentile: params.number("oversold_percentile", 0.15),
            overbought_percentile: params.number("overbought_percentile", 0.85),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RangeReversion {
    config: RangeReversionConfig,
}

#[derive(Debug, Clone)]
pub struct RangeState {
    rank: PercentileRank,
    prev_close: Option<f64>,
    close: Option<f64>,
}

impl RangeState {
    fn bouncing(&self) -> bool {
        matches!((self.close, self.prev_close), (Some(c), Some(p)) if c > p)
    }
}

impl RangeReversion {
    pub fn new(config: RangeReversionConfig) -> Self {
        Self { config }
    }
}

impl SignalModel for RangeReversion {
    type State = RangeState;

    fn name(&self) -> &'static str {
        "range_reversion"
    }

    fn new_state(&self) -> RangeState {
        RangeState {
            rank: PercentileRank::new(self.config.lookback),
            prev_close: None,
            close: None,
        }
    }

    fn update(&self, state: &mut RangeState, bar: &Bar, _bar_index: u64) -> bool {
        state.rank.update(bar);
        state.prev_close = state.close.replace(bar.close);
        state.rank.is_ready()
    }

    fn entry_signal(&self, state: &RangeState, _bar: &Bar, _bar_index: u64) -> bool {
        let cfg = &self.config;
        let tight = state
            .rank
            .range_width()
            .is_some_and(|w| w < cfg.range_percentile * 2.0);
        let oversold = state.rank.value().is_some_and(|r| r <= cfg.oversold_percentile);
        tight && oversold && state.bouncing()
    }

    fn exit_signal(&self, state: &RangeState, bar: &Bar, _position: &Position) -> Option<&'static str> {
        if state.rank.mean().is_some_and(|m| bar.close >= m) {
            return Some("mean_reached");
        }
        if state
            .rank
            .value()
            .is_some_and(|r| r >= self.config.overbought_percentile)
        {
            return Some("overbought");
        }
        None
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![IndicatorKind::PercentileRank(self.config.lookback)]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<RangeReversion>, ProbtraderError> {
    let config = RangeReversionConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.15,
            stop_loss: 0.08,
            trailing_stop: 0.05,
            trail_requires_gain: false,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(RangeReversion::new(config), risk.lifecycle()))
}
