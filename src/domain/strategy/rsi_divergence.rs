//! RSI divergence: buy a new price low that RSI refuses to confirm, sell when
//! RSI reaches overbought.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::detector::DivergenceDetector;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Indicator, IndicatorKind, Rsi};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiDivergenceConfig {
    pub rsi_period: usize,
    pub divergence_lookback: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiDivergenceConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            rsi_period: params.period("rsi_period", 5, 3)?,
            divergence_lookback: params.period("divergence_lookback", 6, 3)?,
            oversold: params.number("oversold", 30.0),
            overbought: params.number("overbought", 70.0),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RsiDivergence {
    config: RsiDivergenceConfig,
}

#[derive(Debug, Clone)]
pub struct RsiDivergenceState {
    rsi: Rsi,
    divergence: DivergenceDetector,
}

impl RsiDivergence {
    pub fn new(config: RsiDivergenceConfig) -> Self {
        Self { config }
    }
}

impl SignalModel for RsiDivergence {
    type State = RsiDivergenceState;

    fn name(&self) -> &'static str {
        "rsi_divergence"
    }

    fn new_state(&self) -> RsiDivergenceState {
        RsiDivergenceState {
            rsi: Rsi::new(self.config.rsi_period),
            divergence: DivergenceDetector::new(self.config.divergence_lookback),
        }
    }

    fn update(&self, state: &mut RsiDivergenceState, bar: &Bar, _bar_index: u64) -> bool {
        state.rsi.update(bar);
        match state.rsi.value() {
            Some(rsi) => {
                state.divergence.update(bar.close, rsi);
                true
            }
            None => false,
        }
    }

    fn entry_signal(&self, state: &RsiDivergenceState, _bar: &Bar, _bar_index: u64) -> bool {
        state.divergence.bullish(self.config.oversold)
    }

    fn exit_signal(&self, state: &RsiDivergenceState, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        state
            .rsi
            .value()
            .filter(|rsi| *rsi >= self.config.overbought)
            .map(|_| "rsi_overbought")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![IndicatorKind::Rsi(self.config.rsi_period)]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<RsiDivergence>, ProbtraderError> {
    let config = RsiDivergenceConfig::from_params(params)?;
    let risk = RiskConfig::from_params(params, RiskDefaults::default())?;
    Ok(StrategyRunner::new(RsiDivergence::new(config), risk.lifecycle()))
}
