//! Bullish RSI divergence confirmed by a stochastic turn out of oversold.
//!
//! Both sub-signals must have fired within `signal_window` bars of each other.
//! Either reaching overbought ends the trade.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::detector::{Confluence, DivergenceDetector};
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Indicator, IndicatorKind, Rsi, Stochastic};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

const DIVERGENCE: usize = 0;
const STOCH_TURN: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiStochConfig {
    pub rsi_period: usize,
    pub divergence_lookback: usize,
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub signal_window: u64,
}

impl RsiStochConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            rsi_period: params.period("rsi_period", 14, 3)?,
            divergence_lookback: params.period("divergence_lookback", 5, 3)?,
            k_period: params.period("k_period", 14, 3)?,
            d_period: params.period("d_period", 3, 2)?,
            oversold: params.number("oversold", 20.0),
            overbought: params.number("overbought", 80.0),
            signal_window: params.period("signal_window", 3, 1)? as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RsiStochConfluence {
    config: RsiStochConfig,
}

#[derive(Debug, Clone)]
pub struct RsiStochState {
    rsi: Rsi,
    stoch: Stochastic,
    divergence: DivergenceDetector,
    confluence: Confluence,
}

impl RsiStochConfluence {
    pub fn new(config: RsiStochConfig) -> Self {
        Self { config }
    }
}

impl SignalModel for RsiStochConfluence {
    type State = RsiStochState;

    fn name(&self) -> &'static str {
        "rsi_stoch_confluence"
    }

    fn new_state(&self) -> RsiStochState {
        RsiStochState {
            rsi: Rsi::new(self.config.rsi_period),
            stoch: Stochastic::new(self.config.k_period, self.config.d_period),
            divergence: DivergenceDetector::new(self.config.divergence_lookback),
            confluence: Confluence::new(2, self.config.signal_window),
        }
    }

    fn update(&self, state: &mut RsiStochState, bar: &Bar, bar_index: u64) -> bool {
        state.rsi.update(bar);
        state.stoch.update(bar);
        let Some(rsi) = state.rsi.value() else {
            return false;
        };

        state.divergence.update(bar.close, rsi);
        if state.divergence.bullish(self.config.oversold) {
            state.confluence.record(DIVERGENCE, bar_index);
        }
        if let Some(stoch) = state.stoch.value() {
            let turning = stoch
                .d
                .is_some_and(|d| stoch.k <= self.config.oversold && stoch.k > d);
            if turning {
                state.confluence.record(STOCH_TURN, bar_index);
            }
        }
        true
    }

    fn entry_signal(&self, state: &RsiStochState, _bar: &Bar, bar_index: u64) -> bool {
        state.confluence.is_confirmed(bar_index)
    }

    fn exit_signal(&self, state: &RsiStochState, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        if state.rsi.value().is_some_and(|r| r >= self.config.overbought) {
            return Some("rsi_overbought");
        }
        if state.stoch.k().is_some_and(|k| k >= self.config.overbought) {
            return Some("stoch_overbought");
        }
        None
    }

    fn on_entry(&self, state: &mut RsiStochState) {
        state.confluence.clear();
    }

    fn on_exit(&self, state: &mut RsiStochState) {
        state.confluence.clear();
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Rsi(self.config.rsi_period),
            IndicatorKind::Stochastic {
                k_period: self.config.k_period,
                d_period: self.config.d_period,
            },
        ]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<RsiStochConfluence>, ProbtraderError> {
    let config = RsiStochConfig::from_params(params)?;
    let risk = RiskConfig::from_params(params, RiskDefaults::default())?;
    Ok(StrategyRunner::new(RsiStochConfluence::new(config), risk.lifecycle()))
}
