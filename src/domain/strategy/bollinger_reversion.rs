//! Bollinger band mean reversion, with optional RSI confirmation and an
//! optional breakout entry above the upper band.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Bollinger, Indicator, IndicatorKind, Rsi};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerReversionConfig {
    pub period: usize,
    pub std_dev_multiplier: f64,
    pub mean_reversion: bool,
    pub rsi_enabled: bool,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub breakout_enabled: bool,
    pub breakout_threshold: f64,
}

impl BollingerReversionConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            period: params.period("period", 10, 2)?,
            std_dev_multiplier: params.number("std_dev_multiplier", 2.0),
            mean_reversion: params.flag("mean_reversion", true),
            rsi_enabled: params.flag("rsi_enabled", false),
            rsi_period: params.period("rsi_period", 14, 2)?,
            rsi_oversold: params.number("rsi_oversold", 30.0),
            rsi_overbought: params.number("rsi_overbought", 70.0),
            breakout_enabled: params.flag("breakout_enabled", false),
            breakout_threshold: params.number("breakout_threshold", 0.02),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    config: BollingerReversionConfig,
}

#[derive(Debug, Clone)]
pub struct BollingerState {
    bands: Bollinger,
    rsi: Rsi,
}

impl BollingerReversion {
    pub fn new(config: BollingerReversionConfig) -> Self {
        Self { config }
    }

    /// RSI gate; passes while RSI is disabled or still warming up.
    fn rsi_allows(&self, state: &BollingerState, accept: impl Fn(f64) -> bool) -> bool {
        if !self.config.rsi_enabled {
            return true;
        }
        state.rsi.value().is_none_or(accept)
    }
}

impl SignalModel for BollingerReversion {
    type State = BollingerState;

    fn name(&self) -> &'static str {
        "bollinger_reversion"
    }

    fn new_state(&self) -> BollingerState {
        BollingerState {
            bands: Bollinger::new(self.config.period, self.config.std_dev_multiplier),
            rsi: Rsi::new(self.config.rsi_period),
        }
    }

    fn update(&self, state: &mut BollingerState, bar: &Bar, _bar_index: u64) -> bool {
        state.bands.update(bar);
        state.rsi.update(bar);
        state.bands.is_ready()
    }

    fn entry_signal(&self, state: &BollingerState, bar: &Bar, _bar_index: u64) -> bool {
        let cfg = &self.config;
        let Some(bands) = state.bands.value() else {
            return false;
        };
        let breakout = cfg.breakout_enabled && bar.close >= bands.upper * (1.0 + cfg.breakout_threshold);
        let at_lower = cfg.mean_reversion && bar.close <= bands.lower;
        (breakout || at_lower) && self.rsi_allows(state, |rsi| rsi <= cfg.rsi_oversold)
    }

    fn exit_signal(&self, state: &BollingerState, bar: &Bar, _position: &Position) -> Option<&'static str> {
        if !self.config.mean_reversion {
            return None;
        }
        let bands = state.bands.value()?;
        let at_upper = bar.close >= bands.upper
            && self.rsi_allows(state, |rsi| rsi >= self.config.rsi_overbought);
        at_upper.then_some("upper_band")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        let mut kinds = vec![IndicatorKind::Bollinger {
            period: self.config.period,
            stddev_mult_x100: (self.config.std_dev_multiplier * 100.0).round() as u32,
        }];
        if self.config.rsi_enabled {
            kinds.push(IndicatorKind::Rsi(self.config.rsi_period));
        }
        kinds
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<BollingerReversion>, ProbtraderError> {
    let config = BollingerReversionConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.15,
            stop_loss: 0.03,
            trailing_stop: 0.03,
            take_profit: 0.05,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(BollingerReversion::new(config), risk.lifecycle()))
}
