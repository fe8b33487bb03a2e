//! Trend following on three aligned SMAs, filtered by ADX strength.
//!
//! Entries wait for a pullback to the medium average while fast > medium >
//! slow and ADX is above its threshold. The reverse alignment exits.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Adx, Indicator, IndicatorKind, Sma};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendAdxConfig {
    pub fast_period: usize,
    pub medium_period: usize,
    pub slow_period: usize,
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub pullback_threshold: f64,
}

impl TrendAdxConfig {
    /// The three periods are sorted, then floored to 2, 3 and 4.
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        let mut periods = [
            params.period("fast_period", 10, 1)?,
            params.period("medium_period", 25, 1)?,
            params.period("slow_period", 50, 1)?,
        ];
        periods.sort_unstable();
        Ok(Self {
            fast_period: periods[0].max(2),
            medium_period: periods[1].max(3),
            slow_period: periods[2].max(4),
            adx_period: params.period("adx_period", 14, 2)?,
            adx_threshold: params.number("adx_threshold", 25.0),
            pullback_threshold: params.number("pullback_threshold", 0.005),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TrendAdx {
    config: TrendAdxConfig,
}

#[derive(Debug, Clone)]
pub struct TrendAdxState {
    fast: Sma,
    medium: Sma,
    slow: Sma,
    adx: Adx,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Averages {
    fast: f64,
    medium: f64,
    slow: f64,
}

impl Averages {
    fn bullish(&self) -> bool {
        self.fast > self.medium && self.medium > self.slow
    }

    fn bearish(&self) -> bool {
        self.fast < self.medium && self.medium < self.slow
    }
}

impl TrendAdxState {
    fn averages(&self) -> Option<Averages> {
        Some(Averages {
            fast: self.fast.value()?,
            medium: self.medium.value()?,
            slow: self.slow.value()?,
        })
    }
}

impl TrendAdx {
    pub fn new(config: TrendAdxConfig) -> Self {
        Self { config }
    }
}

impl SignalModel for TrendAdx {
    type State = TrendAdxState;

    fn name(&self) -> &'static str {
        "trend_adx"
    }

    fn new_state(&self) -> TrendAdxState {
        TrendAdxState {
            fast: Sma::new(self.config.fast_period),
            medium: Sma::new(self.config.medium_period),
            slow: Sma::new(self.config.slow_period),
            adx: Adx::new(self.config.adx_period),
        }
    }

    fn update(&self, state: &mut TrendAdxState, bar: &Bar, _bar_index: u64) -> bool {
        state.fast.update(bar);
        state.medium.update(bar);
        state.slow.update(bar);
        state.adx.update(bar);
        state.averages().is_some()
    }

    fn entry_signal(&self, state: &TrendAdxState, bar: &Bar, _bar_index: u64) -> bool {
        let Some(ma) = state.averages() else {
            return false;
        };
        let strong = state
            .adx
            .value()
            .is_some_and(|v| v.adx > self.config.adx_threshold);
        if !(ma.bullish() && strong) || ma.medium <= 0.0 {
            return false;
        }
        let distance = (bar.close - ma.medium).abs() / ma.medium;
        distance <= self.config.pullback_threshold && bar.close >= ma.medium
    }

    fn exit_signal(&self, state: &TrendAdxState, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        state
            .averages()
            .filter(Averages::bearish)
            .map(|_| "bearish_alignment")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Sma(self.config.fast_period),
            IndicatorKind::Sma(self.config.medium_period),
            IndicatorKind::Sma(self.config.slow_period),
            IndicatorKind::Adx(self.config.adx_period),
        ]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<TrendAdx>, ProbtraderError> {
    let config = TrendAdxConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.15,
            stop_loss: 0.03,
            trailing_stop: 0.025,
            take_profit: 0.08,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(TrendAdx::new(config), risk.lifecycle()))
}
