//! Volatility-adaptive stochastic.
//!
//! The %K period shortens when ATR runs hot relative to its recent average and
//! lengthens when it is quiet. Oversold/overbought levels are percentiles of
//! recent %K rather than fixed numbers. Entries also need ATR/price above a
//! floor so dead markets are skipped.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Atr, Indicator, IndicatorKind, Stochastic, percentile};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;
use crate::domain::rolling::RollingWindow;

const DEFAULT_LEVELS: (f64, f64) = (20.0, 80.0);
const MIN_ATR_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct StochAdaptiveConfig {
    pub min_k_period: usize,
    pub max_k_period: usize,
    pub d_period: usize,
    pub percentile_lookback: usize,
    pub oversold_percentile: f64,
    pub overbought_percentile: f64,
    pub atr_period: usize,
    pub min_atr_threshold: f64,
    pub volatility_scale: f64,
}

impl StochAdaptiveConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        let min_k_period = params.period("min_k_period", 3, 2)?;
        Ok(Self {
            min_k_period,
            max_k_period: params.period("max_k_period", 14, min_k_period + 1)?,
            d_period: params.period("d_period", 3, 2)?,
            percentile_lookback: params.period("percentile_lookback", 20, 5)?,
            oversold_percentile: params.number("oversold_percentile", 15.0),
            overbought_percentile: params.number("overbought_percentile", 85.0),
            atr_period: params.period("atr_period", 14, 5)?,
            min_atr_threshold: params.number("min_atr_threshold", 0.005),
            volatility_scale: params.number("volatility_scale", 50.0),
        })
    }
}

/// %K period for the current volatility regime.
///
/// `relative_vol` is current ATR over its recent mean. At or below 0.5 the
/// longest period is used; the period shrinks linearly as it rises, scaled by
/// `scale`, down to `min`.
pub fn adaptive_k_period(min: usize, max: usize, relative_vol: f64, scale: f64) -> usize {
    let vol_scale = ((relative_vol - 0.5) * scale).clamp(0.0, 1.0);
    let period = (max as f64 - (max - min) as f64 * vol_scale).floor();
    (period as usize).clamp(min, max)
}

#[derive(Debug, Clone)]
pub struct StochAdaptive {
    config: StochAdaptiveConfig,
}

#[derive(Debug, Clone)]
pub struct StochAdaptiveState {
    atr: Atr,
    atr_history: RollingWindow<f64>,
    stoch: Stochastic,
    k_history: RollingWindow<f64>,
    levels: (f64, f64),
}

impl StochAdaptive {
    pub fn new(config: StochAdaptiveConfig) -> Self {
        Self { config }
    }

    fn k_period(&self, state: &StochAdaptiveState) -> usize {
        let cfg = &self.config;
        let current = state.atr.value();
        let average = state.atr_history.mean();
        match (current, average) {
            (Some(atr), Some(avg)) if state.atr_history.len() >= MIN_ATR_SAMPLES => {
                let relative = if avg > 0.0 { atr / avg } else { 1.0 };
                adaptive_k_period(cfg.min_k_period, cfg.max_k_period, relative, cfg.volatility_scale)
            }
            _ => (cfg.min_k_period + cfg.max_k_period) / 2,
        }
    }

    fn levels(&self, k_history: &RollingWindow<f64>) -> (f64, f64) {
        if k_history.len() < self.config.percentile_lookback {
            return DEFAULT_LEVELS;
        }
        let values: Vec<f64> = k_history.values().collect();
        match (
            percentile(&values, self.config.oversold_percentile),
            percentile(&values, self.config.overbought_percentile),
        ) {
            (Some(low), Some(high)) => (low, high),
            _ => DEFAULT_LEVELS,
        }
    }
}

impl SignalModel for StochAdaptive {
    type State = StochAdaptiveState;

    fn name(&self) -> &'static str {
        "stoch_adaptive"
    }

    fn new_state(&self) -> StochAdaptiveState {
        let cfg = &self.config;
        let mid = (cfg.min_k_period + cfg.max_k_period) / 2;
        StochAdaptiveState {
            atr: Atr::new(cfg.atr_period),
            atr_history: RollingWindow::new(cfg.atr_period * 2),
            stoch: Stochastic::with_max_period(mid, cfg.d_period, cfg.max_k_period),
            k_history: RollingWindow::new(cfg.percentile_lookback),
            levels: DEFAULT_LEVELS,
        }
    }

    fn update(&self, state: &mut StochAdaptiveState, bar: &Bar, bar_index: u64) -> bool {
        state.atr.update(bar);
        if let Some(atr) = state.atr.value() {
            state.atr_history.push(atr);
        }

        let k_period = self.k_period(state);
        state.stoch.set_k_period(k_period);
        state.stoch.update(bar);

        // the stochastic emits once it has seen k_period bars
        let emitted = bar_index >= state.stoch.k_period() as u64;
        if !emitted {
            return false;
        }
        let Some(value) = state.stoch.value() else {
            return false;
        };
        state.k_history.push(value.k);
        state.levels = self.levels(&state.k_history);
        value.d.is_some()
    }

    fn entry_signal(&self, state: &StochAdaptiveState, bar: &Bar, _bar_index: u64) -> bool {
        let volatile = state
            .atr
            .relative_to(bar.close)
            .is_some_and(|rel| rel >= self.config.min_atr_threshold);
        if !volatile {
            return false;
        }
        match state.stoch.value() {
            Some(v) => v.d.is_some_and(|d| v.k <= state.levels.0 && v.k > d),
            None => false,
        }
    }

    fn exit_signal(&self, state: &StochAdaptiveState, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        let v = state.stoch.value()?;
        let d = v.d?;
        (v.k >= state.levels.1 && v.k < d).then_some("stoch_overbought")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Atr(self.config.atr_period),
            IndicatorKind::Stochastic {
                k_period: self.config.max_k_period,
                d_period: self.config.d_period,
            },
        ]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<StochAdaptive>, ProbtraderError> {
    let config = StochAdaptiveConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            stop_loss: 0.04,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(StochAdaptive::new(config), risk.lifecycle()))
}
