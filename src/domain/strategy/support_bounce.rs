//! Support bounce with a volatility-adaptive lookback.
//!
//! Supports are the lowest lows of the adaptive window. A bar that closes
//! near one of them, up from the previous close, with RSI oversold is bought.
//! Optional trend and momentum filters narrow entries further. The trade ends
//! at resistance, on RSI overbought, or through the full risk exit stack.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::detector::RunCounter;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{AdaptiveLookback, Indicator, IndicatorKind, Rsi, SupportResistance};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;
use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct SupportBounceConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub base_lookback: usize,
    pub min_lookback: usize,
    pub max_lookback: usize,
    pub volatility_period: usize,
    pub bounce_threshold: f64,
    pub support_count: usize,
    pub bounce_bars: usize,
    pub use_trend_filter: bool,
    pub trend_period: usize,
    pub trend_threshold: f64,
    pub use_momentum_filter: bool,
}

impl SupportBounceConfig {
    /// Lookbacks are ordered so that `min <= base <= max`.
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        let mut lookbacks = [
            params.period("min_lookback", 8, 2)?,
            params.period("base_lookback", 20, 2)?,
            params.period("max_lookback", 35, 2)?,
        ];
        lookbacks.sort_unstable();
        let [min_lookback, base_lookback, max_lookback] = lookbacks;
        Ok(Self {
            rsi_period: params.period("rsi_period", 14, 2)?,
            rsi_oversold: params.number("rsi_oversold", 30.0),
            rsi_overbought: params.number("rsi_overbought", 70.0),
            base_lookback,
            min_lookback,
            max_lookback,
            volatility_period: params.period("volatility_period", 10, 2)?,
            bounce_threshold: params.number("bounce_threshold", 0.035),
            support_count: params.period("support_count", 3, 1)?,
            bounce_bars: params.period("bounce_bars", 1, 1)?,
            use_trend_filter: params.flag("use_trend_filter", false),
            trend_period: params.period("trend_period", 25, 2)?,
            trend_threshold: params.number("trend_threshold", 0.01),
            use_momentum_filter: params.flag("use_momentum_filter", false),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SupportBounce {
    config: SupportBounceConfig,
}

#[derive(Debug, Clone)]
pub struct SupportBounceState {
    rsi: Rsi,
    levels: SupportResistance,
    lookback: AdaptiveLookback,
    runs: RunCounter,
    closes: RollingWindow<f64>,
    current_lookback: usize,
}

impl SupportBounceState {
    /// Relative change across the trend window; `None` until it is full.
    fn trend_strength(&self) -> Option<f64> {
        if !self.closes.is_full() {
            return None;
        }
        let first = self.closes.values().next()?;
        let last = self.closes.latest()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first)
    }
}

impl SupportBounce {
    pub fn new(config: SupportBounceConfig) -> Self {
        Self { config }
    }

    fn filters_pass(&self, state: &SupportBounceState) -> bool {
        let cfg = &self.config;
        if cfg.use_trend_filter
            && !state
                .trend_strength()
                .is_some_and(|t| t >= cfg.trend_threshold)
        {
            return false;
        }
        if cfg.use_momentum_filter {
            let rising = matches!(
                (state.rsi.value_at(0), state.rsi.value_at(1)),
                (Some(now), Some(before)) if now > before
            );
            if !rising {
                return false;
            }
        }
        true
    }
}

impl SignalModel for SupportBounce {
    type State = SupportBounceState;

    fn name(&self) -> &'static str {
        "support_bounce"
    }

    fn new_state(&self) -> SupportBounceState {
        let cfg = &self.config;
        SupportBounceState {
            rsi: Rsi::new(cfg.rsi_period),
            levels: SupportResistance::new(cfg.max_lookback),
            lookback: AdaptiveLookback::new(
                cfg.base_lookback,
                cfg.min_lookback,
                cfg.max_lookback,
                cfg.volatility_period,
            ),
            runs: RunCounter::new(),
            closes: RollingWindow::new(cfg.trend_period),
            current_lookback: cfg.base_lookback,
        }
    }

    fn update(&self, state: &mut SupportBounceState, bar: &Bar, _bar_index: u64) -> bool {
        state.rsi.update(bar);
        state.levels.update(bar);
        state.lookback.update(bar);
        state.runs.push(bar.close);
        state.closes.push(bar.close);
        state.current_lookback = state.lookback.lookback();

        state.rsi.is_ready()
            && !state
                .levels
                .supports(state.current_lookback, self.config.support_count)
                .is_empty()
    }

    fn entry_signal(&self, state: &SupportBounceState, bar: &Bar, _bar_index: u64) -> bool {
        let cfg = &self.config;
        let near = state.levels.near_support(
            bar.close,
            state.current_lookback,
            cfg.support_count,
            cfg.bounce_threshold,
        );
        let bouncing = state.runs.up_run() >= cfg.bounce_bars;
        let oversold = state.rsi.value().is_some_and(|r| r <= cfg.rsi_oversold);
        near && bouncing && oversold && self.filters_pass(state)
    }

    fn exit_signal(&self, state: &SupportBounceState, bar: &Bar, _position: &Position) -> Option<&'static str> {
        if state
            .levels
            .resistance(state.current_lookback)
            .is_some_and(|r| bar.close >= r)
        {
            return Some("resistance");
        }
        if state.rsi.value().is_some_and(|r| r >= self.config.rsi_overbought) {
            return Some("rsi_overbought");
        }
        None
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Rsi(self.config.rsi_period),
            IndicatorKind::SupportResistance(self.config.max_lookback),
            IndicatorKind::AdaptiveLookback {
                base: self.config.base_lookback,
                min: self.config.min_lookback,
                max: self.config.max_lookback,
            },
        ]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<SupportBounce>, ProbtraderError> {
    let config = SupportBounceConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.15,
            stop_loss: 0.08,
            trailing_stop: 0.05,
            trail_requires_gain: false,
            take_profit: 0.12,
            take_profit_enabled: true,
            max_hold_bars: 40,
        },
    )?;
    Ok(StrategyRunner::new(SupportBounce::new(config), risk.lifecycle()))
}
