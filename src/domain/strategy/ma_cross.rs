//! Moving-average crossover: enter when the fast average crosses above the
//! slow one, exit on the reverse cross.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Ema, Indicator, IndicatorKind, Sma, crossed_above, crossed_below};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    Simple,
    Exponential,
}

/// Either kind of moving average behind one `Indicator` face.
#[derive(Debug, Clone)]
pub enum MovingAverage {
    Simple(Sma),
    Exponential(Ema),
}

impl MovingAverage {
    pub fn new(kind: MaKind, period: usize) -> Self {
        match kind {
            MaKind::Simple => MovingAverage::Simple(Sma::new(period)),
            MaKind::Exponential => MovingAverage::Exponential(Ema::new(period)),
        }
    }
}

impl Indicator for MovingAverage {
    type Output = f64;

    fn update(&mut self, bar: &Bar) {
        match self {
            MovingAverage::Simple(ma) => ma.update(bar),
            MovingAverage::Exponential(ma) => ma.update(bar),
        }
    }

    fn value_at(&self, offset: usize) -> Option<f64> {
        match self {
            MovingAverage::Simple(ma) => ma.value_at(offset),
            MovingAverage::Exponential(ma) => ma.value_at(offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaCrossConfig {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossConfig {
    /// Periods are floored to at least 2; an inverted pair is swapped and an
    /// equal pair is widened so the two averages differ.
    pub fn from_params(
        params: &ParamMap,
        fast_default: usize,
        slow_default: usize,
    ) -> Result<Self, ProbtraderError> {
        let mut fast = params.period("fast_period", fast_default, 2)?;
        let mut slow = params.period("slow_period", slow_default, 2)?;
        if fast > slow {
            std::mem::swap(&mut fast, &mut slow);
        }
        if fast == slow {
            slow += 1;
        }
        Ok(Self {
            fast_period: fast,
            slow_period: slow,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MaCross {
    kind: MaKind,
    config: MaCrossConfig,
}

#[derive(Debug, Clone)]
pub struct MaCrossState {
    fast: MovingAverage,
    slow: MovingAverage,
}

impl MaCross {
    pub fn new(kind: MaKind, config: MaCrossConfig) -> Self {
        Self { kind, config }
    }

    pub fn config(&self) -> &MaCrossConfig {
        &self.config
    }
}

impl SignalModel for MaCross {
    type State = MaCrossState;

    fn name(&self) -> &'static str {
        match self.kind {
            MaKind::Simple => "sma_cross",
            MaKind::Exponential => "ema_cross",
        }
    }

    fn new_state(&self) -> MaCrossState {
        MaCrossState {
            fast: MovingAverage::new(self.kind, self.config.fast_period),
            slow: MovingAverage::new(self.kind, self.config.slow_period),
        }
    }

    fn update(&self, state: &mut MaCrossState, bar: &Bar, _bar_index: u64) -> bool {
        state.fast.update(bar);
        state.slow.update(bar);
        state.fast.is_ready() && state.slow.is_ready()
    }

    fn entry_signal(&self, state: &MaCrossState, _bar: &Bar, _bar_index: u64) -> bool {
        crossed_above(&state.fast, &state.slow)
    }

    fn exit_signal(&self, state: &MaCrossState, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        crossed_below(&state.fast, &state.slow).then_some("cross_below")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        match self.kind {
            MaKind::Simple => vec![
                IndicatorKind::Sma(self.config.fast_period),
                IndicatorKind::Sma(self.config.slow_period),
            ],
            MaKind::Exponential => vec![
                IndicatorKind::Ema(self.config.fast_period),
                IndicatorKind::Ema(self.config.slow_period),
            ],
        }
    }
}

pub fn build_sma_cross(params: &ParamMap) -> Result<StrategyRunner<MaCross>, ProbtraderError> {
    let config = MaCrossConfig::from_params(params, 5, 20)?;
    let risk = RiskConfig::from_params(params, RiskDefaults::default())?;
    Ok(StrategyRunner::new(MaCross::new(MaKind::Simple, config), risk.lifecycle()))
}

pub fn build_ema_cross(params: &ParamMap) -> Result<StrategyRunner<MaCross>, ProbtraderError> {
    let config = MaCrossConfig::from_params(params, 3, 8)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            stop_loss: 0.04,
            trailing_stop: 0.03,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(
        MaCross::new(MaKind::Exponential, config),
        risk.lifecycle(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::Action;
    use crate::domain::position::ExitReason;
    use crate::domain::strategy::Strategy;
    use crate::domain::strategy::test_support::*;

    fn small_sma() -> StrategyRunner<MaCross> {
        let params = ParamMap::new()
            .with("fast_period", 2.0)
            .with("slow_period", 3.0)
            .with("stop_loss", 0.0);
        build_sma_cross(&params).unwrap()
    }

    #[test]
    fn config_swaps_and_clamps() {
        let params = ParamMap::new().with("fast_period", 30.0).with("slow_period", 1.0);
        let cfg = MaCrossConfig::from_params(&params, 5, 20).unwrap();
        assert_eq!(cfg.fast_period, 2);
        assert_eq!(cfg.slow_period, 30);

        let equal = ParamMap::new().with("fast_period", 4.0).with("slow_period", 4.0);
        let cfg = MaCrossConfig::from_params(&equal, 5, 20).unwrap();
        assert_eq!((cfg.fast_period, cfg.slow_period), (4, 5));
    }

    #[test]
    fn enters_on_cross_above_and_exits_on_cross_below() {
        let mut strategy = small_sma();
        // fast(2) <= slow(3) at index 3, then above at index 4; reverse at index 7
        let closes = [0.50, 0.50, 0.50, 0.48, 0.60, 0.62, 0.64, 0.40];
        let (_, _, actions) = run_closes(&mut strategy, &closes);
        assert_eq!(first_entry(&actions), Some(4));
        let (at, reason) = first_exit(&actions).unwrap();
        assert_eq!(at, 7);
        assert_eq!(reason, ExitReason::Signal("cross_below"));
    }

    #[test]
    fn no_entry_while_warming_up() {
        let mut strategy = small_sma();
        let (_, _, actions) = run_closes(&mut strategy, &[0.3, 0.6]);
        assert!(actions.iter().all(|a| *a == Action::None));
    }

    #[test]
    fn out_of_band_cross_is_not_traded() {
        let mut strategy = small_sma();
        let closes = [0.03, 0.03, 0.03, 0.02, 0.04];
        let (portfolio, _, actions) = run_closes(&mut strategy, &closes);
        assert_eq!(first_entry(&actions), None);
        assert!(portfolio.trades.is_empty());
    }

    #[test]
    fn ema_variant_reports_its_indicators() {
        let strategy = build_ema_cross(&ParamMap::new()).unwrap();
        assert_eq!(strategy.name(), "ema_cross");
        assert_eq!(
            strategy.indicators(),
            vec![IndicatorKind::Ema(3), IndicatorKind::Ema(8)]
        );
        let rules = &strategy.lifecycle().rules;
        assert_eq!(rules.stop_loss_pct, 0.04);
        assert_eq!(rules.trailing_stop_pct, Some(0.03));
    }
}
