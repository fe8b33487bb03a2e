//! Donchian channel breakout: buy a close above the previous channel high,
//! optionally sell when price falls back to the channel middle.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::{Donchian, Indicator, IndicatorKind};
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct DonchianBreakoutConfig {
    pub channel_period: usize,
    pub exit_at_mid: bool,
}

impl DonchianBreakoutConfig {
    pub fn from_params(params: &ParamMap) -> Result<Self, ProbtraderError> {
        Ok(Self {
            channel_period: params.period("channel_period", 15, 2)?,
            exit_at_mid: params.flag("exit_at_mid", true),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    config: DonchianBreakoutConfig,
}

impl DonchianBreakout {
    pub fn new(config: DonchianBreakoutConfig) -> Self {
        Self { config }
    }
}

impl SignalModel for DonchianBreakout {
    type State = Donchian;

    fn name(&self) -> &'static str {
        "donchian_breakout"
    }

    fn new_state(&self) -> Donchian {
        Donchian::new(self.config.channel_period)
    }

    fn update(&self, channel: &mut Donchian, bar: &Bar, _bar_index: u64) -> bool {
        channel.update(bar);
        channel.prior().is_some()
    }

    fn entry_signal(&self, channel: &Donchian, bar: &Bar, _bar_index: u64) -> bool {
        channel.prior().is_some_and(|c| bar.close > c.upper)
    }

    fn exit_signal(&self, channel: &Donchian, bar: &Bar, _position: &Position) -> Option<&'static str> {
        if !self.config.exit_at_mid {
            return None;
        }
        channel
            .prior()
            .filter(|c| bar.close <= c.middle)
            .map(|_| "channel_mid")
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        vec![IndicatorKind::Donchian(self.config.channel_period)]
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<DonchianBreakout>, ProbtraderError> {
    let config = DonchianBreakoutConfig::from_params(params)?;
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            risk_percent: 0.15,
            stop_loss: 0.08,
            trailing_stop: 0.06,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(DonchianBreakout::new(config), risk.lifecycle()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::Action;
    use crate::domain::position::ExitReason;
    use crate::domain::strategy::test_support::*;

    const BREAKOUT_AND_FADE: [f64; 5] = [0.50, 0.52, 0.51, 0.55, 0.52];

    #[test]
    fn exit_at_mid_accepts_numeric_flag() {
        let cfg = DonchianBreakoutConfig::from_params(&ParamMap::new().with("exit_at_mid", 0.0)).unwrap();
        assert!(!cfg.exit_at_mid);
        assert_eq!(cfg.channel_period, 15);
    }

    #[test]
    fn buys_breakout_and_exits_at_channel_middle() {
        let mut strategy = build(&ParamMap::new().with("channel_period", 3.0)).unwrap();
        let (_, _, actions) = run_closes(&mut strategy, &BREAKOUT_AND_FADE);
        assert_eq!(first_entry(&actions), Some(3));
        assert_eq!(first_exit(&actions), Some((4, ExitReason::Signal("channel_mid"))));
    }

    #[test]
    fn holds_through_middle_when_mid_exit_disabled() {
        let params = ParamMap::new()
            .with("channel_period", 3.0)
            .with("exit_at_mid", false);
        let mut strategy = build(&params).unwrap();
        let (_, _, actions) = run_closes(&mut strategy, &BREAKOUT_AND_FADE);
        assert_eq!(first_entry(&actions), Some(3));
        assert_eq!(actions[4], Action::None);
    }

    #[test]
    fn close_equal_to_channel_high_is_not_a_breakout() {
        let mut strategy = build(&ParamMap::new().with("channel_period", 3.0)).unwrap();
        let (_, _, actions) = run_closes(&mut strategy, &[0.50, 0.52, 0.51, 0.52]);
        assert_eq!(first_entry(&actions), None);
    }
}
