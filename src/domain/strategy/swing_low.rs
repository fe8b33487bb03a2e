//! Swing low: buy once a close is confirmed as the lowest of its
//! `2 * swing_window + 1` neighbourhood. Exits come from the risk stack only.

use super::risk::{RiskConfig, RiskDefaults};
use super::{SignalModel, StrategyRunner};
use crate::domain::bar::Bar;
use crate::domain::detector::SwingDetector;
use crate::domain::error::ProbtraderError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::params::ParamMap;
use crate::domain::position::Position;

#[derive(Debug, Clone)]
pub struct SwingLow {
    window: usize,
}

impl SwingLow {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(2) }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl SignalModel for SwingLow {
    type State = SwingDetector;

    fn name(&self) -> &'static str {
        "swing_low"
    }

    fn new_state(&self) -> SwingDetector {
        SwingDetector::new(self.window)
    }

    fn update(&self, swings: &mut SwingDetector, bar: &Bar, bar_index: u64) -> bool {
        swings.push(bar.close);
        bar_index >= (2 * self.window + 1) as u64
    }

    fn entry_signal(&self, swings: &SwingDetector, _bar: &Bar, _bar_index: u64) -> bool {
        swings.swing_low()
    }

    fn exit_signal(&self, _swings: &SwingDetector, _bar: &Bar, _position: &Position) -> Option<&'static str> {
        None
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        Vec::new()
    }
}

pub fn build(params: &ParamMap) -> Result<StrategyRunner<SwingLow>, ProbtraderError> {
    let model = SwingLow::new(params.period("swing_window", 3, 2)?);
    let risk = RiskConfig::from_params(
        params,
        RiskDefaults {
            stop_loss: 0.05,
            trailing_stop: 0.04,
            take_profit: 0.08,
            take_profit_enabled: true,
            ..RiskDefaults::default()
        },
    )?;
    Ok(StrategyRunner::new(model, risk.lifecycle()))
}
