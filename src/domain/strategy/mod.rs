//! Strategy adapters.
//!
//! A strategy is a `SignalModel` (which indicators to keep per token and
//! which predicates to apply) wired into a `StrategyRunner`, which owns the
//! per-token state and drives the shared `Lifecycle` once per bar.

pub mod bollinger_reversion;
pub mod donchian_breakout;
pub mod ma_cross;
pub mod range_reversion;
pub mod registry;
pub mod risk;
pub mod rsi_divergence;
pub mod rsi_stoch_confluence;
pub mod run_pattern;
pub mod stoch_adaptive;
pub mod support_bounce;
pub mod swing_low;
pub mod trend_adx;

pub use registry::{STRATEGY_NAMES, build_strategy};
pub use risk::{RiskConfig, RiskDefaults};

use crate::domain::bar::Bar;
use crate::domain::events::{EventSink, LifecycleEvent};
use crate::domain::indicator::IndicatorKind;
use crate::domain::lifecycle::{Action, Lifecycle, TokenBook};
use crate::domain::position::Position;
use crate::ports::portfolio_port::PortfolioPort;

/// Indicator wiring and entry/exit predicates of one strategy.
///
/// `bar_index` is the 1-based count of accepted bars for the token, the
/// current bar included.
pub trait SignalModel {
    type State;

    fn name(&self) -> &'static str;

    fn new_state(&self) -> Self::State;

    /// Feed the bar to every indicator. Returns whether the model has enough
    /// history to make decisions.
    fn update(&self, state: &mut Self::State, bar: &Bar, bar_index: u64) -> bool;

    fn entry_signal(&self, state: &Self::State, bar: &Bar, bar_index: u64) -> bool;

    /// Strategy-specific exit, consulted only after every risk exit passed.
    fn exit_signal(&self, state: &Self::State, bar: &Bar, position: &Position) -> Option<&'static str>;

    fn on_entry(&self, _state: &mut Self::State) {}

    fn on_exit(&self, _state: &mut Self::State) {}

    fn indicators(&self) -> Vec<IndicatorKind>;
}

/// Object-safe face of a configured strategy, used by the backtest driver.
pub trait Strategy {
    fn name(&self) -> &str;

    fn on_bar(&mut self, bar: &Bar, portfolio: &mut dyn PortfolioPort, events: &mut dyn EventSink) -> Action;

    fn position(&self, token_id: &str) -> Option<&Position>;

    fn indicators(&self) -> Vec<IndicatorKind>;

    fn lifecycle(&self) -> &Lifecycle;
}

pub struct StrategyRunner<M: SignalModel> {
    model: M,
    lifecycle: Lifecycle,
    book: TokenBook<M::State>,
}

impl<M: SignalModel> StrategyRunner<M> {
    pub fn new(model: M, lifecycle: Lifecycle) -> Self {
        Self {
            model,
            lifecycle,
            book: TokenBook::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn tokens(&self) -> usize {
        self.book.len()
    }
}

impl<M: SignalModel> Strategy for StrategyRunner<M> {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn on_bar(&mut self, bar: &Bar, portfolio: &mut dyn PortfolioPort, events: &mut dyn EventSink) -> Action {
        let model = &self.model;
        let handle = self
            .book
            .handle_or_insert_with(&bar.token_id, || model.new_state());
        let slot = self.book.slot_mut(handle);

        if let Err(last_timestamp) = slot.accept(bar.timestamp) {
            events.emit(LifecycleEvent::BarIgnored {
                token_id: bar.token_id.clone(),
                timestamp: bar.timestamp,
                last_timestamp,
            });
            return Action::Ignored;
        }
        let bar_index = slot.bars_seen;
        let ready = model.update(&mut slot.state, bar, bar_index);

        let state = &slot.state;
        let action = self.lifecycle.step(
            &mut slot.position,
            bar,
            ready,
            portfolio,
            events,
            || model.entry_signal(state, bar, bar_index),
            |pos| model.exit_signal(state, bar, pos),
        );

        match action {
            Action::Entered { .. } => model.on_entry(&mut slot.state),
            Action::Exited(_) => model.on_exit(&mut slot.state),
            _ => {}
        }
        action
    }

    fn position(&self, token_id: &str) -> Option<&Position> {
        self.book.position(token_id)
    }

    fn indicators(&self) -> Vec<IndicatorKind> {
        self.model.indicators()
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}
