//! Open-position bookkeeping and exit rules.
//!
//! A `Position` is created only when the lifecycle's own buy succeeds and is
//! dropped on the bar its exit fires. Exit predicates run in a fixed priority
//! order; the first that matches wins and nothing after it is evaluated.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub token_id: String,
    pub entry_price: f64,
    pub entry_timestamp: i64,
    pub high_water: f64,
    /// Bars seen since the entry bar.
    pub bars_held: u32,
    pub side: Side,
}

impl Position {
    pub fn open(token_id: &str, close: f64, timestamp: i64) -> Self {
        Self {
            token_id: token_id.to_string(),
            entry_price: close,
            entry_timestamp: timestamp,
            high_water: close,
            bars_held: 0,
            side: Side::Long,
        }
    }

    /// Roll the position forward one bar. Runs before any exit check.
    pub fn advance(&mut self, close: f64) {
        if close > self.high_water {
            self.high_water = close;
        }
        self.bars_held = self.bars_held.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    MaxHold,
    Signal(&'static str),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TrailingStop => write!(f, "trailing_stop"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::MaxHold => write!(f, "max_hold"),
            ExitReason::Signal(name) => write!(f, "signal:{}", name),
        }
    }
}

/// Risk exits shared by every strategy. All percentages are fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRules {
    /// 0 disables the hard stop.
    pub stop_loss_pct: f64,
    pub trailing_stop_pct: Option<f64>,
    /// Trailing stop only arms once the close is above entry.
    pub trail_requires_gain: bool,
    pub take_profit_pct: Option<f64>,
    pub max_hold_bars: Option<u32>,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.0,
            trailing_stop_pct: None,
            trail_requires_gain: true,
            take_profit_pct: None,
            max_hold_bars: None,
        }
    }
}

impl ExitRules {
    /// Evaluate exits in priority order: stop-loss, trailing stop, take-profit,
    /// max hold, then the strategy's own signal. `signal` is only called when
    /// none of the risk exits fire.
    pub fn evaluate(
        &self,
        pos: &Position,
        close: f64,
        signal: impl FnOnce() -> Option<&'static str>,
    ) -> Option<ExitReason> {
        if self.stop_loss_pct > 0.0 && close <= pos.entry_price * (1.0 - self.stop_loss_pct) {
            return Some(ExitReason::StopLoss);
        }
        if let Some(trail) = self.trailing_stop_pct {
            let armed = !self.trail_requires_gain || close > pos.entry_price;
            if armed && close <= pos.high_water * (1.0 - trail) {
                return Some(ExitReason::TrailingStop);
            }
        }
        if let Some(tp) = self.take_profit_pct {
            if close >= pos.entry_price * (1.0 + tp) {
                return Some(ExitReason::TakeProfit);
            }
        }
        if let Some(max) = self.max_hold_bars {
            if pos.bars_held > max {
                return Some(ExitReason::MaxHold);
            }
        }
        signal().map(ExitReason::Signal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub token_id: String,
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_timestamp: i64,
    pub exit_timestamp: i64,
    pub fees: f64,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
