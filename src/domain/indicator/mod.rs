//! Streaming technical indicators.
//!
//! Every indicator consumes one bar at a time and keeps its own bounded state:
//! - `Indicator`: the update / value_at contract shared by all of them
//! - `IndicatorKind`: indicator identity + parameters, used for reporting what a strategy wires
//! - `OUTPUT_HISTORY`: how many past outputs each indicator retains for `value_at(offset)`
//!
//! Indicators never fail on short input. Until their warm-up window is filled
//! they report `None`, which callers treat as "no signal this bar".

pub mod adaptive;
pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod levels;
pub mod percentile;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use adaptive::{AdaptiveLookback, adaptive_lookback, normalized_volatility};
pub use adx::{Adx, AdxValue};
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerValue};
pub use donchian::{Donchian, DonchianValue};
pub use ema::Ema;
pub use levels::SupportResistance;
pub use percentile::{PercentileRank, percentile};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticValue};

use std::fmt;

use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

/// Number of past outputs each indicator keeps addressable through `value_at`.
pub const OUTPUT_HISTORY: usize = 32;

pub trait Indicator {
    type Output: Copy;

    /// Advance the internal state by exactly one observation.
    fn update(&mut self, bar: &Bar);

    /// Output `offset` steps before the most recent one (0 = most recent).
    fn value_at(&self, offset: usize) -> Option<Self::Output>;

    fn value(&self) -> Option<Self::Output> {
        self.value_at(0)
    }

    fn is_ready(&self) -> bool {
        self.value().is_some()
    }
}

/// Bounded record of an indicator's emitted outputs.
#[derive(Debug, Clone)]
pub(crate) struct OutputHistory<T> {
    window: RollingWindow<T>,
}

impl<T: Copy> OutputHistory<T> {
    pub(crate) fn new() -> Self {
        Self {
            window: RollingWindow::new(OUTPUT_HISTORY),
        }
    }

    pub(crate) fn record(&mut self, value: T) {
        self.window.push(value);
    }

    pub(crate) fn at(&self, offset: usize) -> Option<T> {
        self.window.back(offset)
    }
}

/// True when `fast` was at or below `slow` one step ago and is above it now.
pub fn crossed_above(fast: &impl Indicator<Output = f64>, slow: &impl Indicator<Output = f64>) -> bool {
    match (fast.value_at(0), slow.value_at(0), fast.value_at(1), slow.value_at(1)) {
        (Some(f), Some(s), Some(pf), Some(ps)) => pf <= ps && f > s,
        _ => false,
    }
}

/// True when `fast` was at or above `slow` one step ago and is below it now.
pub fn crossed_below(fast: &impl Indicator<Output = f64>, slow: &impl Indicator<Output = f64>) -> bool {
    match (fast.value_at(0), slow.value_at(0), fast.value_at(1), slow.value_at(1)) {
        (Some(f), Some(s), Some(pf), Some(ps)) => pf >= ps && f < s,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Donchian(usize),
    PercentileRank(usize),
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    AdaptiveLookback {
        base: usize,
        min: usize,
        max: usize,
    },
    SupportResistance(usize),
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKind::Adx(period) => write!(f, "ADX({})", period),
            IndicatorKind::Donchian(period) => write!(f, "DONCHIAN({})", period),
            IndicatorKind::PercentileRank(period) => write!(f, "PCTRANK({})", period),
            IndicatorKind::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorKind::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorKind::AdaptiveLookback { base, min, max } => {
                write!(f, "LOOKBACK({},{}..{})", base, min, max)
            }
            IndicatorKind::SupportResistance(lookback) => write!(f, "LEVELS({})", lookback),
        }
    }
}
