//! Support and resistance levels from rolling lows and highs.

use crate::domain::bar::Bar;
use crate::domain::rolling::{RollingWindow, fold_max};

#[derive(Debug, Clone)]
pub struct SupportResistance {
    lows: RollingWindow<f64>,
    highs: RollingWindow<f64>,
    prev_close: Option<f64>,
    close: Option<f64>,
}

impl SupportResistance {
    /// `max_lookback` bounds every lookback later passed to the queries.
    pub fn new(max_lookback: usize) -> Self {
        Self {
            lows: RollingWindow::new(max_lookback),
            highs: RollingWindow::new(max_lookback),
            prev_close: None,
            close: None,
        }
    }

    pub fn update(&mut self, bar: &Bar) {
        self.lows.push(bar.low);
        self.highs.push(bar.high);
        self.prev_close = self.close.replace(bar.close);
    }

    /// The `count` lowest lows of the last `lookback` bars, ascending.
    /// Empty until `lookback` lows have been seen.
    pub fn supports(&self, lookback: usize, count: usize) -> Vec<f64> {
        if lookback == 0 || self.lows.len() < lookback {
            return Vec::new();
        }
        let mut recent: Vec<f64> = self.lows.last_n(lookback).collect();
        recent.sort_by(|a, b| a.total_cmp(b));
        recent.truncate(count);
        recent
    }

    /// Highest high of the last `lookback` bars.
    pub fn resistance(&self, lookback: usize) -> Option<f64> {
        if lookback == 0 || self.highs.len() < lookback {
            return None;
        }
        fold_max(self.highs.last_n(lookback))
    }

    /// True when `close` is within `threshold` (relative) of any of the supports.
    pub fn near_support(&self, close: f64, lookback: usize, count: usize, threshold: f64) -> bool {
        self.supports(lookback, count)
            .iter()
            .any(|s| *s > 0.0 && (close - s).abs() / s < threshold)
    }

    /// Current close above the previous close.
    pub fn is_bounce(&self) -> bool {
        matches!((self.close, self.prev_close), (Some(c), Some(p)) if c > p)
    }
}
