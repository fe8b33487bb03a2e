//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100. If avg_gain == 0 (and avg_loss > 0): RSI = 0.
//!
//! Warmup: needs period + 1 inputs (n price changes).

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev: Option<f64>,
    changes: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    history: OutputHistory<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev: None,
            changes: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn push(&mut self, value: f64) {
        let Some(prev) = self.prev.replace(value) else {
            return;
        };
        let change = value - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.period as f64;

        self.changes += 1;
        if self.changes < self.period {
            self.gain_sum += gain;
            self.loss_sum += loss;
            return;
        }
        if self.changes == self.period {
            self.avg_gain = (self.gain_sum + gain) / n;
            self.avg_loss = (self.loss_sum + loss) / n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }
        self.history.record(rsi_from(self.avg_gain, self.avg_loss));
    }
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
}

impl Indicator for Rsi {
    type Output = f64;

    fn update(&mut self, bar: &Bar) {
        self.push(bar.close);
    }

    fn value_at(&self, offset: usize) -> Option<f64> {
        self.history.at(offset)
    }
}
