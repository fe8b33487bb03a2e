//! ATR (Average True Range).
//!
//! True range = max(high - low, |high - prev_close|, |low - prev_close|); the
//! first bar has no previous close and uses high - low. Seeded with the mean of
//! the first `period` true ranges, then Wilder-smoothed.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seen: usize,
    seed_sum: f64,
    current: Option<f64>,
    history: OutputHistory<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            seen: 0,
            seed_sum: 0.0,
            current: None,
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// ATR as a fraction of `price`; `None` before warm-up or for a non-positive price.
    pub fn relative_to(&self, price: f64) -> Option<f64> {
        if price <= 0.0 {
            return None;
        }
        self.value().map(|atr| atr / price)
    }
}

impl Indicator for Atr {
    type Output = f64;

    fn update(&mut self, bar: &Bar) {
        let tr = match self.prev_close {
            Some(pc) => bar.true_range(pc),
            None => bar.high - bar.low,
        };
        self.prev_close = Some(bar.close);

        let n = self.period as f64;
        let next = match self.current {
            Some(prev) => (prev * (n - 1.0) + tr) / n,
            None => {
                self.seed_sum += tr;
                self.seen += 1;
                if self.seen < self.period {
                    return;
                }
                self.seed_sum / n
            }
        };
        self.current = Some(next);
        self.history.record(next);
    }

    fn value_at(&self, offset: usize) -> Option<f64> {
        self.history.at(offset)
    }
}
