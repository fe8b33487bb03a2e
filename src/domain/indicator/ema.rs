//! Exponential Moving Average.
//!
//! - Multiplier: k = 2 / (period + 1)
//! - Seed: simple mean of the first `period` inputs
//! - Subsequent: ema = (price - prev_ema) * k + prev_ema
//!
//! Warmup: first period-1 inputs produce no value.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    seen: usize,
    current: Option<f64>,
    history: OutputHistory<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            current: None,
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn push(&mut self, value: f64) {
        let next = match self.current {
            Some(prev) => (value - prev) * self.multiplier + prev,
            None => {
                self.seed_sum += value;
                self.seen += 1;
                if self.seen < self.period {
                    return;
                }
                self.seed_sum / self.period as f64
            }
        };
        self.current = Some(next);
        self.history.record(next);
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn update(&mut self, bar: &Bar) {
        self.push(bar.close);
    }

    fn value_at(&self, offset: usize) -> Option<f64> {
        self.history.at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let mut ema = Ema::new(3);
        ema.push(10.0);
        ema.push(11.0);
        assert_eq!(ema.value(), None);
        ema.push(12.0);
        assert!((ema.value().unwrap() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recurrence_after_seed() {
        let mut ema = Ema::new(3);
        for v in [10.0, 11.0, 12.0, 13.0] {
            ema.push(v);
        }
        // k = 0.5, seed 11.0 -> (13 - 11) * 0.5 + 11 = 12.0
        assert!((ema.value().unwrap() - 12.0).abs() < f64::EPSILON);
        assert!((ema.value_at(1).unwrap() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_one_tracks_input() {
        let mut ema = Ema::new(1);
        for v in [0.3, 0.7, 0.1, 0.9] {
            ema.push(v);
            assert!((ema.value().unwrap() - v).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_constant_series() {
        let mut ema = Ema::new(5);
        for _ in 0..20 {
            ema.push(0.42);
        }
        assert!((ema.value().unwrap() - 0.42).abs() < 1e-12);
    }

    #[test]
    fn ema_period_zero_raised_to_one() {
        let ema = Ema::new(0);
        assert_eq!(ema.period(), 1);
    }
}
