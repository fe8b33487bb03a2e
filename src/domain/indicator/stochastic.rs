//! Stochastic oscillator (%K / %D).
//!
//! %K = (close - lowest_low) / (highest_high - lowest_low) * 100 over `k_period`
//! bars, 50 when the window is flat. %D = simple mean of the last `d_period` %K.
//!
//! The %K window can be narrowed or widened at runtime (up to the capacity given
//! at construction) for volatility-adaptive variants.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;
use crate::domain::rolling::{RollingWindow, fold_max, fold_min};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: f64,
    /// `None` until `d_period` %K values have been produced.
    pub d: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    highs: RollingWindow<f64>,
    lows: RollingWindow<f64>,
    k_values: RollingWindow<f64>,
    history: OutputHistory<StochasticValue>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self::with_max_period(k_period, d_period, k_period)
    }

    /// A stochastic whose %K period may later be changed within `1..=max_k_period`.
    pub fn with_max_period(k_period: usize, d_period: usize, max_k_period: usize) -> Self {
        let max_k_period = max_k_period.max(k_period).max(1);
        Self {
            k_period: k_period.clamp(1, max_k_period),
            highs: RollingWindow::new(max_k_period),
            lows: RollingWindow::new(max_k_period),
            k_values: RollingWindow::new(d_period),
            history: OutputHistory::new(),
        }
    }

    pub fn k_period(&self) -> usize {
        self.k_period
    }

    pub fn d_period(&self) -> usize {
        self.k_values.capacity()
    }

    pub fn set_k_period(&mut self, k_period: usize) {
        self.k_period = k_period.clamp(1, self.highs.capacity());
    }

    pub fn k(&self) -> Option<f64> {
        self.value().map(|v| v.k)
    }

    pub fn d(&self) -> Option<f64> {
        self.value().and_then(|v| v.d)
    }
}

impl Indicator for Stochastic {
    type Output = StochasticValue;

    fn update(&mut self, bar: &Bar) {
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        if self.highs.len() < self.k_period {
            return;
        }

        let (Some(highest), Some(lowest)) = (
            fold_max(self.highs.last_n(self.k_period)),
            fold_min(self.lows.last_n(self.k_period)),
        ) else {
            return;
        };
        let k = if highest == lowest {
            50.0
        } else {
            ((bar.close - lowest) / (highest - lowest) * 100.0).clamp(0.0, 100.0)
        };

        self.k_values.push(k);
        let d = if self.k_values.is_full() {
            self.k_values.mean()
        } else {
            None
        };
        self.history.record(StochasticValue { k, d });
    }

    fn value_at(&self, offset: usize) -> Option<StochasticValue> {
        self.history.at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(stoch: &mut Stochastic, closes: &[f64]) {
        for (i, c) in closes.iter().enumerate() {
            stoch.update(&Bar::from_price("t", i as i64, *c));
        }
    }

    #[test]
    fn stochastic_warmup() {
        let mut stoch = Stochastic::new(3, 2);
        feed(&mut stoch, &[0.4, 0.5]);
        assert!(stoch.value().is_none());
        feed(&mut stoch, &[0.6]);
        let v = stoch.value().unwrap();
        assert!((v.k - 100.0).abs() < 1e-9);
        assert_eq!(v.d, None);
    }

    #[test]
    fn stochastic_flat_window_is_50() {
        let mut stoch = Stochastic::new(3, 1);
        feed(&mut stoch, &[0.5, 0.5, 0.5]);
        assert!((stoch.k().unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let mut stoch = Stochastic::new(3, 2);
        // k: [0.4,0.6,0.5] -> 50; [0.6,0.5,0.6] -> 100
        feed(&mut stoch, &[0.4, 0.6, 0.5, 0.6]);
        let v = stoch.value().unwrap();
        assert!((v.k - 100.0).abs() < 1e-9);
        assert!((v.d.unwrap() - 75.0).abs() < 1e-9);
        assert!((stoch.value_at(1).unwrap().k - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_uses_high_low() {
        let mut stoch = Stochastic::new(2, 1);
        stoch.update(&Bar::new("t", 1, 0.5, 0.8, 0.2, 0.5));
        stoch.update(&Bar::new("t", 2, 0.5, 0.6, 0.4, 0.5));
        // (0.5 - 0.2) / (0.8 - 0.2) = 0.5
        assert!((stoch.k().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_adaptive_period() {
        let mut stoch = Stochastic::with_max_period(2, 1, 5);
        feed(&mut stoch, &[0.1, 0.9, 0.3, 0.4, 0.5]);
        // last 2: [0.4, 0.5] -> close at high
        assert!((stoch.k().unwrap() - 100.0).abs() < 1e-9);
        stoch.set_k_period(5);
        feed(&mut stoch, &[0.5]);
        // window [0.9, 0.3, 0.4, 0.5, 0.5]: (0.5 - 0.3) / 0.6
        assert!((stoch.k().unwrap() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn set_k_period_clamped_to_capacity() {
        let mut stoch = Stochastic::with_max_period(3, 3, 8);
        stoch.set_k_period(50);
        assert_eq!(stoch.k_period(), 8);
        stoch.set_k_period(0);
        assert_eq!(stoch.k_period(), 1);
    }
}
