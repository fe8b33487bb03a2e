//! Simple Moving Average.
//!
//! Arithmetic mean of the last `period` inputs. No value until `period` inputs seen.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone)]
pub struct Sma {
    window: RollingWindow<f64>,
    history: OutputHistory<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.window.capacity()
    }

    pub fn push(&mut self, value: f64) {
        self.window.push(value);
        if self.window.is_full() {
            if let Some(mean) = self.window.mean() {
                self.history.record(mean);
            }
        }
    }
}

impl Indicator for Sma {
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
    fn sma_none_before_period() {
        let mut sma = Sma::new(3);
        sma.push(1.0);
        sma.push(2.0);
        assert_eq!(sma.value(), None);
        assert!(!sma.is_ready());
    }

    #[test]
    fn sma_at_period_is_mean() {
        let mut sma = Sma::new(3);
        for v in [1.0, 2.0, 3.0] {
            sma.push(v);
        }
        assert!((sma.value().unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_slides() {
        let mut sma = Sma::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            sma.push(v);
        }
        assert!((sma.value().unwrap() - 4.0).abs() < f64::EPSILON);
        assert!((sma.value_at(1).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((sma.value_at(2).unwrap() - 2.0).abs() < f64::EPSILON);
        assert_eq!(sma.value_at(3), None);
    }

    #[test]
    fn sma_update_uses_close() {
        let mut sma = Sma::new(2);
        sma.update(&Bar::new("t", 1, 0.1, 0.9, 0.1, 0.4));
        sma.update(&Bar::new("t", 2, 0.1, 0.9, 0.1, 0.6));
        assert!((sma.value().unwrap() - 0.5).abs() < 1e-12);
    }
}
