//! Bollinger Bands.
//!
//! Middle = SMA(close, n)
//! Upper = Middle + k * population_stddev
//! Lower = Middle - k * population_stddev

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub stddev: f64,
}

impl BollingerValue {
    /// Position of `close` within the bands: 0 at the lower band, 1 at the upper.
    /// Returns 0.5 when the bands have zero width.
    pub fn percent_b(&self, close: f64) -> f64 {
        let width = self.upper - self.lower;
        if width == 0.0 {
            return 0.5;
        }
        (close - self.lower) / width
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: RollingWindow<f64>,
    mult: f64,
    history: OutputHistory<BollingerValue>,
}

impl Bollinger {
    pub fn new(period: usize, stddev_mult: f64) -> Self {
        Self {
            window: RollingWindow::new(period),
            mult: stddev_mult,
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.window.capacity()
    }

    pub fn push(&mut self, value: f64) {
        self.window.push(value);
        if !self.window.is_full() {
            return;
        }
        if let (Some(middle), Some(stddev)) = (self.window.mean(), self.window.population_stddev()) {
            self.history.record(BollingerValue {
                upper: middle + self.mult * stddev,
                middle,
                lower: middle - self.mult * stddev,
                stddev,
            });
        }
    }
}

impl Indicator for Bollinger {
    type Output = BollingerValue;

    fn update(&mut self, bar: &Bar) {
        self.push(bar.close);
    }

    fn value_at(&self, offset: usize) -> Option<BollingerValue> {
        self.history.at(offset)
    }
}
