//! Donchian channel: rolling extrema of highs and lows.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DonchianValue {
    pub upper: f64,
    pub lower: f64,
    pub middle: f64,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    highs: RollingWindow<f64>,
    lows: RollingWindow<f64>,
    history: OutputHistory<DonchianValue>,
}

impl Donchian {
    pub fn new(period: usize) -> Self {
        Self {
            highs: RollingWindow::new(period),
            lows: RollingWindow::new(period),
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.highs.capacity()
    }

    /// Channel as of the previous bar; breakouts compare the current close to this.
    pub fn prior(&self) -> Option<DonchianValue> {
        self.value_at(1)
    }
}

impl Indicator for Donchian {
    type Output = DonchianValue;

    fn update(&mut self, bar: &Bar) {
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        if !self.highs.is_full() {
            return;
        }
        if let (Some(upper), Some(lower)) = (self.highs.max(), self.lows.min()) {
            self.history.record(DonchianValue {
                upper,
                lower,
                middle: (upper + lower) / 2.0,
            });
        }
    }

    fn value_at(&self, offset: usize) -> Option<DonchianValue> {
        self.history.at(offset)
    }
}
