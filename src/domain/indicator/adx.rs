//! ADX (Average Directional Index).
//!
//! - +DM = high - prev_high when that exceeds prev_low - low (and is positive), else 0
//! - -DM = prev_low - low when that exceeds high - prev_high (and is positive), else 0
//! - TR, +DM, -DM sums seeded with the plain sum of the first `period` deltas,
//!   then smoothed as s - s/n + x
//! - +DI / -DI = smoothed DM / smoothed TR * 100; nothing is emitted while
//!   smoothed TR is 0, so a flat opening stretch never seeds ADX
//! - DX = |+DI - -DI| / (+DI + -DI + 1e-4) * 100
//! - First ADX = first DX, then (prev * (n-1) + dx) / n
//!
//! Warmup: period + 1 bars.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;

const DX_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxValue {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    deltas: usize,
    tr_sum: f64,
    plus_dm_sum: f64,
    minus_dm_sum: f64,
    adx: Option<f64>,
    history: OutputHistory<AdxValue>,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev: None,
            deltas: 0,
            tr_sum: 0.0,
            plus_dm_sum: 0.0,
            minus_dm_sum: 0.0,
            adx: None,
            history: OutputHistory::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Adx {
    type Output = AdxValue;

    fn update(&mut self, bar: &Bar) {
        let Some((prev_high, prev_low, prev_close)) =
            self.prev.replace((bar.high, bar.low, bar.close))
        else {
            return;
        };

        let up = bar.high - prev_high;
        let down = prev_low - bar.low;
        let plus_dm = if up > down { up.max(0.0) } else { 0.0 };
        let minus_dm = if down > up { down.max(0.0) } else { 0.0 };
        let tr = bar.true_range(prev_close);

        let n = self.period as f64;
        self.deltas += 1;
        if self.deltas <= self.period {
            self.tr_sum += tr;
            self.plus_dm_sum += plus_dm;
            self.minus_dm_sum += minus_dm;
            if self.deltas < self.period {
                return;
            }
        } else {
            self.tr_sum = self.tr_sum - self.tr_sum / n + tr;
            self.plus_dm_sum = self.plus_dm_sum - self.plus_dm_sum / n + plus_dm;
            self.minus_dm_sum = self.minus_dm_sum - self.minus_dm_sum / n + minus_dm;
        }

        if self.tr_sum <= 0.0 {
            return;
        }
        let plus_di = self.plus_dm_sum / self.tr_sum * 100.0;
        let minus_di = self.minus_dm_sum / self.tr_sum * 100.0;
        let dx = (plus_di - minus_di).abs() / (plus_di + minus_di + DX_EPSILON) * 100.0;
        let adx = match self.adx {
            Some(prev) => (prev * (n - 1.0) + dx) / n,
            None => dx,
        };
        self.adx = Some(adx);
        self.history.record(AdxValue {
            adx,
            plus_di,
            minus_di,
        });
    }

    fn value_at(&self, offset: usize) -> Option<AdxValue> {
        self.history.at(offset)
    }
}
