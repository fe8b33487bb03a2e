//! Volatility-scaled adaptive lookback.
//!
//! `lookback = round(base / (recent_vol / historical_vol))`, clamped to `[min, max]`.
//! Volatility is normalized (stddev / mean) so it is comparable across price levels.

use super::IndicatorKind;
use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

/// Population stddev / mean. 0 for fewer than 2 values or a zero mean.
pub fn normalized_volatility(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count();
    if n < 2 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    var.sqrt() / mean
}

pub fn adaptive_lookback(base: usize, recent_vol: f64, historical_vol: f64, min: usize, max: usize) -> usize {
    if historical_vol == 0.0 {
        return base.clamp(min, max);
    }
    if recent_vol == 0.0 {
        return max;
    }
    let ratio = recent_vol / historical_vol;
    let raw = (base as f64 / ratio).round();
    if !raw.is_finite() || raw >= max as f64 {
        return max;
    }
    if raw <= min as f64 {
        return min;
    }
    raw as usize
}

/// Streams closes and reports the current adaptive lookback.
#[derive(Debug, Clone)]
pub struct AdaptiveLookback {
    base: usize,
    min: usize,
    max: usize,
    recent_period: usize,
    closes: RollingWindow<f64>,
}

impl AdaptiveLookback {
    /// `min <= base <= max` is enforced by raising `max` and lowering `min` as needed.
    pub fn new(base: usize, min: usize, max: usize, recent_period: usize) -> Self {
        let min = min.max(1).min(base.max(1));
        let max = max.max(base).max(min);
        Self {
            base: base.clamp(min, max),
            min,
            max,
            recent_period: recent_period.max(2),
            closes: RollingWindow::new(max),
        }
    }

    pub fn push(&mut self, close: f64) {
        self.closes.push(close);
    }

    pub fn update(&mut self, bar: &Bar) {
        self.push(bar.close);
    }

    pub fn lookback(&self) -> usize {
        if self.closes.len() < self.recent_period {
            return self.base;
        }
        let recent = normalized_volatility(self.closes.last_n(self.recent_period));
        let historical = normalized_volatility(self.closes.values());
        adaptive_lookback(self.base, recent, historical, self.min, self.max)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn kind(&self) -> IndicatorKind {
        IndicatorKind::AdaptiveLookback {
            base: self.base,
            min: self.min,
            max: self.max,
        }
    }
}
