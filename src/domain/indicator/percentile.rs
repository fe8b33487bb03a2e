//! Percentile helpers and rolling percentile rank.

use super::{Indicator, OutputHistory};
use crate::domain::bar::Bar;
use crate::domain::rolling::RollingWindow;

/// Linear-interpolated `p`-th percentile (`p` in 0..=100) of `values`.
///
/// Returns `None` for an empty slice. NaN entries sort last.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = p.clamp(0.0, 100.0);
    let index = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let weight = index - lower as f64;
    match (sorted.get(lower), sorted.get(upper)) {
        (Some(lo), Some(hi)) => Some(lo * (1.0 - weight) + hi * weight),
        (Some(lo), None) => Some(*lo),
        _ => None,
    }
}

/// Position of the newest close within the window's range, in `[0, 1]`.
///
/// `(close - min) / (max - min)`; 0.5 when the window is flat.
#[derive(Debug, Clone)]
pub struct PercentileRank {
    window: RollingWindow<f64>,
    history: OutputHistory<f64>,
}

impl PercentileRank {
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
        if !self.window.is_full() {
            return;
        }
        let (Some(min), Some(max)) = (self.window.min(), self.window.max()) else {
            return;
        };
        let rank = if max == min {
            0.5
        } else {
            (value - min) / (max - min)
        };
        self.history.record(rank);
    }

    /// Relative width of the current window, `(max - min) / mean`.
    pub fn range_width(&self) -> Option<f64> {
        if !self.window.is_full() {
            return None;
        }
        let mean = self.window.mean()?;
        if mean == 0.0 {
            return None;
        }
        Some((self.window.max()? - self.window.min()?) / mean)
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.window.is_full() {
            return None;
        }
        self.window.mean()
    }
}

impl Indicator for PercentileRank {
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
    fn percentile_empty_is_none() {
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [40.0, 10.0, 30.0, 20.0];
        assert!((percentile(&values, 0.0).unwrap() - 10.0).abs() < 1e-12);
        assert!((percentile(&values, 100.0).unwrap() - 40.0).abs() < 1e-12);
        // index 1.5 between 20 and 30
        assert!((percentile(&values, 50.0).unwrap() - 25.0).abs() < 1e-12);
        // index 0.45 between 10 and 20
        assert!((percentile(&values, 15.0).unwrap() - 14.5).abs() < 1e-9);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[7.0], 85.0), Some(7.0));
    }

    #[test]
    fn rank_at_extremes() {
        let mut rank = PercentileRank::new(3);
        for v in [0.3, 0.5, 0.7] {
            rank.push(v);
        }
        assert!((rank.value().unwrap() - 1.0).abs() < 1e-12);
        rank.push(0.3);
        assert!(rank.value().unwrap().abs() < 1e-12);
    }

    #[test]
    fn rank_flat_is_half() {
        let mut rank = PercentileRank::new(4);
        for _ in 0..4 {
            rank.push(0.5);
        }
        assert!((rank.value().unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((rank.range_width().unwrap()).abs() < f64::EPSILON);
    }

    #[test]
    fn rank_warmup() {
        let mut rank = PercentileRank::new(3);
        rank.push(0.5);
        assert!(rank.value().is_none());
        assert!(rank.range_width().is_none());
        assert!(rank.mean().is_none());
    }
}
