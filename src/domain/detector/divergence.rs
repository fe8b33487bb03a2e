//! Price / oscillator divergence.
//!
//! Bullish: close at or below the lowest prior close of the window while the
//! oscillator sits above its own lowest prior value and below `oversold`.
//! Bearish mirrors it against the window highs and `overbought`.
//! The current observation is excluded from the extrema it is compared to.

use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone)]
pub struct DivergenceDetector {
    prices: RollingWindow<f64>,
    oscillator: RollingWindow<f64>,
}

impl DivergenceDetector {
    pub fn new(lookback: usize) -> Self {
        let lookback = lookback.max(2);
        Self {
            prices: RollingWindow::new(lookback),
            oscillator: RollingWindow::new(lookback),
        }
    }

    pub fn lookback(&self) -> usize {
        self.prices.capacity()
    }

    pub fn update(&mut self, close: f64, oscillator: f64) {
        self.prices.push(close);
        self.oscillator.push(oscillator);
    }

    pub fn is_ready(&self) -> bool {
        self.prices.is_full()
    }

    pub fn bullish(&self, oversold: f64) -> bool {
        if !self.is_ready() {
            return false;
        }
        match (
            self.prices.latest(),
            self.prices.prior_min(),
            self.oscillator.latest(),
            self.oscillator.prior_min(),
        ) {
            (Some(close), Some(price_low), Some(osc), Some(osc_low)) => {
                close <= price_low && osc > osc_low && osc < oversold
            }
            _ => false,
        }
    }

    pub fn bearish(&self, overbought: f64) -> bool {
        if !self.is_ready() {
            return false;
        }
        match (
            self.prices.latest(),
            self.prices.prior_max(),
            self.oscillator.latest(),
            self.oscillator.prior_max(),
        ) {
            (Some(close), Some(price_high), Some(osc), Some(osc_high)) => {
                close >= price_high && osc < osc_high && osc > overbought
            }
            _ => false,
        }
    }

    pub fn detect(&self, oversold: f64, overbought: f64) -> Option<Divergence> {
        if self.bullish(oversold) {
            Some(Divergence::Bullish)
        } else if self.bearish(overbought) {
            Some(Divergence::Bearish)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.oscillator.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector_with(pairs: &[(f64, f64)], lookback: usize) -> DivergenceDetector {
        let mut det = DivergenceDetector::new(lookback);
        for (price, osc) in pairs {
            det.update(*price, *osc);
        }
        det
    }

    #[test]
    fn bullish_divergence() {
        // price makes a lower low, RSI holds above its earlier low, still oversold
        let det = detector_with(&[(0.50, 20.0), (0.45, 15.0), (0.48, 22.0), (0.44, 18.0)], 4);
        assert!(det.bullish(30.0));
        assert_eq!(det.detect(30.0, 70.0), Some(Divergence::Bullish));
    }

    #[test]
    fn no_bullish_when_oscillator_confirms_low() {
        let det = detector_with(&[(0.50, 20.0), (0.45, 15.0), (0.48, 22.0), (0.44, 10.0)], 4);
        assert!(!det.bullish(30.0));
    }

    #[test]
    fn no_bullish_above_oversold() {
        let det = detector_with(&[(0.50, 40.0), (0.45, 35.0), (0.48, 42.0), (0.44, 38.0)], 4);
        assert!(!det.bullish(30.0));
    }

    #[test]
    fn bearish_divergence() {
        let det = detector_with(&[(0.50, 80.0), (0.55, 85.0), (0.52, 78.0), (0.56, 82.0)], 4);
        assert!(det.bearish(75.0));
        assert_eq!(det.detect(30.0, 75.0), Some(Divergence::Bearish));
    }

    #[test]
    fn not_ready_until_full() {
        let det = detector_with(&[(0.50, 20.0), (0.44, 25.0)], 4);
        assert!(!det.is_ready());
        assert_eq!(det.detect(30.0, 70.0), None);
    }
}
