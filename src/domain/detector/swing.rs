//! Swing low / swing high detection.
//!
//! Keeps `2 * window + 1` closes. The centre close is a swing low when it is
//! strictly below every other close in the buffer (swing high mirrors this), so
//! a swing is confirmed `window` bars after it happened.

use crate::domain::rolling::RollingWindow;

#[derive(Debug, Clone)]
pub struct SwingDetector {
    window: usize,
    closes: RollingWindow<f64>,
}

impl SwingDetector {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            closes: RollingWindow::new(2 * window + 1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn push(&mut self, close: f64) {
        self.closes.push(close);
    }

    fn centre(&self) -> Option<f64> {
        if !self.closes.is_full() {
            return None;
        }
        self.closes.back(self.window)
    }

    pub fn swing_low(&self) -> bool {
        let Some(centre) = self.centre() else {
            return false;
        };
        self.closes
            .values()
            .enumerate()
            .filter(|(i, _)| *i != self.window)
            .all(|(_, v)| centre < v)
    }

    pub fn swing_high(&self) -> bool {
        let Some(centre) = self.centre() else {
            return false;
        };
        self.closes
            .values()
            .enumerate()
            .filter(|(i, _)| *i != self.window)
            .all(|(_, v)| centre > v)
    }
}
