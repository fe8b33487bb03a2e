//! Consecutive-bar run counter.

#[derive(Debug, Clone, Default)]
pub struct RunCounter {
    prev: Option<f64>,
    up: usize,
    down: usize,
}

impl RunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An unchanged close resets both runs.
    pub fn push(&mut self, close: f64) {
        if let Some(prev) = self.prev {
            if close > prev {
                self.up += 1;
                self.down = 0;
            } else if close < prev {
                self.down += 1;
                self.up = 0;
            } else {
                self.up = 0;
                self.down = 0;
            }
        }
        self.prev = Some(close);
    }

    pub fn up_run(&self) -> usize {
        self.up
    }

    pub fn down_run(&self) -> usize {
        self.down
    }
}
