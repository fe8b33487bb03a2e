//! Price bar representation for binary-outcome tokens.

use chrono::{DateTime, Utc};

/// One OHLC observation for a token. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub token_id: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(token_id: &str, timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            token_id: token_id.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// A bar built from a single price point (open = high = low = close).
    pub fn from_price(token_id: &str, timestamp: i64, price: f64) -> Self {
        Self::new(token_id, timestamp, price, price, price, price)
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
