//! Multi-signal confluence within a bar window.
//!
//! Tracks the bar index of the most recent occurrence of each sub-signal. The
//! confluence fires only when every sub-signal occurred within `window` bars of
//! the current one. Consumers clear it once acted upon so stale signals cannot
//! re-fire.

#[derive(Debug, Clone)]
pub struct Confluence {
    window: u64,
    last_seen: Vec<Option<u64>>,
}

impl Confluence {
    pub fn new(signals: usize, window: u64) -> Self {
        Self {
            window,
            last_seen: vec![None; signals],
        }
    }

    /// Record that sub-signal `signal` occurred at `bar`. Out-of-range indices are ignored.
    pub fn record(&mut self, signal: usize, bar: u64) {
        if let Some(slot) = self.last_seen.get_mut(signal) {
            *slot = Some(bar);
        }
    }

    pub fn last_seen(&self, signal: usize) -> Option<u64> {
        self.last_seen.get(signal).copied().flatten()
    }

    pub fn is_confirmed(&self, bar: u64) -> bool {
        !self.last_seen.is_empty()
            && self.last_seen.iter().all(|seen| match seen {
                Some(at) => bar >= *at && bar - at <= self.window,
                None => false,
            })
    }

    pub fn clear(&mut self) {
        self.last_seen.iter_mut().for_each(|s| *s = None);
    }
}
