//! Fixed-capacity rolling window.
//!
//! Insertion-ordered, oldest evicted first. Every windowed computation in the
//! indicator set and the detectors is built on this type.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> RollingWindow<T> {
    /// Capacity 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted oldest value if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// Values ordered oldest to newest.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = T> + ExactSizeIterator + Clone + '_ {
        self.buf.iter().copied()
    }

    /// The newest `n` values, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = T> + Clone + '_ {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip).copied()
    }

    /// Every value except the newest, oldest first.
    pub fn prior(&self) -> impl Iterator<Item = T> + Clone + '_ {
        let n = self.buf.len().saturating_sub(1);
        self.buf.iter().take(n).copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<T> {
        self.buf.back().copied()
    }

    /// Value `offset` steps before the newest (0 = newest).
    pub fn back(&self, offset: usize) -> Option<T> {
        let len = self.buf.len();
        if offset >= len {
            return None;
        }
        self.buf.get(len - 1 - offset).copied()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl RollingWindow<f64> {
    pub fn sum(&self) -> f64 {
        self.buf.iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }
        Some(self.sum() / self.buf.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        fold_min(self.values())
    }

    pub fn max(&self) -> Option<f64> {
        fold_max(self.values())
    }

    /// Minimum of every value except the newest.
    pub fn prior_min(&self) -> Option<f64> {
        fold_min(self.prior())
    }

    /// Maximum of every value except the newest.
    pub fn prior_max(&self) -> Option<f64> {
        fold_max(self.prior())
    }

    /// Population standard deviation (divides by N).
    pub fn population_stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.buf.len() as f64;
        let var = self.buf.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(var.sqrt())
    }
}

pub(crate) fn fold_min(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc: Option<f64>, v| {
        Some(match acc {
            Some(m) if m <= v => m,
            _ => v,
        })
    })
}

pub(crate) fn fold_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc: Option<f64>, v| {
        Some(match acc {
            Some(m) if m >= v => m,
            _ => v,
        })
    })
}
