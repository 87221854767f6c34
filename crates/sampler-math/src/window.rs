//! Fixed-capacity trailing window with an arithmetic mean.

use std::collections::VecDeque;

/// FIFO window over the most recent `capacity` values.
///
/// Once full, each push evicts the oldest entry. The mean is recomputed from
/// the stored values, so there is no accumulated floating-point drift no
/// matter how long the process runs.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    values: VecDeque<f64>,
    capacity: usize,
    min_samples: usize,
}

impl RollingAverage {
    /// Window whose mean is "ready" only once it is full.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_min_samples(capacity, capacity)
    }

    /// Window that reports a ready mean after `min_samples` pushes.
    /// `min_samples` is clamped to `1..=capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_min_samples(capacity: usize, min_samples: usize) -> Self {
        assert!(capacity > 0, "rolling window capacity must be positive");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            min_samples: min_samples.clamp(1, capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Whether enough values have been pushed for [`ready_mean`](Self::ready_mean).
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.min_samples
    }

    /// Mean of the current entries, or `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    /// Mean of the current entries once the window is ready.
    pub fn ready_mean(&self) -> Option<f64> {
        if self.is_ready() {
            self.mean()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_mean() {
        let w = RollingAverage::new(3);
        assert!(w.mean().is_none());
        assert!(w.ready_mean().is_none());
        assert!(w.is_empty());
    }

    #[test]
    fn test_partial_window_mean() {
        let mut w = RollingAverage::new(4);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.mean(), Some(1.5));
        assert!(!w.is_ready());
        assert!(w.ready_mean().is_none());
    }

    #[test]
    fn test_overwrites_oldest() {
        let mut w = RollingAverage::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            w.push(v);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.mean(), Some(4.0));
        assert_eq!(w.ready_mean(), Some(4.0));
    }

    #[test]
    fn test_min_samples_clamped() {
        let w = RollingAverage::with_min_samples(5, 0);
        assert_eq!(w.min_samples(), 1);
        let w = RollingAverage::with_min_samples(5, 50);
        assert_eq!(w.min_samples(), 5);
    }

    #[test]
    fn test_clear() {
        let mut w = RollingAverage::with_min_samples(5, 1);
        w.push(9.0);
        assert!(w.is_ready());
        w.clear();
        assert!(w.mean().is_none());
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn test_zero_capacity_panics() {
        let _ = RollingAverage::new(0);
    }
}
