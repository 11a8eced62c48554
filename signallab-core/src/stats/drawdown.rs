//! Running drawdown.
//!
//! The tracker keeps its own peak and trough; a new peak resets the trough.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownTracker {
    pub peak: f64,
    pub trough: f64,
    pub last: f64,
    /// Largest peak-to-trough decline, in equity units.
    pub max_drawdown: f64,
    /// Largest peak-to-trough decline as a fraction of its peak.
    pub max_drawdown_pct: f64,
    pub samples: usize,
}

impl DrawdownTracker {
    pub fn new(initial: f64) -> Self {
        Self {
            peak: initial,
            trough: initial,
            last: initial,
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
            samples: 0,
        }
    }

    pub fn sample(&mut self, equity: f64) {
        self.samples += 1;
        self.last = equity;
        if equity > self.peak {
            self.peak = equity;
            self.trough = equity;
            return;
        }
        if equity < self.trough {
            self.trough = equity;
        }
        let dd = self.peak - self.trough;
        if dd > self.max_drawdown {
            self.max_drawdown = dd;
        }
        if self.peak > 0.0 {
            self.max_drawdown_pct = self.max_drawdown_pct.max(dd / self.peak);
        }
    }

    /// Decline of the latest sample from the running peak.
    pub fn current_drawdown(&self) -> f64 {
        (self.peak - self.last).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_drawdown() {
        let mut dd = DrawdownTracker::new(1.0);
        for eq in [1.1, 0.99, 1.05, 1.2, 1.08] {
            dd.sample(eq);
        }
        // declines: 1.1 -> 0.99 and 1.2 -> 1.08, both 10%
        assert!((dd.max_drawdown - 0.12).abs() < 1e-12);
        assert!((dd.max_drawdown_pct - 0.1).abs() < 1e-12);
        assert!((dd.current_drawdown() - 0.12).abs() < 1e-12);
        assert_eq!(dd.samples, 5);
    }

    #[test]
    fn new_peak_resets_trough() {
        let mut dd = DrawdownTracker::new(1.0);
        dd.sample(0.9);
        dd.sample(1.3);
        assert_eq!(dd.trough, 1.3);
        dd.sample(1.25);
        assert_eq!(dd.trough, 1.25);
    }

    #[test]
    fn monotonic_increase_has_no_drawdown() {
        let mut dd = DrawdownTracker::new(1.0);
        for i in 1..10 {
            dd.sample(1.0 + i as f64 * 0.1);
        }
        assert_eq!(dd.max_drawdown, 0.0);
        assert_eq!(dd.current_drawdown(), 0.0);
    }
}
