//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` closes. Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn value(&self, bars: &[Bar]) -> Option<f64> {
        sma(bars, self.period)
    }
}

/// Mean of the last `period` closes of `bars`.
pub fn sma(bars: &[Bar], period: usize) -> Option<f64> {
    let n = bars.len();
    if period == 0 || n < period {
        return None;
    }
    let sum: f64 = bars[n - period..].iter().map(|b| b.close).sum();
    let mean = sum / period as f64;
    mean.is_finite().then_some(mean)
}
