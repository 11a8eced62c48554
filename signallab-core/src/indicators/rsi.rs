//! Relative Strength Index (RSI).
//!
//! Mean gain and mean loss over the last `period` close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period + 1.
//! Edge cases: avg_loss == 0 → RSI = 100 (50 when there was no movement at all).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn value(&self, bars: &[Bar]) -> Option<f64> {
        rsi(bars, self.period)
    }
}

/// RSI at the last bar of `bars`.
pub fn rsi(bars: &[Bar], period: usize) -> Option<f64> {
    let n = bars.len();
    if period == 0 || n < period + 1 {
        return None;
    }
    let mut gain = 0.0;
    let mut loss = 0.0;
    for i in n - period..n {
        let change = bars[i].close - bars[i - 1].close;
        if change > 0.0 {
            gain += change;
        } else {
            loss -= change;
        }
    }
    let rsi = compute_rsi(gain / period as f64, loss / period as f64);
    rsi.is_finite().then_some(rsi)
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
