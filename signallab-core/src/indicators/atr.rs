//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the mean true range over the last `period` bars, so that it
//! remains a pure function of a fixed window of history.
//! Lookback: period + 1 (every TR in the window needs a previous close).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range of `bars[i]`; `None` for the first bar (no previous close).
pub fn true_range(bars: &[Bar], i: usize) -> Option<f64> {
    if i == 0 || i >= bars.len() {
        return None;
    }
    let h = bars[i].high;
    let l = bars[i].low;
    let pc = bars[i - 1].close;
    Some((h - l).max((h - pc).abs()).max((l - pc).abs()))
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn value(&self, bars: &[Bar]) -> Option<f64> {
        atr(bars, self.period)
    }
}

/// Mean true range over the last `period` bars of `bars`.
pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    let n = bars.len();
    if period == 0 || n < period + 1 {
        return None;
    }
    let mut sum = 0.0;
    for i in n - period..n {
        sum += true_range(bars, i)?;
    }
    let atr = sum / period as f64;
    atr.is_finite().then_some(atr)
}
