//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! Three bands are exposed as separate instances:
//! - Upper: max(high[t-period+1..=t])
//! - Lower: min(low[t-period+1..=t])
//! - Center: (upper + lower) / 2
//!
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
    Center,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    fn with_band(period: usize, band: DonchianBand, label: &str) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band,
            name: format!("donchian_{label}_{period}"),
        }
    }

    pub fn upper(period: usize) -> Self {
        Self::with_band(period, DonchianBand::Upper, "upper")
    }

    pub fn lower(period: usize) -> Self {
        Self::with_band(period, DonchianBand::Lower, "lower")
    }

    pub fn center(period: usize) -> Self {
        Self::with_band(period, DonchianBand::Center, "center")
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn value(&self, bars: &[Bar]) -> Option<f64> {
        donchian(bars, self.period, self.band)
    }
}

/// Donchian band over the last `period` bars of `bars`.
pub fn donchian(bars: &[Bar], period: usize, band: DonchianBand) -> Option<f64> {
    let n = bars.len();
    if period == 0 || n < period {
        return None;
    }
    let window = &bars[n - period..];
    let upper = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lower = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let v = match band {
        DonchianBand::Upper => upper,
        DonchianBand::Lower => lower,
        DonchianBand::Center => (upper + lower) / 2.0,
    };
    v.is_finite().then_some(v)
}
