//! Indicator trait.
//!
//! Indicators are pure functions of bar history: the value at the last bar of
//! the slice, computed from that bar and the ones before it only. The previous
//! bar's value is obtained by passing `&bars[..bars.len() - 1]`.

use crate::domain::Bar;

/// Trait for window indicators.
///
/// # Look-ahead contamination guard
/// `value(bars)` may only read `bars`; callers never pass bars past the
/// decision bar. Returns `None` until `lookback()` bars of history exist
/// (warm-up), never a placeholder zero.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces a value.
    fn lookback(&self) -> usize;

    /// Value at the last bar of `bars`.
    fn value(&self, bars: &[Bar]) -> Option<f64>;

    /// Value at the bar before the last one.
    fn previous(&self, bars: &[Bar]) -> Option<f64> {
        match bars.len() {
            0 => None,
            n => self.value(&bars[..n - 1]),
        }
    }
}
