//! Pyramiding admission.
//!
//! Every rule also requires an open trade on the same side, fewer than
//! `max_entries` pyramids so far and, when `require_filter` is set, a filter
//! that allows the side. Price thresholds are measured from the most recent
//! fill, not the first one.

use serde::{Deserialize, Serialize};

use crate::components::{FilterState, Signal};
use crate::domain::{Side, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum PyramidRule {
    /// Close advanced `multiple × X` beyond the last entry.
    XMultiple { multiple: f64 },
    /// Close advanced `pct` of the last entry price beyond it.
    Percent { pct: f64 },
    /// Close advanced a fixed price distance beyond the last entry.
    Fixed { offset: f64 },
    /// The provider that opened the trade fired again.
    SameSignal,
    /// Any other provider fired.
    DifferentSignal,
    /// Any provider fired.
    EverySignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PyramidingConfig {
    pub enabled: bool,
    pub rule: PyramidRule,
    /// Maximum pyramided entries per trade, not counting the first.
    pub max_entries: usize,
    /// Pyramid size as a multiple of the sizer's result.
    pub position_multiple: f64,
    pub require_filter: bool,
}

impl Default for PyramidingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rule: PyramidRule::XMultiple { multiple: 1.0 },
            max_entries: 3,
            position_multiple: 1.0,
            require_filter: false,
        }
    }
}

/// Whether a pyramid entry on `side` may trigger on this bar.
///
/// `signals` holds this bar's output of every entry provider, in configuration order.
pub fn admits(
    config: &PyramidingConfig,
    trade: &Trade,
    side: Side,
    close: f64,
    signals: &[Signal],
    filter: FilterState,
) -> bool {
    if !config.enabled || trade.side != side || trade.pyramids.len() >= config.max_entries {
        return false;
    }
    if config.require_filter && !filter.allows(side) {
        return false;
    }
    let advance = side.gain(trade.last_entry_price, close);
    match config.rule {
        PyramidRule::XMultiple { multiple } => advance >= multiple * trade.first.risk_unit,
        PyramidRule::Percent { pct } => advance >= pct * trade.last_entry_price,
        PyramidRule::Fixed { offset } => advance >= offset,
        PyramidRule::SameSignal => signals
            .get(trade.origin)
            .is_some_and(|s| s.fires(side)),
        PyramidRule::DifferentSignal => signals
            .iter()
            .enumerate()
            .any(|(i, s)| i != trade.origin && s.fires(side)),
        PyramidRule::EverySignal => signals.iter().any(|s| s.fires(side)),
    }
}
