//! Entry filters: gate first entries by market regime.
//!
//! A filter looks at bar history only and says which sides may open a trade
//! on the decision bar. `NotReady` allows neither side.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::{Bar, Side};
use crate::indicators::{rsi, Sma};

/// Per-bar output of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterState {
    NotReady,
    Allow { long: bool, short: bool },
}

impl FilterState {
    pub const BOTH: FilterState = FilterState::Allow {
        long: true,
        short: true,
    };

    pub const NEITHER: FilterState = FilterState::Allow {
        long: false,
        short: false,
    };

    pub fn only(side: Side) -> Self {
        FilterState::Allow {
            long: side == Side::Long,
            short: side == Side::Short,
        }
    }

    pub fn allows(self, side: Side) -> bool {
        match (self, side) {
            (FilterState::NotReady, _) => false,
            (FilterState::Allow { long, .. }, Side::Long) => long,
            (FilterState::Allow { short, .. }, Side::Short) => short,
        }
    }
}

/// Trait for entry filters.
///
/// # Architecture invariant
/// Filters must not reference trade state; they evaluate market conditions only.
pub trait FilterProvider: Send + Sync {
    /// Human-readable name (e.g., "ma_regime", "none").
    fn name(&self) -> &str;

    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar]) -> FilterState;
}

/// Built-in filters, selected by `type` in configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum FilterStrategy {
    #[default]
    None,
    MaRegime {
        period: usize,
    },
    RsiBand {
        period: usize,
        long_above: f64,
        short_below: f64,
    },
    /// Most recent ±1 code on the external channel, searched over the last
    /// `lookback` bars, or the whole history when unset.
    External {
        #[serde(default)]
        lookback: Option<usize>,
    },
}

/// Pass-through filter: both sides always allowed.
pub struct NoFilter;

impl FilterProvider for NoFilter {
    fn name(&self) -> &str {
        "none"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, _bars: &[Bar]) -> FilterState {
        FilterState::BOTH
    }
}

/// Trend regime: longs above the SMA, shorts below it.
#[derive(Debug, Clone)]
pub struct MaRegimeFilter {
    ma: Sma,
}

impl MaRegimeFilter {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "period must be >= 1");
        Self { ma: Sma::new(period) }
    }
}

impl FilterProvider for MaRegimeFilter {
    fn name(&self) -> &str {
        "ma_regime"
    }

    fn warmup_bars(&self) -> usize {
        self.ma.lookback()
    }

    fn evaluate(&self, bars: &[Bar]) -> FilterState {
        let (Some(bar), Some(ma)) = (bars.last(), self.ma.value(bars)) else {
            return FilterState::NotReady;
        };
        if bar.close > ma {
            FilterState::only(Side::Long)
        } else if bar.close < ma {
            FilterState::only(Side::Short)
        } else {
            FilterState::NEITHER
        }
    }
}

/// Momentum band: longs while RSI is above `long_above`, shorts below `short_below`.
#[derive(Debug, Clone)]
pub struct RsiBandFilter {
    pub period: usize,
    pub long_above: f64,
    pub short_below: f64,
}

impl RsiBandFilter {
    pub fn new(period: usize, long_above: f64, short_below: f64) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            long_above,
            short_below,
        }
    }
}

impl FilterProvider for RsiBandFilter {
    fn name(&self) -> &str {
        "rsi_band"
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn evaluate(&self, bars: &[Bar]) -> FilterState {
        match rsi(bars, self.period) {
            Some(v) => FilterState::Allow {
                long: v > self.long_above,
                short: v < self.short_below,
            },
            None => FilterState::NotReady,
        }
    }
}
