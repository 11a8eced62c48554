//! Entry stops: protective levels computed before any trade exists.
//!
//! Entry stops are blind to trade context so they can be evaluated on every
//! bar, for both sides, ahead of the entry decision. The level computed on
//! the trigger bar becomes the stop of the entry filled on the next bar.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side};
use crate::indicators::atr;

/// Candidate entry stops for both sides on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevels {
    pub long: f64,
    pub short: f64,
}

impl StopLevels {
    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.long,
            Side::Short => self.short,
        }
    }
}

/// Trait for entry-stop providers. `None` means not ready.
pub trait EntryStopProvider: Send + Sync {
    fn name(&self) -> &str;

    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar]) -> Option<StopLevels>;
}

/// Built-in entry stops, all anchored on the decision bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum EntryStopStrategy {
    /// `close ∓ multiple × ATR(period)`.
    Atr { period: usize, multiple: f64 },
    /// `close × (1 ∓ pct)`, pct as a fraction.
    Percent { pct: f64 },
    /// Lowest low / highest high of the last `lookback` bars.
    Swing { lookback: usize },
    /// `close ∓ offset`.
    FixedDistance { offset: f64 },
}

impl Default for EntryStopStrategy {
    fn default() -> Self {
        EntryStopStrategy::Atr {
            period: 14,
            multiple: 2.0,
        }
    }
}

impl EntryStopStrategy {
    /// Config tag of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Atr { .. } => "atr",
            Self::Percent { .. } => "percent",
            Self::Swing { .. } => "swing",
            Self::FixedDistance { .. } => "fixed_distance",
        }
    }
}

impl EntryStopProvider for EntryStopStrategy {
    fn name(&self) -> &str {
        self.kind()
    }

    fn warmup_bars(&self) -> usize {
        match self {
            Self::Atr { period, .. } => period + 1,
            Self::Swing { lookback } => *lookback,
            Self::Percent { .. } | Self::FixedDistance { .. } => 1,
        }
    }

    fn evaluate(&self, bars: &[Bar]) -> Option<StopLevels> {
        let close = bars.last()?.close;
        let levels = match *self {
            Self::Atr { period, multiple } => {
                let distance = multiple * atr(bars, period)?;
                StopLevels {
                    long: close - distance,
                    short: close + distance,
                }
            }
            Self::Percent { pct } => StopLevels {
                long: close * (1.0 - pct),
                short: close * (1.0 + pct),
            },
            Self::Swing { lookback } => {
                if lookback == 0 || bars.len() < lookback {
                    return None;
                }
                let window = &bars[bars.len() - lookback..];
                StopLevels {
                    long: window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
                    short: window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
                }
            }
            Self::FixedDistance { offset } => StopLevels {
                long: close - offset,
                short: close + offset,
            },
        };
        (levels.long.is_finite() && levels.short.is_finite()).then_some(levels)
    }
}
