//! In-trade stops: trade-aware stop candidates.
//!
//! Providers emit a raw candidate every bar. Publication rules (kick-in,
//! no regression, side validity) are enforced by the engine, not here.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side, TradeContext};
use crate::indicators::{atr, donchian, DonchianBand};

/// Trait for in-trade stop providers. `None` means no candidate this bar.
pub trait InTradeStopProvider: Send + Sync {
    fn name(&self) -> &str;

    fn warmup_bars(&self) -> usize;

    fn candidate(&self, bars: &[Bar], trade: &TradeContext) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum InTradeStopStrategy {
    /// Trail the favorable extreme by `multiple × X`.
    TrailingX { multiple: f64 },
    /// Trail the favorable extreme by a fraction of price.
    TrailingPct { pct: f64 },
    /// Trail the favorable extreme by a fixed price distance.
    TrailingFixed { offset: f64 },
    DonchianCenter { period: usize },
    /// `close ∓ multiple × ATR`.
    AtrMultiple { period: usize, multiple: f64 },
    /// Highest high (lowest low) of the window `∓ multiple × ATR`.
    Chandelier { period: usize, multiple: f64 },
    /// Highest (lowest) close of the window `∓ multiple × ATR`.
    VolatilityStop { period: usize, multiple: f64 },
    /// Low (high) of the decision bar.
    LastBarExtreme,
}

impl Default for InTradeStopStrategy {
    fn default() -> Self {
        InTradeStopStrategy::TrailingX { multiple: 2.0 }
    }
}

fn tail(bars: &[Bar], period: usize) -> Option<&[Bar]> {
    (period > 0 && bars.len() >= period).then(|| &bars[bars.len() - period..])
}

impl InTradeStopStrategy {
    /// Config tag of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TrailingX { .. } => "trailing_x",
            Self::TrailingPct { .. } => "trailing_pct",
            Self::TrailingFixed { .. } => "trailing_fixed",
            Self::DonchianCenter { .. } => "donchian_center",
            Self::AtrMultiple { .. } => "atr_multiple",
            Self::Chandelier { .. } => "chandelier",
            Self::VolatilityStop { .. } => "volatility_stop",
            Self::LastBarExtreme => "last_bar_extreme",
        }
    }
}

impl InTradeStopProvider for InTradeStopStrategy {
    fn name(&self) -> &str {
        self.kind()
    }

    fn warmup_bars(&self) -> usize {
        match self {
            Self::DonchianCenter { period } => *period,
            Self::AtrMultiple { period, .. }
            | Self::Chandelier { period, .. }
            | Self::VolatilityStop { period, .. } => period + 1,
            Self::TrailingX { .. }
            | Self::TrailingPct { .. }
            | Self::TrailingFixed { .. }
            | Self::LastBarExtreme => 0,
        }
    }

    fn candidate(&self, bars: &[Bar], trade: &TradeContext) -> Option<f64> {
        let side = trade.side;
        let sign = side.sign();
        let bar = bars.last()?;
        let stop = match *self {
            Self::TrailingX { multiple } => {
                trade.favorable_extreme - sign * multiple * trade.risk_unit
            }
            Self::TrailingPct { pct } => trade.favorable_extreme * (1.0 - sign * pct),
            Self::TrailingFixed { offset } => trade.favorable_extreme - sign * offset,
            Self::DonchianCenter { period } => donchian(bars, period, DonchianBand::Center)?,
            Self::AtrMultiple { period, multiple } => {
                bar.close - sign * multiple * atr(bars, period)?
            }
            Self::Chandelier { period, multiple } => {
                let band = match side {
                    Side::Long => DonchianBand::Upper,
                    Side::Short => DonchianBand::Lower,
                };
                donchian(bars, period, band)? - sign * multiple * atr(bars, period)?
            }
            Self::VolatilityStop { period, multiple } => {
                let window = tail(bars, period)?;
                let closes = window.iter().map(|b| b.close);
                let anchor = match side {
                    Side::Long => closes.fold(f64::NEG_INFINITY, f64::max),
                    Side::Short => closes.fold(f64::INFINITY, f64::min),
                };
                anchor - sign * multiple * atr(bars, period)?
            }
            Self::LastBarExtreme => side.adverse_extreme(bar.high, bar.low),
        };
        stop.is_finite().then_some(stop)
    }
}
