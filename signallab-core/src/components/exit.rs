//! Exit signals: strategy-driven exits alongside the stop.
//!
//! An exit provider sees bar history plus a read-only [`TradeContext`]. It
//! may fire for either side; the engine only acts on a signal matching the
//! open trade's side.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side, TradeContext};
use crate::indicators::{rsi, sma};

use super::external::{decode, ChannelCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitSignal {
    NotReady,
    Hold,
    ExitLong,
    ExitShort,
}

impl ExitSignal {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Long => Self::ExitLong,
            Side::Short => Self::ExitShort,
        }
    }

    /// Whether this signal closes a trade on `side`.
    pub fn exits(self, side: Side) -> bool {
        matches!(
            (self, side),
            (Self::ExitLong, Side::Long) | (Self::ExitShort, Side::Short)
        )
    }
}

pub trait ExitProvider: Send + Sync {
    fn name(&self) -> &str;

    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar], trade: &TradeContext) -> ExitSignal;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExitStrategy {
    /// Exit on the stop only.
    #[default]
    None,
    /// Close has moved `x_multiple × X` in the trade's favor.
    TakeProfit { x_multiple: f64 },
    /// Fast SMA on the wrong side of the slow SMA.
    MaCrossover { fast: usize, slow: usize },
    /// RSI reached the extreme in the trade's favor.
    RsiExtreme {
        period: usize,
        overbought: f64,
        oversold: f64,
    },
    /// Trade has been open for `bars` bars.
    MaxBars { bars: usize },
    /// ±3 codes on the external channel.
    External,
}

impl ExitStrategy {
    /// Config tag of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TakeProfit { .. } => "take_profit",
            Self::MaCrossover { .. } => "ma_crossover",
            Self::RsiExtreme { .. } => "rsi_extreme",
            Self::MaxBars { .. } => "max_bars",
            Self::External => "external",
        }
    }
}

impl ExitProvider for ExitStrategy {
    fn name(&self) -> &str {
        self.kind()
    }

    fn warmup_bars(&self) -> usize {
        match self {
            Self::MaCrossover { slow, .. } => *slow,
            Self::RsiExtreme { period, .. } => period + 1,
            _ => 0,
        }
    }

    fn evaluate(&self, bars: &[Bar], trade: &TradeContext) -> ExitSignal {
        let Some(bar) = bars.last() else {
            return ExitSignal::NotReady;
        };
        let side = trade.side;
        let fire = match *self {
            Self::None => false,
            Self::TakeProfit { x_multiple } => {
                side.gain(trade.entry_price, bar.close) >= x_multiple * trade.risk_unit
            }
            Self::MaCrossover { fast, slow } => {
                let (Some(f), Some(s)) = (sma(bars, fast), sma(bars, slow)) else {
                    return ExitSignal::NotReady;
                };
                side.gain(s, f) < 0.0
            }
            Self::RsiExtreme {
                period,
                overbought,
                oversold,
            } => {
                let Some(v) = rsi(bars, period) else {
                    return ExitSignal::NotReady;
                };
                match side {
                    Side::Long => v >= overbought,
                    Side::Short => v <= oversold,
                }
            }
            Self::MaxBars { bars } => trade.bars_in_trade >= bars,
            Self::External => {
                return match bar.channel.and_then(decode) {
                    Some(ChannelCode::Exit(s)) => ExitSignal::for_side(s),
                    _ => ExitSignal::Hold,
                };
            }
        };
        if fire {
            ExitSignal::for_side(side)
        } else {
            ExitSignal::Hold
        }
    }
}
