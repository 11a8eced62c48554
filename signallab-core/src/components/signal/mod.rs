//! Entry signals: detect market events and emit directional intent.
//!
//! Entry providers are pure functions of bar history: they receive the slice
//! ending at the decision bar and never see trade or account state. A provider
//! that lacks enough history reports [`Signal::NotReady`], which trigger
//! detection treats as "no signal".

pub mod donchian_breakout;
pub mod ma_crossover;
pub mod random;
pub mod rsi_cross;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side};

/// Per-bar output of an entry provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    NotReady,
    Neutral,
    Long,
    Short,
}

impl Signal {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Long => Self::Long,
            Side::Short => Self::Short,
        }
    }

    /// Direction of the signal, if it fired.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::Long => Some(Side::Long),
            Self::Short => Some(Side::Short),
            Self::NotReady | Self::Neutral => None,
        }
    }

    pub fn fires(self, side: Side) -> bool {
        self.side() == Some(side)
    }
}

/// Trait for entry signal providers.
///
/// # Architecture invariant
/// `evaluate` receives bar history only. The last element of `bars` is the
/// decision bar; implementations must not assume anything beyond it exists.
pub trait EntryProvider: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Number of bars needed before this provider can produce output.
    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar]) -> Signal;

    /// Explicit entry stop carried by the signal itself, if any.
    fn stop_hint(&self, _bars: &[Bar]) -> Option<f64> {
        None
    }
}

/// Built-in entry strategies, selected by `type` in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum EntryStrategy {
    MaCrossover {
        fast: usize,
        slow: usize,
    },
    RsiCross {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    DonchianBreakout {
        period: usize,
    },
    Random {
        seed: u64,
        probability: f64,
    },
    /// Decode the bar's external channel.
    External,
}

impl EntryStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MaCrossover { .. } => "ma_crossover",
            Self::RsiCross { .. } => "rsi_cross",
            Self::DonchianBreakout { .. } => "donchian_breakout",
            Self::Random { .. } => "random",
            Self::External => "external",
        }
    }
}

pub use donchian_breakout::DonchianBreakout;
pub use ma_crossover::MaCrossover;
pub use random::RandomEntry;
pub use rsi_cross::RsiCross;
