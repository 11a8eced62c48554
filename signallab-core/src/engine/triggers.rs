//! Trigger detection.
//!
//! Triggers are decided from bars up to and including the current one and
//! take effect at the next bar's open. An exit trigger suppresses every entry
//! trigger on the same bar.

use serde::{Deserialize, Serialize};

use crate::components::{ExitSignal, FilterState, Signal};
use crate::config::{Direction, EngineConfig};
use crate::domain::{Bar, ExitReason, Side, Trade};

/// One bar's trigger output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Triggers {
    pub long: bool,
    pub short: bool,
    pub exit: Option<ExitReason>,
}

impl Triggers {
    pub fn none() -> Self {
        Self::default()
    }

    /// Side to enter on; long wins when both sides trigger.
    pub fn entry_side(&self) -> Option<Side> {
        if self.long {
            Some(Side::Long)
        } else if self.short {
            Some(Side::Short)
        } else {
            None
        }
    }

    fn set(&mut self, side: Side) {
        match side {
            Side::Long => self.long = true,
            Side::Short => self.short = true,
        }
    }
}

/// Exit trigger for an open trade.
///
/// A close through the published stop wins over a provider exit on the same bar.
pub fn exit_trigger(trade: &Trade, bar: &Bar, signal: ExitSignal) -> Option<ExitReason> {
    if trade.side.is_breached(trade.in_trade_stop, bar.close) {
        Some(ExitReason::Stop)
    } else if signal.exits(trade.side) {
        Some(ExitReason::Signal)
    } else {
        None
    }
}

/// Gates every entry, first or pyramid, must pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryGates {
    pub warmup_bars: usize,
    pub ruined: bool,
}

impl EntryGates {
    /// Bar-level gates: warm-up, ruin and the date range.
    pub fn open_on(&self, config: &EngineConfig, bar: &Bar) -> bool {
        bar.index > self.warmup_bars
            && !self.ruined
            && config.date_range.map_or(true, |r| r.contains(bar.timestamp))
    }
}

/// First-entry triggers from a flat account.
///
/// Returns the triggers and, for each side, the index of the first entry
/// provider that fired for it.
pub fn first_entry(
    signals: &[Signal],
    filter: FilterState,
    direction: Direction,
) -> (Triggers, [Option<usize>; 2]) {
    let mut triggers = Triggers::none();
    let mut origins = [None, None];
    for (slot, side) in [Side::Long, Side::Short].into_iter().enumerate() {
        if !direction.permits(side) || !filter.allows(side) {
            continue;
        }
        if let Some(origin) = signals.iter().position(|s| s.fires(side)) {
            triggers.set(side);
            origins[slot] = Some(origin);
        }
    }
    (triggers, origins)
}

/// Pyramid trigger for an open trade, when admission passed.
pub fn pyramid_entry(trade: &Trade, direction: Direction, admitted: bool) -> Triggers {
    let mut triggers = Triggers::none();
    if admitted && direction.permits(trade.side) {
        triggers.set(trade.side);
    }
    triggers
}
