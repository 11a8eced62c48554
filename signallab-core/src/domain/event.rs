//! Events emitted for presentation and alerting.

use serde::{Deserialize, Serialize};

use super::side::Side;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LongEntry,
    LongPyramidEntry,
    ShortEntry,
    ShortPyramidEntry,
    LongExit,
    ShortExit,
    /// Close came within the configured ATR multiple of the published stop.
    NearStop,
    /// Momentum pivot in overbought (longs) or oversold (shorts) territory.
    PossibleReversal,
    /// The published stop moved by more than the configured X multiple in one bar.
    StopJump,
    /// Bar range exceeded the configured ATR multiple in the trade's favor.
    LargeFavorableSwing,
}

impl EventKind {
    pub fn entry(side: Side, pyramid: bool) -> Self {
        match (side, pyramid) {
            (Side::Long, false) => EventKind::LongEntry,
            (Side::Long, true) => EventKind::LongPyramidEntry,
            (Side::Short, false) => EventKind::ShortEntry,
            (Side::Short, true) => EventKind::ShortPyramidEntry,
        }
    }

    pub fn exit(side: Side) -> Self {
        match side {
            Side::Long => EventKind::LongExit,
            Side::Short => EventKind::ShortExit,
        }
    }

    /// In-trade events are attributed to the detection bar, the rest to the settlement bar.
    pub fn is_in_trade(self) -> bool {
        matches!(
            self,
            EventKind::NearStop
                | EventKind::PossibleReversal
                | EventKind::StopJump
                | EventKind::LargeFavorableSwing
        )
    }
}

/// An event tagged with the bar it is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub bar_index: usize,
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn new(bar_index: usize, kind: EventKind) -> Self {
        Self { bar_index, kind }
    }
}
