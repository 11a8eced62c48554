//! External single-channel signal protocol.
//!
//! A producer outside the engine writes one number per bar into
//! [`Bar::channel`]. The value is decoded as:
//!
//! | value            | meaning                                   |
//! |------------------|-------------------------------------------|
//! | `+1.0` / `-1.0`  | filter bull / bear                        |
//! | `+2.0` / `-2.0`  | entry long / short                        |
//! | `+3.0` / `-3.0`  | exit from long / exit from short          |
//! | other finite ≠ 0 | entry with stop: `abs(v)` = stop, sign = side |
//! | `0`, NaN, ±inf   | nothing                                   |
//!
//! Producers that need a stop level of exactly 1, 2 or 3 nudge it by one
//! tick ([`encode_stop`]) so it cannot be mistaken for a code. Exit codes are
//! read by [`ExitStrategy::External`](super::exit::ExitStrategy::External).

use crate::domain::{Bar, Side};

use super::filter::{FilterProvider, FilterState};
use super::signal::{EntryProvider, Signal};

/// A decoded channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelCode {
    Filter(Side),
    Entry(Side),
    /// Exit from a trade on this side.
    Exit(Side),
    EntryWithStop { side: Side, stop: f64 },
}

impl ChannelCode {
    pub fn entry_side(self) -> Option<Side> {
        match self {
            ChannelCode::Entry(side) | ChannelCode::EntryWithStop { side, .. } => Some(side),
            _ => None,
        }
    }
}

pub fn decode(value: f64) -> Option<ChannelCode> {
    if !value.is_finite() || value == 0.0 {
        return None;
    }
    let side = if value > 0.0 { Side::Long } else { Side::Short };
    let code = match value.abs() {
        m if m == 1.0 => ChannelCode::Filter(side),
        m if m == 2.0 => ChannelCode::Entry(side),
        m if m == 3.0 => ChannelCode::Exit(side),
        stop => ChannelCode::EntryWithStop { side, stop },
    };
    Some(code)
}

/// Encode an entry-with-stop for `side`, nudging reserved magnitudes by one tick.
///
/// The nudge widens the stop: down for longs, up for shorts.
pub fn encode_stop(side: Side, stop: f64, tick: f64) -> f64 {
    let reserved = stop == 1.0 || stop == 2.0 || stop == 3.0;
    let level = if reserved {
        stop - side.sign() * tick
    } else {
        stop
    };
    level * side.sign()
}

fn decode_bar(bar: &Bar) -> Option<ChannelCode> {
    bar.channel.and_then(decode)
}

/// Entry provider reading ±2 codes and stop-carrying values.
pub struct ExternalEntry;

impl EntryProvider for ExternalEntry {
    fn name(&self) -> &str {
        "external"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, bars: &[Bar]) -> Signal {
        let Some(bar) = bars.last() else {
            return Signal::NotReady;
        };
        match decode_bar(bar).and_then(ChannelCode::entry_side) {
            Some(side) => Signal::for_side(side),
            None => Signal::Neutral,
        }
    }

    fn stop_hint(&self, bars: &[Bar]) -> Option<f64> {
        match bars.last().and_then(decode_bar) {
            Some(ChannelCode::EntryWithStop { stop, .. }) => Some(stop),
            _ => None,
        }
    }
}

/// Filter holding the most recent ±1 code seen in history.
///
/// Without a look-back the search walks back to the start of history, so a
/// feed that sends filter codes rarely pays for the gap on every bar.
#[derive(Debug, Clone, Default)]
pub struct ExternalFilter {
    lookback: Option<usize>,
}

impl ExternalFilter {
    pub fn new(lookback: Option<usize>) -> Self {
        Self { lookback }
    }
}

impl FilterProvider for ExternalFilter {
    fn name(&self) -> &str {
        "external"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, bars: &[Bar]) -> FilterState {
        let window = match self.lookback {
            Some(n) => &bars[bars.len().saturating_sub(n)..],
            None => bars,
        };
        window
            .iter()
            .rev()
            .find_map(|bar| match decode_bar(bar) {
                Some(ChannelCode::Filter(side)) => Some(FilterState::only(side)),
                _ => None,
            })
            .unwrap_or(FilterState::NotReady)
    }
}
