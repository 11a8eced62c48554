//! In-trade event detection.
//!
//! Evaluated on the decision bar after the stop engine has run, for alerting
//! only: events never change trade state.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, EngineEvent, EventKind, Side, Trade};
use crate::indicators::{atr, rsi};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventConfig {
    pub enabled: bool,
    pub atr_period: usize,
    /// Close within this many ATRs of the published stop.
    pub near_stop_atr: f64,
    /// Favorable bar whose range exceeds this many ATRs.
    pub swing_atr: f64,
    /// Published stop moved more than this many X in one bar.
    pub stop_jump_x: f64,
    pub rsi_period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            atr_period: 14,
            near_stop_atr: 0.5,
            swing_atr: 2.0,
            stop_jump_x: 1.0,
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// Detect in-trade events on the last bar of `bars`.
///
/// `stop_move` is how far the published stop moved on this bar.
pub fn detect(config: &EventConfig, bars: &[Bar], trade: &Trade, stop_move: f64) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    let Some(bar) = bars.last() else {
        return events;
    };
    if !config.enabled {
        return events;
    }
    let side = trade.side;
    let at = |kind| EngineEvent::new(bar.index, kind);

    if let Some(atr) = atr(bars, config.atr_period) {
        let cushion = side.gain(trade.in_trade_stop, bar.close);
        if cushion >= 0.0 && cushion <= config.near_stop_atr * atr {
            events.push(at(EventKind::NearStop));
        }
        if bar.range() > config.swing_atr * atr && side.gain(bar.open, bar.close) > 0.0 {
            events.push(at(EventKind::LargeFavorableSwing));
        }
    }

    if stop_move > config.stop_jump_x * trade.first.risk_unit {
        events.push(at(EventKind::StopJump));
    }

    let n = bars.len();
    if n >= 2 {
        if let (Some(cur), Some(prev)) = (
            rsi(bars, config.rsi_period),
            rsi(&bars[..n - 1], config.rsi_period),
        ) {
            let pivot = match side {
                Side::Long => prev >= config.overbought && cur < prev,
                Side::Short => prev <= config.oversold && cur > prev,
            };
            if pivot {
                events.push(at(EventKind::PossibleReversal));
            }
        }
    }

    events
}
