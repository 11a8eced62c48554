//! In-trade stop engine: kick-in gate and publication rules.
//!
//! Before kick-in the published stop is the entry stop. A candidate from the
//! in-trade stop provider is adopted only when
//! 1. it sits on the protective side of the decision bar's close, and
//! 2. the trade has kicked in (the candidate crossing the configured
//!    threshold kicks it in), and
//! 3. it is strictly tighter than the published stop (the ratchet).
//!
//! Kick-in is sticky for the life of the trade and shared by its pyramids.

use serde::{Deserialize, Serialize};

use crate::domain::{Side, Trade, TradeContext};

/// Threshold a candidate stop must cross before it replaces the entry stop.
///
/// Offsets are measured from the first entry's fill in the trade's favor,
/// e.g. `x_multiple { multiple = 0.5 }` on a long at 100 with X = 2 kicks in
/// once a candidate rises above 101.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum KickIn {
    /// Candidate is tighter than the entry stop.
    #[default]
    PassesEntryStop,
    XMultiple { multiple: f64 },
    Percent { pct: f64 },
    Fixed { offset: f64 },
}

impl KickIn {
    pub fn threshold(&self, trade: &TradeContext) -> f64 {
        let entry = trade.entry_price;
        let sign = trade.side.sign();
        match *self {
            KickIn::PassesEntryStop => trade.entry_stop,
            KickIn::XMultiple { multiple } => entry + sign * multiple * trade.risk_unit,
            KickIn::Percent { pct } => entry * (1.0 + sign * pct),
            KickIn::Fixed { offset } => entry + sign * offset,
        }
    }

    pub fn passed(&self, candidate: f64, trade: &TradeContext) -> bool {
        trade.side.is_tighter(candidate, self.threshold(trade))
    }
}

/// Outcome of one bar of the stop engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopUpdate {
    Held,
    Moved { from: f64, to: f64 },
}

impl StopUpdate {
    /// Distance the stop moved, zero when held.
    pub fn distance(self) -> f64 {
        match self {
            StopUpdate::Held => 0.0,
            StopUpdate::Moved { from, to } => (to - from).abs(),
        }
    }
}

/// Clamp a candidate so the stop never loosens.
pub fn enforce_ratchet(side: Side, current: f64, candidate: f64) -> f64 {
    match side {
        Side::Long => candidate.max(current),
        Side::Short => candidate.min(current),
    }
}

/// Apply one bar's candidate to the trade's published stop.
pub fn update_stop(trade: &mut Trade, candidate: Option<f64>, close: f64, kick_in: &KickIn) -> StopUpdate {
    let Some(candidate) = candidate else {
        return StopUpdate::Held;
    };
    let side = trade.side;
    if !candidate.is_finite() || !side.is_valid_stop(candidate, close) {
        return StopUpdate::Held;
    }
    if !trade.kicked_in {
        if !kick_in.passed(candidate, &trade.context()) {
            return StopUpdate::Held;
        }
        trade.kicked_in = true;
    }
    let current = trade.in_trade_stop;
    let next = enforce_ratchet(side, current, candidate);
    if side.is_tighter(next, current) {
        trade.in_trade_stop = next;
        StopUpdate::Moved {
            from: current,
            to: next,
        }
    } else {
        StopUpdate::Held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;

    fn trade(side: Side) -> Trade {
        let stop = if side == Side::Long { 98.0 } else { 102.0 };
        Trade::open(
            side,
            0,
            Entry {
                bar_index: 1,
                order_price: 100.0,
                fill: 100.0,
                stop,
                risk_unit: 2.0,
                stop_pct: 0.02,
                stop_equity: 0.02,
                position_size: 1.0,
                fees_in: 0.0,
                slippage_in: 0.0,
            },
        )
    }

    #[test]
    fn enforce_ratchet_clamps_loosening() {
        assert_eq!(enforce_ratchet(Side::Long, 95.0, 97.0), 97.0);
        assert_eq!(enforce_ratchet(Side::Long, 95.0, 90.0), 95.0);
        assert_eq!(enforce_ratchet(Side::Short, 105.0, 103.0), 103.0);
        assert_eq!(enforce_ratchet(Side::Short, 105.0, 110.0), 105.0);
    }

    #[test]
    fn candidate_through_close_is_rejected() {
        let mut t = trade(Side::Long);
        let u = update_stop(&mut t, Some(101.0), 100.5, &KickIn::PassesEntryStop);
        assert_eq!(u, StopUpdate::Held);
        assert!(!t.kicked_in);
        assert_eq!(t.in_trade_stop, 98.0);
    }

    #[test]
    fn kick_in_then_tighten_only() {
        let mut t = trade(Side::Long);
        // below the entry stop: no kick-in
        assert_eq!(update_stop(&mut t, Some(97.0), 103.0, &KickIn::PassesEntryStop), StopUpdate::Held);
        assert!(!t.kicked_in);

        let u = update_stop(&mut t, Some(99.0), 103.0, &KickIn::PassesEntryStop);
        assert_eq!(u, StopUpdate::Moved { from: 98.0, to: 99.0 });
        assert!(t.kicked_in);

        // a looser candidate after kick-in holds the published stop
        assert_eq!(update_stop(&mut t, Some(98.5), 103.0, &KickIn::PassesEntryStop), StopUpdate::Held);
        assert_eq!(t.in_trade_stop, 99.0);
    }

    #[test]
    fn x_multiple_kick_in_threshold() {
        let mut t = trade(Side::Short);
        let k = KickIn::XMultiple { multiple: 1.0 };
        // threshold = 100 - 2 = 98 for a short
        assert_eq!(k.threshold(&t.context()), 98.0);
        assert_eq!(update_stop(&mut t, Some(99.0), 95.0, &k), StopUpdate::Held);
        assert_eq!(
            update_stop(&mut t, Some(97.5), 95.0, &k),
            StopUpdate::Moved { from: 102.0, to: 97.5 }
        );
    }

    #[test]
    fn kick_in_is_sticky() {
        let mut t = trade(Side::Long);
        let k = KickIn::Fixed { offset: 1.0 };
        update_stop(&mut t, Some(101.5), 104.0, &k);
        assert!(t.kicked_in);
        // rejected candidates never reset the flag
        assert_eq!(update_stop(&mut t, Some(100.0), 104.0, &k), StopUpdate::Held);
        assert_eq!(update_stop(&mut t, Some(105.0), 104.0, &k), StopUpdate::Held);
        assert!(t.kicked_in);
        assert_eq!(t.in_trade_stop, 101.5);
    }

    #[test]
    fn percent_threshold() {
        let t = trade(Side::Long);
        let k = KickIn::Percent { pct: 0.01 };
        assert!((k.threshold(&t.context()) - 101.0).abs() < 1e-12);
    }

    #[test]
    fn no_candidate_holds() {
        let mut t = trade(Side::Long);
        assert_eq!(update_stop(&mut t, None, 100.0, &KickIn::default()), StopUpdate::Held);
        assert_eq!(StopUpdate::Held.distance(), 0.0);
    }
}
