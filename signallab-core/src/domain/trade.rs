//! Trade: the single open position and its settled record.

use super::side::Side;
use serde::{Deserialize, Serialize};

/// One filled entry (the first entry or a pyramided one).
///
/// All fields are fixed at fill time and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub bar_index: usize,
    /// Open of the fill bar, before slippage.
    pub order_price: f64,
    pub fill: f64,
    /// Risk reference: the entry stop for first entries, the in-trade stop for pyramids.
    pub stop: f64,
    /// X = |fill - stop|.
    pub risk_unit: f64,
    /// X as a fraction of the fill price.
    pub stop_pct: f64,
    /// Currency lost if the stop is hit: `position_size * stop_pct`.
    pub stop_equity: f64,
    /// Position notional in equity units.
    pub position_size: f64,
    pub fees_in: f64,
    /// Slippage paid on entry, in equity units.
    pub slippage_in: f64,
}

impl Entry {
    /// Quantity held: notional over fill price.
    pub fn units(&self) -> f64 {
        self.position_size / self.fill
    }

    /// Gross unrealized P&L in equity units at `price`.
    pub fn pnl_at(&self, side: Side, price: f64) -> f64 {
        self.units() * side.gain(self.fill, price)
    }
}

/// Read-only view of an open trade handed to in-trade stop and exit providers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeContext {
    pub side: Side,
    pub entry_price: f64,
    pub entry_stop: f64,
    pub risk_unit: f64,
    pub favorable_extreme: f64,
    pub adverse_extreme: f64,
    pub bars_in_trade: usize,
    pub published_stop: f64,
}

/// The open trade. At most one exists at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    /// Index of the entry provider that opened the trade.
    pub origin: usize,
    pub first: Entry,
    pub pyramids: Vec<Entry>,
    /// Published stop; equals the entry stop until kick-in.
    pub in_trade_stop: f64,
    pub kicked_in: bool,
    /// Most favorable price reached since entry (highest high for longs).
    pub favorable_extreme: f64,
    /// Most adverse price reached since entry (lowest low for longs).
    pub adverse_extreme: f64,
    /// Bars elapsed since the first fill, counting the fill bar.
    pub trade_length: usize,
    /// Fill of the most recent entry; pyramid thresholds are measured from it.
    pub last_entry_price: f64,
}

impl Trade {
    pub fn open(side: Side, origin: usize, first: Entry) -> Self {
        Self {
            side,
            origin,
            in_trade_stop: first.stop,
            kicked_in: false,
            favorable_extreme: first.fill,
            adverse_extreme: first.fill,
            trade_length: 0,
            last_entry_price: first.fill,
            first,
            pyramids: Vec::new(),
        }
    }

    pub fn add_pyramid(&mut self, entry: Entry) {
        self.last_entry_price = entry.fill;
        self.pyramids.push(entry);
    }

    /// Extend the favorable/adverse extremes with a bar's range.
    pub fn mark(&mut self, high: f64, low: f64) {
        let fav = self.side.favorable_extreme(high, low);
        let adv = self.side.adverse_extreme(high, low);
        if self.side.gain(self.favorable_extreme, fav) > 0.0 {
            self.favorable_extreme = fav;
        }
        if self.side.gain(self.adverse_extreme, adv) < 0.0 {
            self.adverse_extreme = adv;
        }
    }

    /// Gross unrealized P&L of all entries at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.first.pnl_at(self.side, price)
            + self
                .pyramids
                .iter()
                .map(|e| e.pnl_at(self.side, price))
                .sum::<f64>()
    }

    /// Quantity-weighted average fill of the pyramided entries.
    pub fn pyramid_avg_fill(&self) -> Option<f64> {
        let units: f64 = self.pyramids.iter().map(Entry::units).sum();
        if units <= 0.0 {
            return None;
        }
        let notional: f64 = self.pyramids.iter().map(|e| e.position_size).sum();
        Some(notional / units)
    }

    pub fn context(&self) -> TradeContext {
        TradeContext {
            side: self.side,
            entry_price: self.first.fill,
            entry_stop: self.first.stop,
            risk_unit: self.first.risk_unit,
            favorable_extreme: self.favorable_extreme,
            adverse_extreme: self.adverse_extreme,
            bars_in_trade: self.trade_length,
            published_stop: self.in_trade_stop,
        }
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Stop,
    Signal,
}

/// A settled round trip, first entry plus any pyramids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: Side,
    pub entry_bar: usize,
    pub entry_fill: f64,
    pub entry_stop: f64,
    pub risk_unit: f64,
    pub exit_bar: usize,
    pub exit_fill: f64,
    pub exit_reason: ExitReason,
    pub position_size: f64,
    /// First entry P&L in X before fees.
    pub plx_gross: f64,
    /// First entry P&L in X after fees.
    pub plx_net: f64,
    /// First entry net P&L in equity units.
    pub pnl: f64,
    pub pyramid_count: usize,
    pub pyramid_avg_fill: Option<f64>,
    /// Pyramided entries net P&L in equity units (0 without pyramids).
    pub pyramid_pnl: f64,
    pub fees: f64,
    pub slippage: f64,
    pub trade_length: usize,
    /// Max favorable excursion in X.
    pub mfe_x: f64,
    /// Max adverse excursion in X (non-positive).
    pub mae_x: f64,
}

impl TradeRecord {
    pub fn total_pnl(&self) -> f64 {
        self.pnl + self.pyramid_pnl
    }

    pub fn is_winner(&self) -> bool {
        self.total_pnl() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fill: f64, stop: f64, size: f64) -> Entry {
        let risk_unit = (fill - stop).abs();
        Entry {
            bar_index: 1,
            order_price: fill,
            fill,
            stop,
            risk_unit,
            stop_pct: risk_unit / fill,
            stop_equity: size * risk_unit / fill,
            position_size: size,
            fees_in: 0.0,
            slippage_in: 0.0,
        }
    }

    #[test]
    fn mark_tracks_extremes_by_side() {
        let mut long = Trade::open(Side::Long, 0, entry(100.0, 98.0, 1.0));
        long.mark(103.0, 99.0);
        long.mark(102.0, 97.5);
        assert_eq!(long.favorable_extreme, 103.0);
        assert_eq!(long.adverse_extreme, 97.5);

        let mut short = Trade::open(Side::Short, 0, entry(100.0, 102.0, 1.0));
        short.mark(101.0, 96.0);
        assert_eq!(short.favorable_extreme, 96.0);
        assert_eq!(short.adverse_extreme, 101.0);
    }

    #[test]
    fn unrealized_pnl_sums_entries() {
        let mut trade = Trade::open(Side::Long, 0, entry(100.0, 98.0, 1.0));
        trade.add_pyramid(entry(110.0, 105.0, 0.5));
        // 0.01 units * 10 + 0.5/110 units * 0 at 110
        assert!((trade.unrealized_pnl(110.0) - 0.1).abs() < 1e-12);
        assert_eq!(trade.last_entry_price, 110.0);
    }

    #[test]
    fn pyramid_avg_fill_is_quantity_weighted() {
        let mut trade = Trade::open(Side::Long, 0, entry(100.0, 98.0, 1.0));
        assert_eq!(trade.pyramid_avg_fill(), None);
        trade.add_pyramid(entry(100.0, 95.0, 1.0));
        trade.add_pyramid(entry(200.0, 190.0, 1.0));
        // units: 0.01 + 0.005; notional 2.0 → 2.0 / 0.015
        let avg = trade.pyramid_avg_fill().unwrap();
        assert!((avg - 2.0 / 0.015).abs() < 1e-9);
    }
}
