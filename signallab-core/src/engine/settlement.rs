//! Entry fills and exit settlement.
//!
//! Both run at the open of the bar after the trigger. An entry either becomes
//! an immutable [`Entry`] or is skipped with a [`SettlementSkip`] reason and
//! touches no state. An exit consumes the trade and produces its record plus
//! the outcomes for the three statistics buckets.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Entry, ExitReason, Side, Trade, TradeRecord};
use crate::sizers::{SizingInputs, SizingPolicy};
use crate::stats::Outcome;

use super::fill::CostModel;

/// An entry triggered on one bar, waiting for the next bar's open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryOrder {
    pub side: Side,
    /// Entry provider that fired (first entries) or the trade's origin (pyramids).
    pub origin: usize,
    /// Risk reference: entry stop for first entries, published stop for pyramids.
    pub stop: f64,
    pub pyramid: bool,
    pub trigger_bar: usize,
}

/// Why a pending entry was dropped at fill time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SettlementSkip {
    #[error("invalid risk unit: stop {stop} is not on the protective side of fill {fill}")]
    InvalidRiskUnit { fill: f64, stop: f64 },
    #[error("sizing produced no position")]
    ZeroSize,
}

/// Account figures the sizer needs at fill time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub equity: f64,
    pub initial_equity: f64,
}

/// Fill a pending entry at `bar.open`.
pub fn fill_entry(
    order: &EntryOrder,
    bar: &Bar,
    cost: &CostModel,
    sizing: &SizingPolicy,
    account: Account,
    position_multiple: f64,
) -> Result<Entry, SettlementSkip> {
    let fill = cost.entry_fill(bar, order.side);
    if !order.side.is_valid_stop(order.stop, fill.price) {
        return Err(SettlementSkip::InvalidRiskUnit {
            fill: fill.price,
            stop: order.stop,
        });
    }
    let risk_unit = (fill.price - order.stop).abs();
    let stop_pct = risk_unit / fill.price;
    let multiple = if order.pyramid { position_multiple } else { 1.0 };
    let position_size = multiple
        * sizing.size(SizingInputs {
            equity: account.equity,
            initial_equity: account.initial_equity,
            stop_pct,
        });
    if !(position_size > 0.0) {
        return Err(SettlementSkip::ZeroSize);
    }
    Ok(Entry {
        bar_index: bar.index,
        order_price: fill.order_price,
        fill: fill.price,
        stop: order.stop,
        risk_unit,
        stop_pct,
        stop_equity: position_size * stop_pct,
        position_size,
        fees_in: cost.fees(position_size),
        slippage_in: position_size / fill.price * fill.slippage,
    })
}

/// Everything produced by settling one trade.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSettlement {
    pub record: TradeRecord,
    pub first: Outcome,
    /// `None` when the trade had no pyramids.
    pub pyramided: Option<Outcome>,
    pub combined: Outcome,
}

impl ExitSettlement {
    /// Net change to equity.
    pub fn net_pnl(&self) -> f64 {
        self.combined.pnl
    }
}

struct Leg {
    gross: f64,
    fees: f64,
    slippage: f64,
    volume: f64,
    stop_equity: f64,
}

impl Leg {
    fn net(&self) -> f64 {
        self.gross - self.fees
    }
}

fn settle_leg<'a>(
    entries: impl Iterator<Item = &'a Entry>,
    side: Side,
    entry_price: f64,
    exit_price: f64,
    exit_slippage: f64,
    cost: &CostModel,
) -> Leg {
    let mut units = 0.0;
    let mut leg = Leg {
        gross: 0.0,
        fees: 0.0,
        slippage: 0.0,
        volume: 0.0,
        stop_equity: 0.0,
    };
    for e in entries {
        units += e.units();
        leg.fees += e.fees_in + cost.fees(e.position_size);
        leg.slippage += e.slippage_in;
        leg.volume += e.position_size;
        leg.stop_equity += e.stop_equity;
    }
    leg.gross = units * side.gain(entry_price, exit_price);
    leg.slippage += units * exit_slippage;
    leg.volume += units * exit_price;
    leg
}

fn per_risk(value: f64, risk: f64) -> f64 {
    if risk > 0.0 {
        value / risk
    } else {
        0.0
    }
}

/// Settle `trade` at `bar.open`.
///
/// `equity` is the account equity before this settlement.
pub fn settle_exit(
    trade: &Trade,
    bar: &Bar,
    cost: &CostModel,
    reason: ExitReason,
    equity: f64,
) -> ExitSettlement {
    let side = trade.side;
    let first = &trade.first;
    let exit = cost.exit_fill(bar, side);
    let x = first.risk_unit;
    let pct_of_equity = |pnl: f64| if equity > 0.0 { pnl / equity } else { 0.0 };

    let first_leg = settle_leg(
        std::iter::once(first),
        side,
        first.fill,
        exit.price,
        exit.slippage,
        cost,
    );
    let plx_gross = side.gain(first.fill, exit.price) / x;
    // fees change the X-denominated return, not only the currency one
    let plx_net = per_risk(first_leg.net(), first.stop_equity);
    let first_outcome = Outcome {
        entries: 1,
        plx: plx_net,
        pnl: first_leg.net(),
        pnl_pct: pct_of_equity(first_leg.net()),
        fees: first_leg.fees,
        slippage: first_leg.slippage,
        volume: first_leg.volume,
        trade_length: trade.trade_length,
    };

    let pyramid_avg_fill = trade.pyramid_avg_fill();
    let pyramided = pyramid_avg_fill.map(|avg| {
        let leg = settle_leg(trade.pyramids.iter(), side, avg, exit.price, exit.slippage, cost);
        Outcome {
            entries: trade.pyramids.len(),
            plx: per_risk(leg.net(), leg.stop_equity),
            pnl: leg.net(),
            pnl_pct: pct_of_equity(leg.net()),
            fees: leg.fees,
            slippage: leg.slippage,
            volume: leg.volume,
            trade_length: trade.trade_length,
        }
    });

    let pyr = pyramided.unwrap_or_default();
    let total = first_outcome.pnl + pyr.pnl;
    let combined = Outcome {
        entries: 1 + trade.pyramids.len(),
        plx: per_risk(total, first.stop_equity),
        pnl: total,
        pnl_pct: pct_of_equity(total),
        fees: first_outcome.fees + pyr.fees,
        slippage: first_outcome.slippage + pyr.slippage,
        volume: first_outcome.volume + pyr.volume,
        trade_length: trade.trade_length,
    };

    let record = TradeRecord {
        side,
        entry_bar: first.bar_index,
        entry_fill: first.fill,
        entry_stop: first.stop,
        risk_unit: x,
        exit_bar: bar.index,
        exit_fill: exit.price,
        exit_reason: reason,
        position_size: first.position_size,
        plx_gross,
        plx_net,
        pnl: first_outcome.pnl,
        pyramid_count: trade.pyramids.len(),
        pyramid_avg_fill,
        pyramid_pnl: pyr.pnl,
        fees: combined.fees,
        slippage: combined.slippage,
        trade_length: trade.trade_length,
        mfe_x: side.gain(first.fill, trade.favorable_extreme) / x,
        mae_x: side.gain(first.fill, trade.adverse_extreme) / x,
    };

    ExitSettlement {
        record,
        first: first_outcome,
        pyramided,
        combined,
    }
}
