//! Running trade statistics.
//!
//! A bucket stores sums and counts only. Every average, rate and ratio is
//! derived on read, so re-deriving it from the stored pair always matches
//! the published value.

use serde::{Deserialize, Serialize};

/// One settled contribution to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outcome {
    /// Entries settled by this outcome (1 for a first entry, N for N pyramids).
    pub entries: usize,
    /// Net P&L in X.
    pub plx: f64,
    /// Net P&L in equity units.
    pub pnl: f64,
    /// Net P&L as a fraction of equity before settlement.
    pub pnl_pct: f64,
    pub fees: f64,
    pub slippage: f64,
    /// Notional traded, entry plus exit.
    pub volume: f64,
    pub trade_length: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatBucket {
    pub entries: usize,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_plx: f64,
    pub total_pnl: f64,
    pub total_pnl_pct: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
    pub total_volume: f64,
    pub total_trade_length: usize,
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl StatBucket {
    pub fn record(&mut self, outcome: &Outcome) {
        self.entries += outcome.entries;
        self.trades += 1;
        if outcome.pnl > 0.0 {
            self.wins += 1;
            self.gross_profit += outcome.pnl;
        } else if outcome.pnl < 0.0 {
            self.losses += 1;
            self.gross_loss += -outcome.pnl;
        }
        self.total_plx += outcome.plx;
        self.total_pnl += outcome.pnl;
        self.total_pnl_pct += outcome.pnl_pct;
        self.total_fees += outcome.fees;
        self.total_slippage += outcome.slippage;
        self.total_volume += outcome.volume;
        self.total_trade_length += outcome.trade_length;
    }

    pub fn avg_plx(&self) -> f64 {
        ratio(self.total_plx, self.trades)
    }

    pub fn avg_pnl(&self) -> f64 {
        ratio(self.total_pnl, self.trades)
    }

    pub fn avg_pnl_pct(&self) -> f64 {
        ratio(self.total_pnl_pct, self.trades)
    }

    pub fn avg_fees(&self) -> f64 {
        ratio(self.total_fees, self.trades)
    }

    pub fn avg_slippage(&self) -> f64 {
        ratio(self.total_slippage, self.trades)
    }

    pub fn avg_trade_length(&self) -> f64 {
        ratio(self.total_trade_length as f64, self.trades)
    }

    /// Fraction of settled trades that made money.
    pub fn win_rate(&self) -> f64 {
        ratio(self.wins as f64, self.trades)
    }

    /// Gross profit over gross loss.
    ///
    /// Capped at 100.0 when there are no losses (0.0 with no profits either).
    pub fn profit_factor(&self) -> f64 {
        if self.gross_loss < 1e-12 {
            return if self.gross_profit > 0.0 { 100.0 } else { 0.0 };
        }
        (self.gross_profit / self.gross_loss).min(100.0)
    }

    pub fn is_empty(&self) -> bool {
        self.trades == 0
    }
}
