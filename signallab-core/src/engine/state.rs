//! Engine state, per-bar reports and run results.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::domain::{EngineEvent, ExitReason, Side, Trade, TradeRecord};
use crate::fingerprint::RunFingerprint;
use crate::post_exit::{Analysis, PostExitAnalyzer, PostExitSummary};
use crate::stats::Statistics;

use super::settlement::{EntryOrder, SettlementSkip};
use super::triggers::Triggers;

/// Everything carried from one bar to the next.
///
/// Bar history lives beside it in the engine; this part is small enough to
/// clone for intrabar previews.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub trade: Option<Trade>,
    pub pending_entry: Option<EntryOrder>,
    pub pending_exit: Option<ExitReason>,
    pub equity: f64,
    pub ruined: bool,
    pub stats: Statistics,
    pub post_exit: PostExitAnalyzer,
    pub skipped_entries: usize,
    /// Index of the last closed bar processed.
    pub last_index: Option<usize>,
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            trade: None,
            pending_entry: None,
            pending_exit: None,
            equity: config.initial_equity,
            ruined: false,
            stats: Statistics::new(config.initial_equity),
            post_exit: PostExitAnalyzer::new(config.post_exit_window),
            skipped_entries: 0,
            last_index: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.trade.is_none()
    }

    /// Settle equity and the ruin flag together.
    pub(crate) fn apply_pnl(&mut self, pnl: f64) {
        self.equity += pnl;
        if self.equity <= 0.0 && !self.ruined {
            self.ruined = true;
            tracing::info!(equity = self.equity, "account ruined, entries disabled");
        }
    }

    /// Settled equity plus open P&L at `price`.
    pub fn shadow_equity(&self, price: f64) -> f64 {
        self.equity + self.trade.as_ref().map_or(0.0, |t| t.unrealized_pnl(price))
    }
}

/// One row of the bar-by-bar trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarTrace {
    pub bar_index: usize,
    pub close: f64,
    pub equity: f64,
    pub shadow_equity: f64,
    pub position: Option<Side>,
    pub entries_open: usize,
    pub published_stop: Option<f64>,
    pub triggers: Triggers,
    pub ruined: bool,
}

/// What one bar did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarReport {
    pub trace: BarTrace,
    pub events: Vec<EngineEvent>,
    pub settled: Option<TradeRecord>,
    pub skipped: Option<SettlementSkip>,
    pub post_exit: Option<Analysis>,
}

/// Output of a complete backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub trace: Vec<BarTrace>,
    pub events: Vec<EngineEvent>,
    pub trades: Vec<TradeRecord>,
    pub statistics: Statistics,
    pub post_exit: PostExitSummary,
    pub post_exit_analyses: Vec<Analysis>,
    pub final_equity: f64,
    pub ruined: bool,
    pub skipped_entries: usize,
    /// Bars rejected as stale or malformed.
    pub rejected_bars: usize,
}

impl RunResult {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            trace: Vec::new(),
            events: Vec::new(),
            trades: Vec::new(),
            statistics: Statistics::new(config.initial_equity),
            post_exit: PostExitSummary::default(),
            post_exit_analyses: Vec::new(),
            final_equity: config.initial_equity,
            ruined: false,
            skipped_entries: 0,
            rejected_bars: 0,
        }
    }

    pub(crate) fn absorb(&mut self, report: BarReport) {
        self.trace.push(report.trace);
        self.events.extend(report.events);
        self.trades.extend(report.settled);
        self.post_exit_analyses.extend(report.post_exit);
    }

    pub(crate) fn finish(&mut self, state: &EngineState) {
        self.statistics = state.stats.clone();
        self.post_exit = state.post_exit.summary().clone();
        self.final_equity = state.equity;
        self.ruined = state.ruined;
        self.skipped_entries = state.skipped_entries;
    }

    /// Digest of statistics, events and trades; identical runs hash identically.
    pub fn fingerprint(&self) -> RunFingerprint {
        RunFingerprint::of(&(&self.statistics, &self.events, &self.trades))
    }
}
