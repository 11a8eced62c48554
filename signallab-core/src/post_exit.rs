//! Post-exit analysis.
//!
//! After an exit settles, watch the next `window` bars and measure how far
//! price went in the exited trade's direction (missed opportunity) and
//! against it, both in the trade's X. At most one analysis runs at a time;
//! exits settling while one is active are counted as skipped.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Side};

/// An analysis in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub side: Side,
    pub exit_bar: usize,
    pub reference_close: f64,
    pub risk_unit: f64,
    pub bars_elapsed: usize,
    /// Best continuation of the exited trade's direction, in X.
    pub max_favorable: f64,
    /// Worst move against it, in X (positive).
    pub max_adverse: f64,
    /// Bar offsets (1-based, from the exit bar) where each extreme was last set.
    pub max_favorable_at: usize,
    pub max_adverse_at: usize,
    /// Adverse excursion reached by the time the max favorable was set.
    pub drawdown_to_max_opportunity: f64,
}

impl Analysis {
    fn observe(&mut self, bar: &Bar) {
        self.bars_elapsed += 1;
        let x = self.risk_unit;
        let favorable = self
            .side
            .gain(self.reference_close, self.side.favorable_extreme(bar.high, bar.low))
            / x;
        let adverse = -self
            .side
            .gain(self.reference_close, self.side.adverse_extreme(bar.high, bar.low))
            / x;
        if adverse > self.max_adverse {
            self.max_adverse = adverse;
            self.max_adverse_at = self.bars_elapsed;
        }
        if favorable > self.max_favorable {
            self.max_favorable = favorable;
            self.max_favorable_at = self.bars_elapsed;
            self.drawdown_to_max_opportunity = self.max_adverse;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum PostExitState {
    #[default]
    Idle,
    Analyzing(Analysis),
}

/// Aggregate over completed analyses: sums only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostExitSummary {
    pub analyses: usize,
    pub skipped: usize,
    pub total_max_favorable: f64,
    pub total_max_adverse: f64,
    pub total_drawdown_to_max_opportunity: f64,
    pub total_bars_to_max_favorable: usize,
}

impl PostExitSummary {
    fn record(&mut self, a: &Analysis) {
        self.analyses += 1;
        self.total_max_favorable += a.max_favorable;
        self.total_max_adverse += a.max_adverse;
        self.total_drawdown_to_max_opportunity += a.drawdown_to_max_opportunity;
        self.total_bars_to_max_favorable += a.max_favorable_at;
    }

    fn avg(&self, total: f64) -> f64 {
        if self.analyses == 0 {
            0.0
        } else {
            total / self.analyses as f64
        }
    }

    pub fn avg_max_favorable(&self) -> f64 {
        self.avg(self.total_max_favorable)
    }

    pub fn avg_max_adverse(&self) -> f64 {
        self.avg(self.total_max_adverse)
    }

    pub fn avg_drawdown_to_max_opportunity(&self) -> f64 {
        self.avg(self.total_drawdown_to_max_opportunity)
    }

    pub fn avg_bars_to_max_favorable(&self) -> f64 {
        self.avg(self.total_bars_to_max_favorable as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostExitAnalyzer {
    window: usize,
    state: PostExitState,
    summary: PostExitSummary,
}

impl PostExitAnalyzer {
    /// `window == 0` disables analysis.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            state: PostExitState::Idle,
            summary: PostExitSummary::default(),
        }
    }

    pub fn state(&self) -> &PostExitState {
        &self.state
    }

    pub fn summary(&self) -> &PostExitSummary {
        &self.summary
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, PostExitState::Analyzing(_))
    }

    /// Start an analysis for an exit settled on `exit_bar`.
    ///
    /// Returns `false` when one is already running (the exit is counted as skipped).
    pub fn arm(&mut self, side: Side, exit_bar: usize, reference_close: f64, risk_unit: f64) -> bool {
        if self.window == 0 || risk_unit.is_nan() || risk_unit <= 0.0 {
            return false;
        }
        if self.is_analyzing() {
            self.summary.skipped += 1;
            return false;
        }
        self.state = PostExitState::Analyzing(Analysis {
            side,
            exit_bar,
            reference_close,
            risk_unit,
            bars_elapsed: 0,
            max_favorable: 0.0,
            max_adverse: 0.0,
            max_favorable_at: 0,
            max_adverse_at: 0,
            drawdown_to_max_opportunity: 0.0,
        });
        true
    }

    /// Feed one closed bar; returns the analysis when its window completes.
    pub fn on_bar(&mut self, bar: &Bar) -> Option<Analysis> {
        let PostExitState::Analyzing(analysis) = &mut self.state else {
            return None;
        };
        if bar.index <= analysis.exit_bar {
            return None;
        }
        analysis.observe(bar);
        if analysis.bars_elapsed < self.window {
            return None;
        }
        let PostExitState::Analyzing(done) = std::mem::take(&mut self.state) else {
            return None;
        };
        self.summary.record(&done);
        Some(done)
    }
}
