//! Trade and portfolio statistics.
//!
//! Three buckets are kept side by side: first entries, pyramid entries and
//! the combined trade. Drawdown is tracked twice, once on settled equity
//! (close-to-close) and once on equity including open P&L (continuous).

pub mod bucket;
pub mod drawdown;

pub use bucket::{Outcome, StatBucket};
pub use drawdown::DrawdownTracker;

use serde::{Deserialize, Serialize};

use crate::engine::ExitSettlement;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub first: StatBucket,
    pub pyramided: StatBucket,
    pub combined: StatBucket,
    pub close_to_close: DrawdownTracker,
    pub continuous: DrawdownTracker,
}

impl Statistics {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            first: StatBucket::default(),
            pyramided: StatBucket::default(),
            combined: StatBucket::default(),
            close_to_close: DrawdownTracker::new(initial_equity),
            continuous: DrawdownTracker::new(initial_equity),
        }
    }

    /// Roll one settled trade into the buckets and sample settled equity.
    pub fn record(&mut self, settlement: &ExitSettlement, equity_after: f64) {
        self.first.record(&settlement.first);
        if let Some(pyramided) = &settlement.pyramided {
            self.pyramided.record(pyramided);
        }
        self.combined.record(&settlement.combined);
        self.close_to_close.sample(equity_after);
    }

    /// Sample equity including open P&L.
    pub fn mark(&mut self, shadow_equity: f64) {
        self.continuous.sample(shadow_equity);
    }
}
