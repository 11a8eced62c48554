//! Position sizing: converts a stop distance and equity into a position.
//!
//! Sizes are notional amounts in equity units. Sizers are account-aware (they
//! read equity) but signal-agnostic: the same policy applies to every entry,
//! and pyramids scale the result by `position_multiple`.

use serde::{Deserialize, Serialize};

/// Inputs available to a sizing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInputs {
    /// Equity at the time of the fill.
    pub equity: f64,
    /// Equity the run started with.
    pub initial_equity: f64,
    /// X as a fraction of the fill price.
    pub stop_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SizingPolicy {
    /// Risk `risk_pct` of equity to the stop: `min(max_pct, risk_pct / stop_pct) × equity`,
    /// then capped at `max_size`.
    ProportionalToStop {
        risk_pct: f64,
        max_pct: f64,
        #[serde(default)]
        max_size: Option<f64>,
    },
    /// Fixed fraction of current equity.
    PercentOfEquity { pct: f64 },
    /// Fixed fraction of initial equity; does not compound.
    PercentOfInitial { pct: f64 },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::PercentOfEquity { pct: 1.0 }
    }
}

impl SizingPolicy {
    pub fn name(&self) -> &str {
        match self {
            SizingPolicy::ProportionalToStop { .. } => "proportional_to_stop",
            SizingPolicy::PercentOfEquity { .. } => "percent_of_equity",
            SizingPolicy::PercentOfInitial { .. } => "percent_of_initial",
        }
    }

    /// Position notional; `0.0` when equity is exhausted or the stop is degenerate.
    pub fn size(&self, inputs: SizingInputs) -> f64 {
        if inputs.equity <= 0.0 {
            return 0.0;
        }
        let size = match *self {
            SizingPolicy::ProportionalToStop {
                risk_pct,
                max_pct,
                max_size,
            } => {
                if inputs.stop_pct <= 0.0 {
                    return 0.0;
                }
                let fraction = max_pct.min(risk_pct / inputs.stop_pct);
                let size = fraction * inputs.equity;
                max_size.map_or(size, |cap| size.min(cap))
            }
            SizingPolicy::PercentOfEquity { pct } => pct * inputs.equity,
            SizingPolicy::PercentOfInitial { pct } => pct * inputs.initial_equity,
        };
        if size.is_finite() {
            size.max(0.0)
        } else {
            0.0
        }
    }
}
