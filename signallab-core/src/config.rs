//! Engine configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to a default;
//! strategy sections are tagged by `type`:
//!
//! ```toml
//! direction = "longs_only"
//! initial_equity = 1.0
//!
//! [[entries]]
//! type = "ma_crossover"
//! fast = 10
//! slow = 50
//!
//! [entry_stop]
//! type = "atr"
//! period = 14
//! multiple = 2.0
//!
//! [pyramiding]
//! enabled = true
//! rule = { type = "x_multiple", multiple = 1.0 }
//! max_entries = 2
//! ```
//!
//! Unknown keys, including fields of a different strategy variant, fail to
//! parse. [`EngineConfig::validate`] rejects conflicting or out-of-range
//! options before any bar is processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::components::factory::{FactoryError, Providers};
use crate::components::{EntryStopStrategy, EntryStrategy, ExitStrategy, FilterStrategy, InTradeStopStrategy};
use crate::domain::Side;
use crate::engine::events::EventConfig;
use crate::engine::fill::{CostModel, Fees, Slippage};
use crate::engine::pyramiding::{PyramidRule, PyramidingConfig};
use crate::engine::stops::KickIn;
use crate::sizers::SizingPolicy;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("conflicting options: {0}")]
    Conflict(String),
    #[error(transparent)]
    Component(#[from] FactoryError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Which sides may open trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Both,
    LongsOnly,
    ShortsOnly,
}

impl Direction {
    pub fn permits(self, side: Side) -> bool {
        match self {
            Direction::Both => true,
            Direction::LongsOnly => side == Side::Long,
            Direction::ShortsOnly => side == Side::Short,
        }
    }
}

/// Inclusive timestamp window for entry triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

fn default_initial_equity() -> f64 {
    1.0
}

fn default_post_exit_window() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_initial_equity")]
    pub initial_equity: f64,
    /// Entry providers, in priority order; the index identifies a trade's origin.
    #[serde(default)]
    pub entries: Vec<EntryStrategy>,
    /// Gates first entries.
    #[serde(default)]
    pub filter: FilterStrategy,
    #[serde(default)]
    pub entry_stop: EntryStopStrategy,
    #[serde(default)]
    pub in_trade_stop: InTradeStopStrategy,
    #[serde(default)]
    pub kick_in: KickIn,
    #[serde(default)]
    pub exit: ExitStrategy,
    #[serde(default)]
    pub slippage: Slippage,
    #[serde(default)]
    pub fees: Fees,
    /// Tick size for fill rounding; 0 disables rounding.
    #[serde(default)]
    pub tick_size: f64,
    #[serde(default)]
    pub sizing: SizingPolicy,
    #[serde(default)]
    pub pyramiding: PyramidingConfig,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// Bars observed after each exit; 0 disables post-exit analysis.
    #[serde(default = "default_post_exit_window")]
    pub post_exit_window: usize,
    #[serde(default)]
    pub events: EventConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            initial_equity: default_initial_equity(),
            entries: Vec::new(),
            filter: FilterStrategy::default(),
            entry_stop: EntryStopStrategy::default(),
            in_trade_stop: InTradeStopStrategy::default(),
            kick_in: KickIn::default(),
            exit: ExitStrategy::default(),
            slippage: Slippage::default(),
            fees: Fees::default(),
            tick_size: 0.0,
            sizing: SizingPolicy::default(),
            pyramiding: PyramidingConfig::default(),
            date_range: None,
            post_exit_window: default_post_exit_window(),
            events: EventConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.slippage, self.fees, self.tick_size)
    }

    /// Check ranges and conflicts, then dry-build the configured providers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with_entry_count(self.entries.len())?;
        Providers::from_config(self)?;
        Ok(())
    }

    /// Check everything except provider parameters, for `entry_count` entry providers.
    pub(crate) fn validate_with_entry_count(&self, entry_count: usize) -> Result<(), ConfigError> {
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(invalid("initial_equity", "must be positive"));
        }
        if !(self.tick_size.is_finite() && self.tick_size >= 0.0) {
            return Err(invalid("tick_size", "must be >= 0"));
        }
        self.validate_costs()?;
        self.validate_sizing()?;
        self.validate_kick_in()?;
        self.validate_pyramiding(entry_count)?;
        self.validate_events()?;

        if let Some(range) = self.date_range {
            if range.start > range.end {
                return Err(invalid(
                    "date_range",
                    format!("start {} is after end {}", range.start, range.end),
                ));
            }
        }
        Ok(())
    }

    fn validate_costs(&self) -> Result<(), ConfigError> {
        match self.slippage {
            Slippage::Pct { pct } if !(0.0..1.0).contains(&pct) => {
                return Err(invalid("slippage.pct", "must be in [0, 1)"));
            }
            Slippage::Fixed { amount } if !(amount.is_finite() && amount >= 0.0) => {
                return Err(invalid("slippage.amount", "must be >= 0"));
            }
            _ => {}
        }
        match self.fees {
            Fees::Pct { pct } if !(0.0..1.0).contains(&pct) => {
                Err(invalid("fees.pct", "must be in [0, 1)"))
            }
            Fees::Fixed { amount } if !(amount.is_finite() && amount >= 0.0) => {
                Err(invalid("fees.amount", "must be >= 0"))
            }
            _ => Ok(()),
        }
    }

    fn validate_sizing(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match self.sizing {
            SizingPolicy::ProportionalToStop {
                risk_pct,
                max_pct,
                max_size,
            } => {
                if !(positive(risk_pct) && risk_pct <= 1.0) {
                    return Err(invalid("sizing.risk_pct", "must be in (0, 1]"));
                }
                if !positive(max_pct) {
                    return Err(invalid("sizing.max_pct", "must be positive"));
                }
                if max_size.is_some_and(|m| !positive(m)) {
                    return Err(invalid("sizing.max_size", "must be positive"));
                }
            }
            SizingPolicy::PercentOfEquity { pct } | SizingPolicy::PercentOfInitial { pct } => {
                if !positive(pct) {
                    return Err(invalid("sizing.pct", "must be positive"));
                }
            }
        }
        Ok(())
    }

    fn validate_kick_in(&self) -> Result<(), ConfigError> {
        let value = match self.kick_in {
            KickIn::PassesEntryStop => return Ok(()),
            KickIn::XMultiple { multiple } => multiple,
            KickIn::Percent { pct } => pct,
            KickIn::Fixed { offset } => offset,
        };
        if value.is_finite() {
            Ok(())
        } else {
            Err(invalid("kick_in", "threshold must be finite"))
        }
    }

    fn validate_pyramiding(&self, entry_count: usize) -> Result<(), ConfigError> {
        let p = &self.pyramiding;
        if !p.enabled {
            return Ok(());
        }
        if p.max_entries == 0 {
            return Err(ConfigError::Conflict(
                "pyramiding is enabled with max_entries = 0".into(),
            ));
        }
        if !(p.position_multiple.is_finite() && p.position_multiple > 0.0) {
            return Err(invalid("pyramiding.position_multiple", "must be positive"));
        }
        match p.rule {
            PyramidRule::XMultiple { multiple: v }
            | PyramidRule::Percent { pct: v }
            | PyramidRule::Fixed { offset: v } => {
                if !(v.is_finite() && v > 0.0) {
                    return Err(invalid("pyramiding.rule", "threshold must be positive"));
                }
            }
            PyramidRule::DifferentSignal if entry_count < 2 => {
                return Err(ConfigError::Conflict(
                    "pyramiding rule different_signal needs at least two entries".into(),
                ));
            }
            PyramidRule::SameSignal | PyramidRule::EverySignal if entry_count == 0 => {
                return Err(ConfigError::Conflict(
                    "signal-based pyramiding rule without any entry".into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }

    fn validate_events(&self) -> Result<(), ConfigError> {
        let e = &self.events;
        if e.atr_period == 0 || e.rsi_period == 0 {
            return Err(invalid("events", "periods must be >= 1"));
        }
        if !(e.oversold.is_finite() && e.overbought.is_finite() && e.oversold < e.overbought) {
            return Err(invalid("events", "oversold must be below overbought"));
        }
        for (field, value) in [
            ("events.near_stop_atr", e.near_stop_atr),
            ("events.swing_atr", e.swing_atr),
            ("events.stop_jump_x", e.stop_jump_x),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be finite and >= 0"));
            }
        }
        Ok(())
    }
}
