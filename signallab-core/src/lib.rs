//! SignalLab Core: bar-by-bar trade engine, strategy providers, statistics.
//!
//! This crate contains:
//! - Domain types (bars, sides, trades, trade records, events)
//! - Pluggable providers for entries, filters, entry stops, in-trade stops and exits
//! - The external single-channel protocol
//! - The streaming engine: triggers, fills, stop engine, pyramiding, settlement
//! - Statistics buckets, drawdown trackers and the post-exit analyzer

pub mod components;
pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod history;
pub mod indicators;
pub mod post_exit;
pub mod rng;
pub mod sizers;
pub mod stats;

pub use config::{ConfigError, EngineConfig};
pub use engine::{run_backtest, Engine, EngineError, RunResult};
