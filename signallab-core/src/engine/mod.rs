//! Trade state machine.
//!
//! The engine folds closed bars into [`EngineState`] one at a time. Decisions
//! on bar N only see bars up to N and take effect at the open of N+1.

pub mod events;
pub mod fill;
pub mod loop_runner;
pub mod pyramiding;
pub mod settlement;
pub mod state;
pub mod stops;
pub mod triggers;

pub use events::EventConfig;
pub use fill::{CostModel, Fees, Fill, Slippage};
pub use loop_runner::{run_backtest, Engine, EngineError};
pub use pyramiding::{PyramidRule, PyramidingConfig};
pub use settlement::{EntryOrder, ExitSettlement, SettlementSkip};
pub use state::{BarReport, BarTrace, EngineState, RunResult};
pub use stops::{KickIn, StopUpdate};
pub use triggers::Triggers;
