//! Strategy providers: the pluggable half of the engine.
//!
//! Five provider kinds feed the trade state machine:
//! - Entry: detects market events, emits directional intent
//! - Filter: gates first entries by market regime
//! - Entry stop: protective level computed blind to trade context
//! - In-trade stop: trade-aware trailing candidate
//! - Exit: strategy-driven exit alongside the stop
//!
//! All of them are pure functions of bar history (plus a read-only trade
//! view for the last two). Built-in strategies are closed sets of tagged
//! variants selected in configuration and built by [`factory`].

pub mod entry_stop;
pub mod exit;
pub mod external;
pub mod factory;
pub mod filter;
pub mod indicator;
pub mod signal;
pub mod stop;

pub use entry_stop::{EntryStopProvider, EntryStopStrategy, StopLevels};
pub use exit::{ExitProvider, ExitSignal, ExitStrategy};
pub use factory::{FactoryError, Providers};
pub use filter::{FilterProvider, FilterState, FilterStrategy};
pub use indicator::Indicator;
pub use signal::{EntryProvider, EntryStrategy, Signal};
pub use stop::{InTradeStopProvider, InTradeStopStrategy};
