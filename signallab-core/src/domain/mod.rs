//! Domain types for SignalLab

pub mod bar;
pub mod event;
pub mod side;
pub mod trade;

pub use bar::Bar;
pub use event::{EngineEvent, EventKind};
pub use side::Side;
pub use trade::{Entry, ExitReason, Trade, TradeContext, TradeRecord};
