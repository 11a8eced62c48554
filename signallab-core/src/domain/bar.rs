//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar with a monotonically increasing index.
///
/// Bars are immutable once closed: the engine appends them to its history and
/// never mutates them afterwards. `channel` carries the optional value of the
/// external single-channel signal for this bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub channel: Option<f64>,
}

impl Bar {
    pub fn new(
        index: usize,
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            index,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            channel: None,
        }
    }

    /// Attach an external channel value.
    pub fn with_channel(mut self, value: f64) -> Self {
        self.channel = Some(value);
        self
    }

    /// Basic OHLC sanity check: finite prices, high >= low, open/close inside the range.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
