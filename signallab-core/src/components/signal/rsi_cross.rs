//! RSI threshold cross.
//!
//! Long when RSI crosses up out of the oversold zone, short when it crosses
//! down out of the overbought zone.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::Rsi;

use super::{EntryProvider, Signal};

#[derive(Debug, Clone)]
pub struct RsiCross {
    rsi: Rsi,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiCross {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        assert!(oversold < overbought, "oversold must be below overbought");
        Self {
            rsi: Rsi::new(period),
            oversold,
            overbought,
        }
    }
}

impl EntryProvider for RsiCross {
    fn name(&self) -> &str {
        "rsi_cross"
    }

    fn warmup_bars(&self) -> usize {
        self.rsi.lookback() + 1
    }

    fn evaluate(&self, bars: &[Bar]) -> Signal {
        if bars.len() < self.warmup_bars() {
            return Signal::NotReady;
        }
        let (Some(cur), Some(prev)) = (self.rsi.value(bars), self.rsi.previous(bars)) else {
            return Signal::NotReady;
        };

        if prev <= self.oversold && cur > self.oversold {
            Signal::Long
        } else if prev >= self.overbought && cur < self.overbought {
            Signal::Short
        } else {
            Signal::Neutral
        }
    }
}
