//! Donchian breakout: close exceeds the channel of the prior N bars.
//!
//! The channel excludes the decision bar, otherwise the close could never
//! exceed its own high. Long on close > upper, short on close < lower.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::Donchian;

use super::{EntryProvider, Signal};

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    upper: Donchian,
    lower: Donchian,
}

impl DonchianBreakout {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "period must be >= 1");
        Self {
            upper: Donchian::upper(period),
            lower: Donchian::lower(period),
        }
    }
}

impl EntryProvider for DonchianBreakout {
    fn name(&self) -> &str {
        "donchian_breakout"
    }

    fn warmup_bars(&self) -> usize {
        self.upper.lookback() + 1
    }

    fn evaluate(&self, bars: &[Bar]) -> Signal {
        let Some((bar, prior)) = bars.split_last() else {
            return Signal::NotReady;
        };
        let (Some(upper), Some(lower)) = (
            self.upper.value(prior),
            self.lower.value(prior),
        ) else {
            return Signal::NotReady;
        };

        if bar.close > upper {
            Signal::Long
        } else if bar.close < lower {
            Signal::Short
        } else {
            Signal::Neutral
        }
    }
}
