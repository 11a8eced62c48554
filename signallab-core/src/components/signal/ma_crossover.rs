//! Moving average crossover: fast SMA crosses the slow SMA.
//!
//! Long (golden cross): fast > slow on the decision bar, fast <= slow on the bar before.
//! Short (death cross): fast < slow now, fast >= slow before.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::Sma;

use super::{EntryProvider, Signal};

#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast: Sma,
    slow: Sma,
}

impl MaCrossover {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1, "fast period must be >= 1");
        assert!(fast < slow, "fast period must be < slow period");
        Self {
            fast: Sma::new(fast),
            slow: Sma::new(slow),
        }
    }
}

impl EntryProvider for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        // one extra bar for the previous crossover state
        self.slow.lookback() + 1
    }

    fn evaluate(&self, bars: &[Bar]) -> Signal {
        let n = bars.len();
        if n < self.warmup_bars() {
            return Signal::NotReady;
        }
        let (Some(fast_cur), Some(slow_cur), Some(fast_prev), Some(slow_prev)) = (
            self.fast.value(bars),
            self.slow.value(bars),
            self.fast.previous(bars),
            self.slow.previous(bars),
        ) else {
            return Signal::NotReady;
        };

        if fast_cur > slow_cur && fast_prev <= slow_prev {
            Signal::Long
        } else if fast_cur < slow_cur && fast_prev >= slow_prev {
            Signal::Short
        } else {
            Signal::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn golden_cross_fires_long() {
        // flat then a jump: fast(2) overtakes slow(4) on the last bar
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 14.0]);
        assert_eq!(MaCrossover::new(2, 4).evaluate(&bars), Signal::Long);
    }

    #[test]
    fn death_cross_fires_short() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 6.0]);
        assert_eq!(MaCrossover::new(2, 4).evaluate(&bars), Signal::Short);
    }

    #[test]
    fn no_cross_is_neutral() {
        // fast already above slow on the previous bar
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 14.0, 15.0]);
        assert_eq!(MaCrossover::new(2, 4).evaluate(&bars), Signal::Neutral);
    }

    #[test]
    fn warmup_not_ready() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0]);
        assert_eq!(MaCrossover::new(2, 4).evaluate(&bars), Signal::NotReady);
    }

    #[test]
    #[should_panic(expected = "fast period must be < slow period")]
    fn rejects_inverted_periods() {
        MaCrossover::new(5, 3);
    }
}
