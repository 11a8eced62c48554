//! Random entry: fires with a fixed probability, direction by coin flip.
//!
//! Draws come from a per-bar RNG seeded by `(seed, bar.index)`, so the
//! provider stays a pure function of history and a re-evaluated bar always
//! produces the same signal.

use rand::Rng;

use crate::domain::Bar;
use crate::rng::rng_for_bar;

use super::{EntryProvider, Signal};

#[derive(Debug, Clone)]
pub struct RandomEntry {
    pub seed: u64,
    pub probability: f64,
}

impl RandomEntry {
    pub fn new(seed: u64, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability must be in [0, 1]"
        );
        Self { seed, probability }
    }
}

impl EntryProvider for RandomEntry {
    fn name(&self) -> &str {
        "random"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, bars: &[Bar]) -> Signal {
        let Some(bar) = bars.last() else {
            return Signal::NotReady;
        };
        let mut rng = rng_for_bar(self.seed, bar.index);
        if rng.gen::<f64>() >= self.probability {
            return Signal::Neutral;
        }
        if rng.gen_bool(0.5) {
            Signal::Long
        } else {
            Signal::Short
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn same_bar_same_signal() {
        let bars = make_bars(&[10.0; 20]);
        let entry = RandomEntry::new(7, 0.5);
        for i in 1..=bars.len() {
            assert_eq!(entry.evaluate(&bars[..i]), entry.evaluate(&bars[..i]));
        }
    }

    #[test]
    fn zero_probability_never_fires() {
        let bars = make_bars(&[10.0; 50]);
        let entry = RandomEntry::new(1, 0.0);
        assert!((1..=bars.len()).all(|i| entry.evaluate(&bars[..i]) == Signal::Neutral));
    }

    #[test]
    fn certain_probability_always_fires() {
        let bars = make_bars(&[10.0; 50]);
        let entry = RandomEntry::new(1, 1.0);
        let fired: Vec<Signal> = (1..=bars.len()).map(|i| entry.evaluate(&bars[..i])).collect();
        assert!(fired.iter().all(|s| s.side().is_some()));
        assert!(fired.contains(&Signal::Long));
        assert!(fired.contains(&Signal::Short));
    }

    #[test]
    fn empty_history_not_ready() {
        assert_eq!(RandomEntry::new(1, 1.0).evaluate(&[]), Signal::NotReady);
    }
}
