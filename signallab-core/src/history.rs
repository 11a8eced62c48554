//! Bar history owned by the engine.
//!
//! Providers read history as a slice ending at the current bar. Offsets are
//! explicit and bounds-checked: `ago(0)` is the current bar, `ago(1)` the
//! previous one, and anything older than the first bar is `None`.

use crate::domain::Bar;

/// Growable, append-only bar history.
#[derive(Debug, Clone, Default)]
pub struct BarHistory {
    bars: Vec<Bar>,
}

impl BarHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    /// Run `f` against the history with `bar` temporarily appended.
    ///
    /// Used to evaluate a forming bar without committing it.
    pub fn with_provisional<R>(&mut self, bar: Bar, f: impl FnOnce(&BarHistory) -> R) -> R {
        self.bars.push(bar);
        let out = f(self);
        self.bars.pop();
        out
    }

    /// Bar `offset` bars before the current one.
    pub fn ago(&self, offset: usize) -> Option<&Bar> {
        let len = self.bars.len();
        if offset >= len {
            return None;
        }
        self.bars.get(len - 1 - offset)
    }

    pub fn current(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn clear(&mut self) {
        self.bars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn ago_is_bounds_checked() {
        let mut history = BarHistory::new();
        assert!(history.ago(0).is_none());
        for bar in make_bars(&[1.0, 2.0, 3.0]) {
            history.push(bar);
        }
        assert_eq!(history.ago(0).unwrap().close, 3.0);
        assert_eq!(history.ago(2).unwrap().close, 1.0);
        assert!(history.ago(3).is_none());
    }

    #[test]
    fn provisional_bar_is_removed() {
        let mut history = BarHistory::new();
        let bars = make_bars(&[1.0, 2.0]);
        history.push(bars[0].clone());
        let seen = history.with_provisional(bars[1].clone(), |h| h.len());
        assert_eq!(seen, 2);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().close, 1.0);
    }
}
