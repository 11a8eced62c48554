use serde::{Deserialize, Serialize};

/// Direction of a trade or signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for longs, -1.0 for shorts.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Signed move from `from` to `to`, positive when it favors this side.
    pub fn gain(self, from: f64, to: f64) -> f64 {
        (to - from) * self.sign()
    }

    /// Whether `candidate` is strictly closer to price than `current` for a stop on this side.
    ///
    /// Longs tighten upwards, shorts downwards.
    pub fn is_tighter(self, candidate: f64, current: f64) -> bool {
        match self {
            Side::Long => candidate > current,
            Side::Short => candidate < current,
        }
    }

    /// Whether `price` has crossed through `stop` against this side.
    pub fn is_breached(self, stop: f64, price: f64) -> bool {
        match self {
            Side::Long => price < stop,
            Side::Short => price > stop,
        }
    }

    /// Whether a stop at `stop` sits on the protective side of `price`.
    pub fn is_valid_stop(self, stop: f64, price: f64) -> bool {
        match self {
            Side::Long => stop < price,
            Side::Short => stop > price,
        }
    }

    /// The favorable extreme of a bar for this side.
    pub fn favorable_extreme(self, high: f64, low: f64) -> f64 {
        match self {
            Side::Long => high,
            Side::Short => low,
        }
    }

    /// The adverse extreme of a bar for this side.
    pub fn adverse_extreme(self, high: f64, low: f64) -> f64 {
        self.opposite().favorable_extreme(high, low)
    }
}
