/// A move smaller than this (in absolute price units) counts as no change.
pub const CHANGE_THRESHOLD: f64 = 0.01;

/// Ternary direction of a one-step price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceChange {
    Down,
    Flat,
    Up,
}

impl PriceChange {
    /// Class order used by the classifier.
    pub const ALL: [PriceChange; 3] = [PriceChange::Down, PriceChange::Flat, PriceChange::Up];

    pub fn from_diff(diff: f64) -> Self {
        if diff > CHANGE_THRESHOLD {
            PriceChange::Up
        } else if diff < -CHANGE_THRESHOLD {
            PriceChange::Down
        } else {
            PriceChange::Flat
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            PriceChange::Down => -1,
            PriceChange::Flat => 0,
            PriceChange::Up => 1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(PriceChange::Down),
            0 => Some(PriceChange::Flat),
            1 => Some(PriceChange::Up),
            _ => None,
        }
    }

    pub fn class_index(self) -> usize {
        match self {
            PriceChange::Down => 0,
            PriceChange::Flat => 1,
            PriceChange::Up => 2,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}
