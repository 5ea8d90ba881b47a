use serde::{Deserialize, Serialize};

/// Bound on the squared path velocity at one grid point, or the proof that
/// no admissible value exists there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageInterval {
    Empty,
    Bounded { low: f64, high: f64 },
}

impl StageInterval {
    pub fn new(low: f64, high: f64) -> Self {
        Self::Bounded { low, high }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Empty => None,
            Self::Bounded { low, high } => Some((low, high)),
        }
    }

    pub fn low(&self) -> Option<f64> {
        self.bounds().map(|(low, _)| low)
    }

    /// Squared velocities cannot be negative: a negative low end is raised
    /// to 0, and a set lying entirely below 0 is empty.
    pub fn clamp_nonnegative(self) -> Self {
        match self {
            Self::Bounded { low, high } if high >= 0. => Self::Bounded {
                low: low.max(0.),
                high,
            },
            _ => Self::Empty,
        }
    }

    /// `x` pulled back inside the interval, `None` when empty.
    pub fn clamp(&self, x: f64) -> Option<f64> {
        self.bounds().map(|(low, high)| high.min(low.max(x)))
    }

    /// Membership with `tolerance` of slack on both ends.
    pub fn contains(&self, x: f64, tolerance: f64) -> bool {
        match *self {
            Self::Empty => false,
            Self::Bounded { low, high } => x + tolerance >= low && x <= high + tolerance,
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((l1, h1)), Some((l2, h2))) => {
                let (low, high) = (l1.max(l2), h1.min(h2));
                if low <= high {
                    Self::new(low, high)
                } else {
                    Self::Empty
                }
            }
            _ => Self::Empty,
        }
    }
}
