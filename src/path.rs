use serde::{Deserialize, Serialize};

/// A geometric path as seen by the reachability core: only its domain matters.
pub trait Path {
    /// `(s_min, s_max)`
    fn interval(&self) -> (f64, f64);
}

/// Path known only by its domain, for callers whose geometry lives elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathDomain {
    pub start: f64,
    pub end: f64,
}

impl PathDomain {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl Path for PathDomain {
    fn interval(&self) -> (f64, f64) {
        (self.start, self.end)
    }
}

impl<F: Fn() -> (f64, f64)> Path for F {
    fn interval(&self) -> (f64, f64) {
        self()
    }
}
