use std::cmp::Ordering;

use crate::{
    error::{ReachError, Result},
    path::Path,
};

/// Strictly increasing grid `s_0 < … < s_N` spanning a path's domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    gridpoints: Vec<f64>,
    deltas: Vec<f64>,
}

impl Discretization {
    /// Validates `gridpoints` against `path` and derives the step sizes.
    ///
    /// The endpoints must equal the path interval exactly, no tolerance is applied.
    pub fn new(path: &dyn Path, gridpoints: Vec<f64>) -> Result<Self> {
        if gridpoints.len() < 2 {
            return Err(ReachError::TooFewGridPoints(gridpoints.len()));
        }
        let (path_start, path_end) = path.interval();
        let grid_start = gridpoints[0];
        let grid_end = gridpoints[gridpoints.len() - 1];
        if grid_start != path_start || grid_end != path_end {
            return Err(ReachError::GridPathMismatch {
                grid_start,
                grid_end,
                path_start,
                path_end,
            });
        }
        for (index, pair) in gridpoints.windows(2).enumerate() {
            // NaN samples compare as None and are rejected too
            if pair[1].partial_cmp(&pair[0]) != Some(Ordering::Greater) {
                return Err(ReachError::NonMonotonicGrid {
                    index,
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        let deltas = gridpoints.windows(2).map(|p| p[1] - p[0]).collect();
        Ok(Self { gridpoints, deltas })
    }

    /// Evenly spaced grid with `stages` stages over the path interval.
    pub fn uniform(path: &dyn Path, stages: usize) -> Result<Self> {
        if stages == 0 {
            return Err(ReachError::TooFewGridPoints(1));
        }
        let (start, end) = path.interval();
        let step = (end - start) / stages as f64;
        let mut gridpoints: Vec<f64> = (0..stages).map(|i| start + step * i as f64).collect();
        // the last sample is pinned so float accumulation can't break the endpoint check
        gridpoints.push(end);
        Self::new(path, gridpoints)
    }

    /// Number of stages `N`; there are `N + 1` grid points.
    pub fn stage_count(&self) -> usize {
        self.deltas.len()
    }

    pub fn gridpoints(&self) -> &[f64] {
        &self.gridpoints
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }
}
