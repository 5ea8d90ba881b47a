use serde::{Deserialize, Serialize};

use crate::{discretization::Discretization, path::Path};

use super::{Constraint, ConstraintKind, ConstraintParams};

/// Linear rows `a[k]·u + b[k]·x + c[k] <= 0` at one grid point, plus optional
/// direct bounds on the control and the state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearStage {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub u_bounds: Option<(f64, f64)>,
    pub x_bounds: Option<(f64, f64)>,
}

impl LinearStage {
    pub fn bounds(u_bounds: Option<(f64, f64)>, x_bounds: Option<(f64, f64)>) -> Self {
        Self {
            u_bounds,
            x_bounds,
            ..Default::default()
        }
    }

    /// Iterates the `(a, b, c)` rows, ignoring trailing entries of longer columns.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.a
            .iter()
            .zip(&self.b)
            .zip(&self.c)
            .map(|((&a, &b), &c)| (a, b, c))
    }
}

/// Same control and squared-velocity box at every grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxConstraint {
    pub u_bounds: Option<(f64, f64)>,
    pub x_bounds: Option<(f64, f64)>,
}

impl BoxConstraint {
    pub fn new(u_bounds: Option<(f64, f64)>, x_bounds: Option<(f64, f64)>) -> Self {
        Self { u_bounds, x_bounds }
    }
}

impl Constraint for BoxConstraint {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CanonicalLinear
    }

    fn compute_params(&self, _path: &dyn Path, grid: &Discretization) -> ConstraintParams {
        let stage = LinearStage::bounds(self.u_bounds, self.x_bounds);
        ConstraintParams::Linear(vec![stage; grid.stage_count() + 1])
    }
}

/// Precomputed linear rows, one [`LinearStage`] per grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTable {
    pub stages: Vec<LinearStage>,
}

impl LinearTable {
    pub fn new(stages: Vec<LinearStage>) -> Self {
        Self { stages }
    }
}

impl Constraint for LinearTable {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CanonicalLinear
    }

    fn compute_params(&self, _path: &dyn Path, _grid: &Discretization) -> ConstraintParams {
        ConstraintParams::Linear(self.stages.clone())
    }
}
