use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{discretization::Discretization, path::Path};

use super::{Constraint, ConstraintKind, ConstraintParams};

/// Second-order cone row `a·u + b·x + c + ‖Pᵀ [u, x, 1]‖₂ <= 0`.
///
/// `p` lists the columns of `P`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConicRow {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub p: Vec<[f64; 3]>,
}

impl ConicRow {
    fn cone_terms(&self, u: f64, x: f64) -> impl Iterator<Item = (Vector3<f64>, f64)> + '_ {
        let z = Vector3::new(u, x, 1.);
        self.p.iter().map(move |col| {
            let col = Vector3::from(*col);
            let value = col.dot(&z);
            (col, value)
        })
    }

    /// Row value at `(u, x)`; positive means violated.
    pub fn value(&self, u: f64, x: f64) -> f64 {
        let norm = self
            .cone_terms(u, x)
            .map(|(_, v)| v * v)
            .sum::<f64>()
            .sqrt();
        self.a * u + self.b * x + self.c + norm
    }

    /// A subgradient of [`Self::value`] with respect to `(u, x)`.
    pub fn subgradient(&self, u: f64, x: f64) -> (f64, f64) {
        let (mut gu, mut gx, mut sq) = (0., 0., 0.);
        for (col, v) in self.cone_terms(u, x) {
            gu += col.x * v;
            gx += col.y * v;
            sq += v * v;
        }
        let norm = sq.sqrt();
        if norm > 0. {
            (self.a + gu / norm, self.b + gx / norm)
        } else {
            // the norm is not differentiable at its apex, zero is a valid subgradient there
            (self.a, self.b)
        }
    }
}

/// Cone rows at one grid point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConicStage {
    pub rows: Vec<ConicRow>,
}

/// Precomputed cone rows, one [`ConicStage`] per grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConicTable {
    pub stages: Vec<ConicStage>,
}

impl ConicTable {
    pub fn new(stages: Vec<ConicStage>) -> Self {
        Self { stages }
    }
}

impl Constraint for ConicTable {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CanonicalConic
    }

    fn compute_params(&self, _path: &dyn Path, _grid: &Discretization) -> ConstraintParams {
        ConstraintParams::Conic(self.stages.clone())
    }
}
