//! Constraints hand the stage oracle their per-stage coefficients.
//!
//! Coefficients are computed once over the oracle's grid and cached for the
//! oracle's lifetime. How they were derived (robot dynamics, tool limits…) is
//! the caller's business: the tables here only carry already computed numbers.

mod conic;
mod linear;

pub use conic::{ConicRow, ConicStage, ConicTable};
pub use linear::{BoxConstraint, LinearStage, LinearTable};

use serde::{Deserialize, Serialize};

use crate::{discretization::Discretization, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Representable with linear inequalities on `(u, x)`.
    CanonicalLinear,
    /// Needs second-order cone rows, only conic backends accept it.
    CanonicalConic,
}

/// Per-stage parameter bundle, one entry per grid point.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintParams {
    Linear(Vec<LinearStage>),
    Conic(Vec<ConicStage>),
}

impl ConstraintParams {
    pub fn len(&self) -> usize {
        match self {
            Self::Linear(stages) => stages.len(),
            Self::Conic(stages) => stages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Constraint {
    fn kind(&self) -> ConstraintKind;

    /// Auxiliary stage variables this constraint adds after `(u, x)`.
    fn extra_var_count(&self) -> usize {
        0
    }

    fn compute_params(&self, path: &dyn Path, grid: &Discretization) -> ConstraintParams;
}

pub fn has_conic(constraints: &[&dyn Constraint]) -> bool {
    constraints
        .iter()
        .any(|c| c.kind() == ConstraintKind::CanonicalConic)
}
