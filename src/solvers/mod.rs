//! Stage oracles: the convex subproblem solved once per stage and per call.
//!
//! The engine only talks to [`StageOracle`]. [`SolverBackend`] is the closed
//! set of built-in oracles, resolved against the constraint set by
//! [`build_oracle`].

pub mod conic;
pub mod planar;
pub mod qp;
mod stage_data;

pub use stage_data::StageData;

use std::ops::{Deref, DerefMut};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReachError, Result};

/// Optimal stage vector `[u, x, v…]`, or nothing.
///
/// `Empty` covers both a provably infeasible stage and a solver that gave up,
/// the two are not told apart. Accessors treat missing entries of a short
/// vector as absent instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub enum StageSolution {
    Optimal(DVector<f64>),
    Empty,
}

impl StageSolution {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn u(&self) -> Option<f64> {
        match self {
            Self::Optimal(z) => z.get(0).copied(),
            Self::Empty => None,
        }
    }

    pub fn x(&self) -> Option<f64> {
        match self {
            Self::Optimal(z) => z.get(1).copied(),
            Self::Empty => None,
        }
    }

    /// Auxiliary variables, everything after `(u, x)`.
    pub fn aux(&self) -> Option<DVector<f64>> {
        match self {
            Self::Optimal(z) if z.len() >= 2 => Some(z.rows(2, z.len() - 2).into_owned()),
            _ => None,
        }
    }
}

/// Bounds on `x_i` and on `x_{i+1} = x_i + 2·delta_i·u_i` for one stage solve.
/// `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageBounds {
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub x_next_min: Option<f64>,
    pub x_next_max: Option<f64>,
}

impl StageBounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_x(self, min: f64, max: f64) -> Self {
        Self {
            x_min: Some(min),
            x_max: Some(max),
            ..self
        }
    }

    pub fn with_x_next(self, min: f64, max: f64) -> Self {
        Self {
            x_next_min: Some(min),
            x_next_max: Some(max),
            ..self
        }
    }
}

pub trait StageOracle {
    /// Number of stages `N`.
    fn stage_count(&self) -> usize;

    /// Length of the stage vector, `2 + extra variables`.
    fn variable_count(&self) -> usize;

    fn deltas(&self) -> &[f64];

    /// Called before the first solve of a computation.
    fn setup_session(&mut self) {}

    /// Called after the last solve of a computation, on every exit path.
    fn close_session(&mut self) {}

    /// Minimizes `0.5·zᵀHz + gᵀz` over stage `i`'s feasible set intersected
    /// with `bounds`. A missing `h` is the zero matrix. At `i == N` the
    /// `x_next` bounds are ignored.
    fn solve_stagewise_optim(
        &mut self,
        i: usize,
        h: Option<&DMatrix<f64>>,
        g: &DVector<f64>,
        bounds: StageBounds,
    ) -> StageSolution;
}

impl<T: StageOracle + ?Sized> StageOracle for Box<T> {
    fn stage_count(&self) -> usize {
        (**self).stage_count()
    }

    fn variable_count(&self) -> usize {
        (**self).variable_count()
    }

    fn deltas(&self) -> &[f64] {
        (**self).deltas()
    }

    fn setup_session(&mut self) {
        (**self).setup_session()
    }

    fn close_session(&mut self) {
        (**self).close_session()
    }

    fn solve_stagewise_optim(
        &mut self,
        i: usize,
        h: Option<&DMatrix<f64>>,
        g: &DVector<f64>,
        bounds: StageBounds,
    ) -> StageSolution {
        (**self).solve_stagewise_optim(i, h, g, bounds)
    }
}

/// Scoped oracle session: opened on creation, closed on drop.
pub struct OracleSession<'a> {
    oracle: &'a mut dyn StageOracle,
}

impl<'a> OracleSession<'a> {
    pub fn open(oracle: &'a mut dyn StageOracle) -> Self {
        oracle.setup_session();
        Self { oracle }
    }
}

impl<'a> Deref for OracleSession<'a> {
    type Target = dyn StageOracle + 'a;

    fn deref(&self) -> &Self::Target {
        self.oracle
    }
}

impl DerefMut for OracleSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.oracle
    }
}

impl Drop for OracleSession<'_> {
    fn drop(&mut self) {
        self.oracle.close_session();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Planar quadratic program, canonical linear constraints only.
    Qp,
    /// Cutting planes over the planar QP, also accepts cone rows.
    Conic,
}

impl SolverBackend {
    pub fn supports_conic(self) -> bool {
        match self {
            Self::Qp => false,
            Self::Conic => true,
        }
    }

    /// Honors `requested` when it can solve the constraint set, otherwise
    /// picks the cheapest backend that can.
    pub fn select(requested: Option<Self>, needs_conic: bool) -> Result<Self> {
        match requested {
            Some(backend) if needs_conic && !backend.supports_conic() => {
                Err(ReachError::ConicUnsupported(backend))
            }
            Some(backend) => Ok(backend),
            None if needs_conic => Ok(Self::Conic),
            None => Ok(Self::Qp),
        }
    }
}

/// Resolves `requested` against `data` and instantiates the oracle.
pub fn build_oracle(
    requested: Option<SolverBackend>,
    data: StageData,
) -> Result<Box<dyn StageOracle>> {
    let backend = SolverBackend::select(requested, data.has_conic())?;
    if data.extra_var_count() > 0 {
        return Err(ReachError::ExtraVariablesUnsupported {
            backend,
            extra: data.extra_var_count(),
        });
    }
    debug!(
        "selected {:?} backend for {} stages",
        backend,
        data.stage_count()
    );
    Ok(match backend {
        SolverBackend::Qp => Box::new(qp::QpOracle::new(data)),
        SolverBackend::Conic => Box::new(conic::ConicOracle::new(data)),
    })
}
