use thiserror::Error;

use crate::solvers::SolverBackend;

pub type Result<T> = std::result::Result<T, ReachError>;

/// Configuration and argument failures.
///
/// Infeasibility is never reported through this type: it is carried by the
/// empty variants of the returned sets and profiles.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReachError {
    #[error("a discretization needs at least two grid points (got {0})")]
    TooFewGridPoints(usize),
    #[error("grid is not strictly increasing at index {index} ({prev} >= {next})")]
    NonMonotonicGrid { index: usize, prev: f64, next: f64 },
    #[error("grid endpoints [{grid_start}, {grid_end}] do not match the path interval [{path_start}, {path_end}]")]
    GridPathMismatch {
        grid_start: f64,
        grid_end: f64,
        path_start: f64,
        path_end: f64,
    },
    #[error("constraint set has conic constraints, backend {0:?} cannot solve them")]
    ConicUnsupported(SolverBackend),
    #[error("backend {backend:?} only handles (u, x) stage variables, constraints declare {extra} extra variables")]
    ExtraVariablesUnsupported { backend: SolverBackend, extra: usize },
    #[error("constraint parameters cover {got} grid points, expected {expected}")]
    ParamStageMismatch { expected: usize, got: usize },
    #[error("invalid velocity bounds: {0}")]
    InvalidVelocity(String),
}
