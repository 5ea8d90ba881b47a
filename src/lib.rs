#![deny(clippy::unwrap_used)]
//! Time-optimal path parameterization by reachability analysis.
//!
//! A path is discretized into stages; per stage, a [`solvers::StageOracle`]
//! solves a small convex program over the control `u` (path acceleration) and
//! the state `x` (squared path velocity). The [`ReachabilityEngine`] chains
//! those solves into feasible, controllable and reachable sets, then into a
//! velocity profile.

pub mod config;
pub mod constraints;
pub mod discretization;
pub mod error;
pub mod interval;
pub mod path;
pub mod reachability;
pub mod solvers;

pub use config::EngineConfig;
pub use error::{ReachError, Result};
pub use interval::StageInterval;
pub use reachability::{
    Parameterization, ReachObserver, ReachabilityEngine, SilentObserver, TracingObserver,
    VelocityProfile,
};

/// Finite stand-in for "unbounded" state bounds in the feasible-set sweep.
pub const LARGE: f64 = 1e5;
/// Slack on the start velocity check.
pub const SMALL: f64 = 1e-10;
/// Box closing every stage problem of the built-in oracles.
pub const INFTY: f64 = 1e8;
/// Secondary weight on `u` when optimizing `x`, prefers small controls among ties.
pub const TIE_BREAK: f64 = 1e-9;
