use serde::{Deserialize, Serialize};

use crate::{solvers::SolverBackend, LARGE, SMALL, TIE_BREAK};

/// Knobs of the reachability engine. Every field has a default so a partial
/// JSON object is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend to instantiate, auto-selected from the constraint kinds when absent.
    pub backend: Option<SolverBackend>,
    /// Finite magnitude standing in for "unbounded" in the feasible-set sweep.
    pub large_bound: f64,
    /// Slack allowed when checking the start velocity against `K[0]`.
    pub start_tolerance: f64,
    /// Weight of the secondary term on `u` in the min/max `x` objectives.
    pub tie_break: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: None,
            large_bound: LARGE,
            start_tolerance: SMALL,
            tie_break: TIE_BREAK,
        }
    }
}
