use tracing::{debug, info, warn};

use crate::interval::StageInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Computation {
    FeasibleSets,
    ControllableSets,
    ReachableSets,
    Parameterization,
}

/// Sink for everything the engine has to say while it runs.
///
/// Handed to the engine at construction. All methods default to doing nothing.
pub trait ReachObserver {
    fn started(&self, _computation: Computation) {}

    fn feasible_set(&self, _i: usize, _set: &StageInterval) {}

    fn controllable_set(&self, _i: usize, _set: &StageInterval) {}

    fn reachable_set(&self, _i: usize, _set: &StageInterval) {}

    /// `K[0]` is empty; `first_empty` is the right-most stage whose set emptied.
    fn path_not_parameterizable(&self, _first_empty: usize) {}

    /// `x_start` lies outside `K[0]`.
    fn start_not_controllable(&self, _x_start: f64, _initial: &StageInterval) {}

    fn forward_step(&self, _i: usize, _u: f64, _x_next: f64) {}

    /// Stage `i` of the forward pass had no solution; the rest of the profile is empty.
    fn forward_step_failed(&self, _i: usize) {}
}

/// Forwards engine events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReachObserver for TracingObserver {
    fn started(&self, computation: Computation) {
        info!("start computing {:?}", computation);
    }

    fn feasible_set(&self, i: usize, set: &StageInterval) {
        debug!("X[{}] = {:?}", i, set);
    }

    fn controllable_set(&self, i: usize, set: &StageInterval) {
        debug!("K[{}] = {:?}", i, set);
    }

    fn reachable_set(&self, i: usize, set: &StageInterval) {
        debug!("L[{}] = {:?}", i, set);
    }

    fn path_not_parameterizable(&self, first_empty: usize) {
        warn!(
            "the 0-th controllable set is empty (first emptied at stage {}), this path is not parametrizable",
            first_empty
        );
    }

    fn start_not_controllable(&self, x_start: f64, initial: &StageInterval) {
        warn!(
            "the initial velocity is not controllable: {} not in {:?}",
            x_start, initial
        );
    }

    fn forward_step(&self, i: usize, u: f64, x_next: f64) {
        debug!("forward pass: u_{} = {}, x_{} = {}", i, u, i + 1, x_next);
    }

    fn forward_step_failed(&self, i: usize) {
        warn!("forward pass: stage {} has no admissible control", i);
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl ReachObserver for SilentObserver {}
