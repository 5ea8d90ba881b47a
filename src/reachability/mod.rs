//! Reachability analysis over a discretized path.
//!
//! Every computation opens one oracle session, issues its stage solves in
//! order, and closes the session when it returns. Infeasibility is never an
//! error: it shows up as [`StageInterval::Empty`] entries or as
//! [`Parameterization::Infeasible`].

mod observer;
mod profile;

pub use observer::{Computation, ReachObserver, SilentObserver, TracingObserver};
pub use profile::{Parameterization, VelocityProfile};

use nalgebra::DVector;

use crate::{
    config::EngineConfig,
    constraints::Constraint,
    discretization::Discretization,
    error::{ReachError, Result},
    interval::StageInterval,
    path::Path,
    solvers::{build_oracle, OracleSession, StageBounds, StageData, StageOracle, StageSolution},
};

pub struct ReachabilityEngine {
    oracle: Box<dyn StageOracle>,
    observer: Box<dyn ReachObserver>,
    config: EngineConfig,
}

impl ReachabilityEngine {
    /// Validates the grid, caches every constraint's parameters and picks the
    /// oracle backend (`config.backend`, or auto-selected).
    pub fn new(
        constraints: &[&dyn Constraint],
        path: &dyn Path,
        gridpoints: Vec<f64>,
        config: EngineConfig,
        observer: Box<dyn ReachObserver>,
    ) -> Result<Self> {
        let grid = Discretization::new(path, gridpoints)?;
        let data = StageData::new(constraints, path, grid)?;
        let oracle = build_oracle(config.backend, data)?;
        Ok(Self::with_oracle(oracle, config, observer))
    }

    /// Runs the engine on a caller-provided oracle. `config.backend` is ignored.
    pub fn with_oracle(
        oracle: Box<dyn StageOracle>,
        config: EngineConfig,
        observer: Box<dyn ReachObserver>,
    ) -> Self {
        Self {
            oracle,
            observer,
            config,
        }
    }

    pub fn stage_count(&self) -> usize {
        self.oracle.stage_count()
    }

    pub fn variable_count(&self) -> usize {
        self.oracle.variable_count()
    }

    pub fn deltas(&self) -> &[f64] {
        self.oracle.deltas()
    }

    /// `g` with `g_u` on the control and `g_x` on the state, zero elsewhere.
    fn linear_cost(&self, g_u: f64, g_x: f64) -> DVector<f64> {
        let mut g = DVector::zeros(self.variable_count());
        g[0] = g_u;
        g[1] = g_x;
        g
    }

    /// `X[i]`: squared velocities admissible at each grid point on its own.
    pub fn compute_feasible_sets(&mut self) -> Vec<StageInterval> {
        self.observer.started(Computation::FeasibleSets);
        let n = self.stage_count();
        let g_lower = self.linear_cost(self.config.tie_break, 1.);
        let g_upper = -g_lower.clone();
        let large = self.config.large_bound;
        let bounds = StageBounds::unbounded()
            .with_x(-large, large)
            .with_x_next(-large, large);

        let mut sets = Vec::with_capacity(n + 1);
        let mut session = OracleSession::open(&mut *self.oracle);
        for i in 0..=n {
            let low = session.solve_stagewise_optim(i, None, &g_lower, bounds);
            let high = session.solve_stagewise_optim(i, None, &g_upper, bounds);
            let set = interval_of(&low, &high).clamp_nonnegative();
            self.observer.feasible_set(i, &set);
            sets.push(set);
        }
        sets
    }

    /// `K[i]`: squared velocities at `s_i` from which `[sdmin², sdmax²]` is
    /// reachable at the end of the path.
    ///
    /// Computed right to left. Once a set is empty every set to its left is
    /// empty as well, without solving. An empty `K[0]` is reported to the
    /// observer, not as an error.
    pub fn compute_controllable_sets(
        &mut self,
        sdmin: f64,
        sdmax: f64,
    ) -> Result<Vec<StageInterval>> {
        check_velocity_bounds(sdmin, sdmax)?;
        self.observer.started(Computation::ControllableSets);
        let n = self.stage_count();
        let g_upper = self.linear_cost(self.config.tie_break, -1.);
        let g_lower = -g_upper.clone();

        let mut sets = vec![StageInterval::Empty; n + 1];
        sets[n] = StageInterval::new(sdmin * sdmin, sdmax * sdmax);
        self.observer.controllable_set(n, &sets[n]);

        let mut session = OracleSession::open(&mut *self.oracle);
        for i in (0..n).rev() {
            sets[i] = match sets[i + 1].bounds() {
                None => StageInterval::Empty,
                Some((next_low, next_high)) => {
                    let bounds = StageBounds::unbounded().with_x_next(next_low, next_high);
                    let high = session.solve_stagewise_optim(i, None, &g_upper, bounds);
                    let low = session.solve_stagewise_optim(i, None, &g_lower, bounds);
                    interval_of(&low, &high).clamp_nonnegative()
                }
            };
            self.observer.controllable_set(i, &sets[i]);
        }
        drop(session);

        if let Some(first_empty) = sets.iter().rposition(StageInterval::is_empty) {
            self.observer.path_not_parameterizable(first_empty);
        }
        Ok(sets)
    }

    /// `L[i]`: squared velocities reachable at `s_i` when starting anywhere in
    /// `[sdmin², sdmax²]`, each clipped to its feasible set.
    ///
    /// Computed left to right; once a set is empty every later set is empty.
    pub fn compute_reachable_sets(
        &mut self,
        sdmin: f64,
        sdmax: f64,
    ) -> Result<Vec<StageInterval>> {
        check_velocity_bounds(sdmin, sdmax)?;
        let feasible = self.compute_feasible_sets();
        self.observer.started(Computation::ReachableSets);
        let n = self.stage_count();
        let deltas = self.deltas().to_vec();

        let mut sets = vec![StageInterval::Empty; n + 1];
        sets[0] = StageInterval::new(sdmin * sdmin, sdmax * sdmax).intersect(&feasible[0]);
        self.observer.reachable_set(0, &sets[0]);

        let mut session = OracleSession::open(&mut *self.oracle);
        for i in 0..n {
            sets[i + 1] = match (sets[i].bounds(), feasible[i + 1].bounds()) {
                (Some((low, high)), Some((next_low, next_high))) => {
                    let bounds = StageBounds::unbounded()
                        .with_x(low, high)
                        .with_x_next(next_low, next_high);
                    // maximize then minimize x + 2·delta·u
                    let mut g_upper = DVector::zeros(session.variable_count());
                    g_upper[0] = -2. * deltas[i];
                    g_upper[1] = -1.;
                    let g_lower = -g_upper.clone();
                    let high = session.solve_stagewise_optim(i, None, &g_upper, bounds);
                    let low = session.solve_stagewise_optim(i, None, &g_lower, bounds);
                    let next_state =
                        |s: &StageSolution| s.u().zip(s.x()).map(|(u, x)| x + 2. * deltas[i] * u);
                    match (next_state(&low), next_state(&high)) {
                        (Some(low), Some(high)) => StageInterval::new(low, high)
                            .intersect(&feasible[i + 1])
                            .clamp_nonnegative(),
                        _ => StageInterval::Empty,
                    }
                }
                _ => StageInterval::Empty,
            };
            self.observer.reachable_set(i + 1, &sets[i + 1]);
        }
        Ok(sets)
    }

    /// Time-optimal profile from `sd_start` to `sd_end`.
    ///
    /// Greedy forward pass over the controllable sets: each stage takes the
    /// largest admissible control that keeps the next state controllable.
    /// If a stage has no solution (numerical breakdown), that stage and every
    /// later entry are left empty and no further solves are issued.
    pub fn compute_parameterization(
        &mut self,
        sd_start: f64,
        sd_end: f64,
    ) -> Result<Parameterization> {
        check_velocity_bounds(sd_start, sd_start)?;
        check_velocity_bounds(sd_end, sd_end)?;
        let controllable = self.compute_controllable_sets(sd_end, sd_end)?;
        if controllable.iter().any(StageInterval::is_empty) {
            return Ok(Parameterization::Infeasible);
        }
        let x_start = sd_start * sd_start;
        if !controllable[0].contains(x_start, self.config.start_tolerance) {
            self.observer.start_not_controllable(x_start, &controllable[0]);
            return Ok(Parameterization::Infeasible);
        }

        self.observer.started(Computation::Parameterization);
        let n = self.stage_count();
        let deltas = self.deltas().to_vec();
        let g = self.linear_cost(-1., 0.);
        let mut xs = vec![None; n + 1];
        let mut us = vec![None; n];
        let mut aux = vec![None; n];
        xs[0] = Some(x_start);

        let mut session = OracleSession::open(&mut *self.oracle);
        for i in 0..n {
            let (Some(x), Some((next_low, next_high))) = (xs[i], controllable[i + 1].bounds())
            else {
                break;
            };
            let bounds = StageBounds::unbounded()
                .with_x(x, x)
                .with_x_next(next_low, next_high);
            let solution = session.solve_stagewise_optim(i, None, &g, bounds);
            let Some(u) = solution.u() else {
                self.observer.forward_step_failed(i);
                break;
            };
            // the controllable sets guarantee this in exact arithmetic only
            let Some(x_next) = controllable[i + 1].clamp(x + 2. * deltas[i] * u) else {
                break;
            };
            self.observer.forward_step(i, u, x_next);
            us[i] = Some(u);
            xs[i + 1] = Some(x_next);
            aux[i] = solution.aux();
        }
        drop(session);

        Ok(Parameterization::Feasible(VelocityProfile::new(
            xs, us, aux, deltas,
        )))
    }
}

fn interval_of(low: &StageSolution, high: &StageSolution) -> StageInterval {
    match (low.x(), high.x()) {
        (Some(low), Some(high)) => StageInterval::new(low, high),
        _ => StageInterval::Empty,
    }
}

fn check_velocity_bounds(sdmin: f64, sdmax: f64) -> Result<()> {
    if !(sdmin.is_finite() && sdmax.is_finite()) {
        return Err(ReachError::InvalidVelocity(format!(
            "bounds must be finite (got {}, {})",
            sdmin, sdmax
        )));
    }
    if sdmin < 0. {
        return Err(ReachError::InvalidVelocity(format!(
            "path velocity must be non-negative (got {})",
            sdmin
        )));
    }
    if sdmin > sdmax {
        return Err(ReachError::InvalidVelocity(format!(
            "lower bound {} exceeds upper bound {}",
            sdmin, sdmax
        )));
    }
    Ok(())
}
