use tracing::debug;

use crate::{
    constraints::{self, Constraint, ConstraintParams},
    discretization::Discretization,
    error::{ReachError, Result},
    path::Path,
};

/// Grid and cached constraint parameters shared by every solve of an oracle.
#[derive(Debug, Clone)]
pub struct StageData {
    grid: Discretization,
    params: Vec<ConstraintParams>,
    extra_vars: usize,
    has_conic: bool,
}

impl StageData {
    /// Asks every constraint for its parameters over `grid`, once.
    pub fn new(
        constraints: &[&dyn Constraint],
        path: &dyn Path,
        grid: Discretization,
    ) -> Result<Self> {
        let expected = grid.stage_count() + 1;
        let params = constraints
            .iter()
            .map(|c| {
                let params = c.compute_params(path, &grid);
                if params.len() == expected {
                    Ok(params)
                } else {
                    Err(ReachError::ParamStageMismatch {
                        expected,
                        got: params.len(),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let extra_vars = constraints.iter().map(|c| c.extra_var_count()).sum();
        debug!(
            "computed parameters of {} constraints over {} grid points",
            params.len(),
            expected
        );
        Ok(Self {
            grid,
            params,
            extra_vars,
            has_conic: constraints::has_conic(constraints),
        })
    }

    pub fn grid(&self) -> &Discretization {
        &self.grid
    }

    pub fn params(&self) -> &[ConstraintParams] {
        &self.params
    }

    pub fn stage_count(&self) -> usize {
        self.grid.stage_count()
    }

    pub fn extra_var_count(&self) -> usize {
        self.extra_vars
    }

    pub fn variable_count(&self) -> usize {
        2 + self.extra_vars
    }

    pub fn has_conic(&self) -> bool {
        self.has_conic
    }

    /// `delta_i`, absent at the last grid point.
    pub fn delta(&self, i: usize) -> Option<f64> {
        self.grid.deltas().get(i).copied()
    }
}
