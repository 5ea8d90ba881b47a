use nalgebra::{DMatrix, DVector, Vector2};
use tracing::{debug, warn};

use crate::constraints::{ConicRow, ConstraintParams};

use super::{
    planar::{self, HalfPlane, PlanarObjective},
    qp::SessionStats,
    StageBounds, StageData, StageOracle, StageSolution,
};

const MAX_CUTS: usize = 200;
const CONE_TOL: f64 = 1e-8;

/// Conic oracle: Kelley cutting planes on top of the planar QP.
///
/// Every iterate violating a cone row adds the row's supporting half-plane at
/// that iterate. Running out of cuts is reported as [`StageSolution::Empty`].
pub struct ConicOracle {
    data: StageData,
    session: Option<SessionStats>,
}

impl ConicOracle {
    pub fn new(data: StageData) -> Self {
        Self {
            data,
            session: None,
        }
    }

    fn cones(&self, i: usize) -> Vec<&ConicRow> {
        self.data
            .params()
            .iter()
            .filter_map(|params| match params {
                ConstraintParams::Conic(stages) => stages.get(i),
                ConstraintParams::Linear(_) => None,
            })
            .flat_map(|stage| stage.rows.iter())
            .collect()
    }

    fn cut_loop(
        &self,
        mut rows: Vec<HalfPlane>,
        cones: &[&ConicRow],
        objective: &PlanarObjective,
    ) -> Option<Vector2<f64>> {
        for _ in 0..MAX_CUTS {
            let z = planar::minimize(&rows, objective)?;
            let mut satisfied = true;
            for cone in cones {
                let value = cone.value(z.x, z.y);
                if value <= CONE_TOL * (1. + cone.c.abs()) {
                    continue;
                }
                satisfied = false;
                let (gu, gx) = cone.subgradient(z.x, z.y);
                // value + gu·(u - u0) + gx·(x - x0) <= 0
                rows.push(HalfPlane::new(gu, gx, gu * z.x + gx * z.y - value));
            }
            if satisfied {
                return Some(z);
            }
        }
        warn!("conic stage solve did not converge after {} cuts", MAX_CUTS);
        None
    }
}

impl StageOracle for ConicOracle {
    fn stage_count(&self) -> usize {
        self.data.stage_count()
    }

    fn variable_count(&self) -> usize {
        self.data.variable_count()
    }

    fn deltas(&self) -> &[f64] {
        self.data.grid().deltas()
    }

    fn setup_session(&mut self) {
        if self.session.is_some() {
            warn!("conic session opened twice, previous counters dropped");
        }
        self.session = Some(SessionStats::default());
    }

    fn close_session(&mut self) {
        if let Some(stats) = self.session.take() {
            debug!(
                "conic session closed after {} solves ({} empty)",
                stats.solves, stats.empty
            );
        }
    }

    fn solve_stagewise_optim(
        &mut self,
        i: usize,
        h: Option<&DMatrix<f64>>,
        g: &DVector<f64>,
        bounds: StageBounds,
    ) -> StageSolution {
        let rows = planar::stage_rows(&self.data, i, bounds);
        let objective = PlanarObjective::from_stage(h, g);
        let cones = self.cones(i);
        let solution = match self.cut_loop(rows, &cones, &objective) {
            Some(z) => StageSolution::Optimal(DVector::from_vec(vec![z.x, z.y])),
            None => StageSolution::Empty,
        };
        if let Some(stats) = self.session.as_mut() {
            stats.record(&solution);
        }
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constraints::{ConicStage, ConicTable, Constraint},
        discretization::Discretization,
        path::PathDomain,
    };

    // |u| <= 1 and |x - 2| <= 2 written as cones
    fn boxed_cones() -> ConicStage {
        ConicStage {
            rows: vec![
                ConicRow {
                    a: 0.,
                    b: 0.,
                    c: -1.,
                    p: vec![[1., 0., 0.]],
                },
                ConicRow {
                    a: 0.,
                    b: 0.,
                    c: -2.,
                    p: vec![[0., 1., -2.]],
                },
            ],
        }
    }

    fn oracle(table: &ConicTable) -> ConicOracle {
        let path = PathDomain::new(0., 2.);
        let grid = Discretization::new(&path, vec![0., 1., 2.]).expect("valid grid");
        let constraints: [&dyn Constraint; 1] = [table];
        ConicOracle::new(StageData::new(&constraints, &path, grid).expect("valid params"))
    }

    #[test]
    fn polyhedral_cones_match_their_box() {
        let mut conic = oracle(&ConicTable::new(vec![boxed_cones(); 3]));
        let g = DVector::from_vec(vec![0., -1.]);
        let high = conic.solve_stagewise_optim(0, None, &g, StageBounds::unbounded());
        let x = high.x().expect("feasible");
        assert!((x - 4.).abs() < 1e-6);
    }

    #[test]
    fn curved_cone_converges() {
        // u² + x² <= 1, maximize x + u: optimum at (1/√2, 1/√2)
        let disc = ConicStage {
            rows: vec![ConicRow {
                a: 0.,
                b: 0.,
                c: -1.,
                p: vec![[1., 0., 0.], [0., 1., 0.]],
            }],
        };
        let mut conic = oracle(&ConicTable::new(vec![disc; 3]));
        let g = DVector::from_vec(vec![-1., -1.]);
        let z = conic.solve_stagewise_optim(2, None, &g, StageBounds::unbounded());
        let (u, x) = (z.u().expect("feasible"), z.x().expect("feasible"));
        assert!((u + x - std::f64::consts::SQRT_2).abs() < 1e-6);
        assert!((u - x).abs() < 1e-2);
    }

    #[test]
    fn empty_cone_intersection_is_empty() {
        let mut conic = oracle(&ConicTable::new(vec![boxed_cones(); 3]));
        let g = DVector::from_vec(vec![0., 1.]);
        let bounds = StageBounds::unbounded().with_x(5., 6.);
        assert!(conic.solve_stagewise_optim(1, None, &g, bounds).is_empty());
    }
}
