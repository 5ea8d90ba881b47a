use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{
    planar::{self, PlanarObjective},
    StageBounds, StageData, StageOracle, StageSolution,
};

/// Solve counters of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct SessionStats {
    pub solves: usize,
    pub empty: usize,
}

impl SessionStats {
    pub fn record(&mut self, solution: &StageSolution) {
        self.solves += 1;
        if solution.is_empty() {
            self.empty += 1;
        }
    }
}

/// Planar QP oracle for canonical linear constraint sets.
pub struct QpOracle {
    data: StageData,
    session: Option<SessionStats>,
}

impl QpOracle {
    pub fn new(data: StageData) -> Self {
        Self {
            data,
            session: None,
        }
    }
}

impl StageOracle for QpOracle {
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
            warn!("qp session opened twice, previous counters dropped");
        }
        self.session = Some(SessionStats::default());
    }

    fn close_session(&mut self) {
        if let Some(stats) = self.session.take() {
            debug!(
                "qp session closed after {} solves ({} empty)",
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
        let solution = match planar::minimize(&rows, &objective) {
            Some(z) => StageSolution::Optimal(DVector::from_vec(vec![z.x, z.y])),
            None => StageSolution::Empty,
        };
        if let Some(stats) = self.session.as_mut() {
            stats.record(&solution);
        }
        solution
    }
}
