//! Convex quadratic programs in the `(u, x)` plane.
//!
//! With two variables the optimum lies on a vertex of the feasible polygon,
//! on the relative interior of an edge, or at the unconstrained minimizer, so
//! enumerating those candidates and keeping the best feasible one is exact.
//! The polygon is closed by a finite box so it is always bounded.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use crate::{constraints::ConstraintParams, INFTY};

use super::{StageBounds, StageData};

const FEASIBILITY_TOL: f64 = 1e-9;
const PARALLEL_TOL: f64 = 1e-12;

/// `alpha·u + beta·x <= gamma`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfPlane {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl HalfPlane {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.alpha, self.beta)
    }

    /// Same half-plane with a unit normal, `None` for a constant row.
    fn normalized(&self) -> Option<Self> {
        let norm = self.normal().norm();
        (norm > PARALLEL_TOL)
            .then(|| Self::new(self.alpha / norm, self.beta / norm, self.gamma / norm))
    }

    fn satisfied_by(&self, z: &Vector2<f64>) -> bool {
        let lhs = self.normal().dot(z);
        let scale = 1f64.max(self.gamma.abs()).max(lhs.abs());
        lhs - self.gamma <= FEASIBILITY_TOL * scale
    }
}

/// `0.5·zᵀqz + gᵀz` restricted to `z = (u, x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarObjective {
    pub q: Matrix2<f64>,
    pub g: Vector2<f64>,
}

impl PlanarObjective {
    pub fn linear(g_u: f64, g_x: f64) -> Self {
        Self {
            q: Matrix2::zeros(),
            g: Vector2::new(g_u, g_x),
        }
    }

    /// Leading `(u, x)` block of a full stage objective.
    pub fn from_stage(h: Option<&DMatrix<f64>>, g: &DVector<f64>) -> Self {
        let q = h
            .map(|h| Matrix2::new(h[(0, 0)], h[(0, 1)], h[(1, 0)], h[(1, 1)]))
            .unwrap_or_else(Matrix2::zeros);
        Self {
            q,
            g: Vector2::new(g[0], g[1]),
        }
    }

    pub fn value(&self, z: &Vector2<f64>) -> f64 {
        0.5 * z.dot(&(self.q * z)) + self.g.dot(z)
    }
}

/// Half-planes of stage `i`: canonical linear rows, direct bounds, the call's
/// bounds and the closing box. Cone rows are left to the caller.
pub fn stage_rows(data: &StageData, i: usize, bounds: StageBounds) -> Vec<HalfPlane> {
    let mut rows = vec![
        HalfPlane::new(1., 0., INFTY),
        HalfPlane::new(-1., 0., INFTY),
        HalfPlane::new(0., 1., INFTY),
        HalfPlane::new(0., -1., INFTY),
    ];
    for params in data.params() {
        let ConstraintParams::Linear(stages) = params else {
            continue;
        };
        let Some(stage) = stages.get(i) else {
            continue;
        };
        rows.extend(stage.rows().map(|(a, b, c)| HalfPlane::new(a, b, -c)));
        if let Some((lo, hi)) = stage.u_bounds {
            rows.push(HalfPlane::new(1., 0., hi));
            rows.push(HalfPlane::new(-1., 0., -lo));
        }
        if let Some((lo, hi)) = stage.x_bounds {
            rows.push(HalfPlane::new(0., 1., hi));
            rows.push(HalfPlane::new(0., -1., -lo));
        }
    }
    if let Some(hi) = bounds.x_max {
        rows.push(HalfPlane::new(0., 1., hi));
    }
    if let Some(lo) = bounds.x_min {
        rows.push(HalfPlane::new(0., -1., -lo));
    }
    if let Some(delta) = data.delta(i) {
        if let Some(hi) = bounds.x_next_max {
            rows.push(HalfPlane::new(2. * delta, 1., hi));
        }
        if let Some(lo) = bounds.x_next_min {
            rows.push(HalfPlane::new(-2. * delta, -1., -lo));
        }
    }
    rows
}

struct Incumbent<'a> {
    rows: &'a [HalfPlane],
    objective: &'a PlanarObjective,
    best: Option<(f64, Vector2<f64>)>,
}

impl Incumbent<'_> {
    fn offer(&mut self, z: Vector2<f64>) {
        if !z.iter().all(|v| v.is_finite()) || !self.rows.iter().all(|r| r.satisfied_by(&z)) {
            return;
        }
        let value = self.objective.value(&z);
        if self.best.map_or(true, |(best, _)| value < best) {
            self.best = Some((value, z));
        }
    }
}

/// Minimizes `objective` over the intersection of `rows`, `None` when empty.
pub fn minimize(rows: &[HalfPlane], objective: &PlanarObjective) -> Option<Vector2<f64>> {
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        match row.normalized() {
            Some(line) => lines.push(line),
            // constant row `0 <= gamma`
            None if row.gamma < -FEASIBILITY_TOL * 1f64.max(row.gamma.abs()) => return None,
            None => {}
        }
    }

    let mut incumbent = Incumbent {
        rows: &lines,
        objective,
        best: None,
    };

    if let Some(chol) = objective.q.cholesky() {
        incumbent.offer(chol.solve(&-objective.g));
    }

    for line in &lines {
        let direction = Vector2::new(-line.beta, line.alpha);
        let curvature = direction.dot(&(objective.q * direction));
        if curvature > PARALLEL_TOL {
            let foot = line.normal() * line.gamma;
            let t = -direction.dot(&(objective.q * foot + objective.g)) / curvature;
            incumbent.offer(foot + direction * t);
        }
    }

    for (j, first) in lines.iter().enumerate() {
        for second in &lines[j + 1..] {
            let det = first.alpha * second.beta - first.beta * second.alpha;
            if det.abs() < PARALLEL_TOL {
                continue;
            }
            let u = (first.gamma * second.beta - first.beta * second.gamma) / det;
            let x = (first.alpha * second.gamma - first.gamma * second.alpha) / det;
            incumbent.offer(Vector2::new(u, x));
        }
    }

    incumbent.best.map(|(_, z)| z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Vec<HalfPlane> {
        vec![
            HalfPlane::new(1., 0., 1.),
            HalfPlane::new(-1., 0., 1.),
            HalfPlane::new(0., 1., 1.),
            HalfPlane::new(0., -1., 1.),
        ]
    }

    fn close(a: Vector2<f64>, b: Vector2<f64>) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn linear_objective_lands_on_a_vertex() {
        let z = minimize(&unit_box(), &PlanarObjective::linear(-1., -2.)).expect("feasible");
        assert!(close(z, Vector2::new(1., 1.)));
    }

    #[test]
    fn strictly_convex_objective_uses_interior_minimizer() {
        let objective = PlanarObjective {
            q: Matrix2::identity(),
            g: Vector2::new(-0.25, 0.5),
        };
        let z = minimize(&unit_box(), &objective).expect("feasible");
        assert!(close(z, Vector2::new(0.25, -0.5)));
    }

    #[test]
    fn convex_objective_projects_onto_an_edge() {
        // minimizer (3, 0) lies outside, the optimum is on u = 1
        let objective = PlanarObjective {
            q: Matrix2::identity(),
            g: Vector2::new(-3., 0.),
        };
        let z = minimize(&unit_box(), &objective).expect("feasible");
        assert!(close(z, Vector2::new(1., 0.)));
    }

    #[test]
    fn contradictory_rows_are_empty() {
        let mut rows = unit_box();
        rows.push(HalfPlane::new(0., -1., -2.));
        assert_eq!(minimize(&rows, &PlanarObjective::linear(0., 1.)), None);
    }

    #[test]
    fn violated_constant_row_is_empty() {
        let mut rows = unit_box();
        rows.push(HalfPlane::new(0., 0., -1.));
        assert_eq!(minimize(&rows, &PlanarObjective::linear(0., 1.)), None);
    }

    #[test]
    fn pinned_state_keeps_exact_value() {
        let mut rows = unit_box();
        rows.push(HalfPlane::new(0., 1., 0.3));
        rows.push(HalfPlane::new(0., -1., -0.3));
        let z = minimize(&rows, &PlanarObjective::linear(-1., 0.)).expect("feasible");
        assert!(close(z, Vector2::new(1., 0.3)));
    }
}
