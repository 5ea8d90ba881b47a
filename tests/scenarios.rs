use reach_topp::{
    constraints::{
        BoxConstraint, ConicRow, ConicStage, ConicTable, Constraint, ConstraintKind,
        ConstraintParams,
    },
    discretization::Discretization,
    path::{Path, PathDomain},
    solvers::SolverBackend,
    EngineConfig, Parameterization, ReachError, ReachabilityEngine, SilentObserver,
    StageInterval,
};

const GRID: [f64; 4] = [0., 1., 2., 3.];

fn unit_box() -> BoxConstraint {
    BoxConstraint::new(Some((-1., 1.)), Some((0., 4.)))
}

// the same box as unit_box, as cone rows
fn unit_box_cones() -> ConicTable {
    let stage = ConicStage {
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
    };
    ConicTable::new(vec![stage; GRID.len()])
}

fn engine_with(
    constraints: &[&dyn Constraint],
    backend: Option<SolverBackend>,
) -> reach_topp::Result<ReachabilityEngine> {
    ReachabilityEngine::new(
        constraints,
        &PathDomain::new(0., 3.),
        GRID.to_vec(),
        EngineConfig {
            backend,
            ..EngineConfig::default()
        },
        Box::new(SilentObserver),
    )
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

#[test]
fn rest_to_rest_peaks_between_middle_stages() {
    let boxed = unit_box();
    let mut engine = engine_with(&[&boxed], None).expect("valid problem");
    let profile = engine
        .compute_parameterization(0., 0.)
        .expect("valid bounds")
        .into_profile()
        .expect("feasible");

    let sd: Vec<f64> = profile
        .sd()
        .into_iter()
        .map(|v| v.expect("complete profile"))
        .collect();
    assert_eq!(sd.len(), 4);
    assert_eq!(sd[0], 0.);
    assert!(close(sd[3], 0., 1e-9));
    assert!(close(sd[1], sd[2], 1e-9));
    assert!(sd[1] > sd[0] && sd[2] > sd[3]);
    let duration = profile.duration().expect("moving profile");
    // √2 to accelerate, 1/√2 cruising at √2, √2 to brake
    assert!(close(duration, 2. * 2f64.sqrt() + 1. / 2f64.sqrt(), 1e-9));
}

#[test]
fn start_above_stage_bound_is_infeasible() {
    let boxed = unit_box();
    let mut engine = engine_with(&[&boxed], None).expect("valid problem");
    let result = engine
        .compute_parameterization(3., 0.)
        .expect("valid bounds");
    assert_eq!(result, Parameterization::Infeasible);
}

#[test]
fn feasible_sets_equal_stage_bounds() {
    let boxed = unit_box();
    let mut engine = engine_with(&[&boxed], None).expect("valid problem");
    for set in engine.compute_feasible_sets() {
        let (low, high) = set.bounds().expect("feasible stage");
        assert!(close(low, 0., 1e-9));
        assert!(close(high, 4., 1e-9));
    }
}

#[test]
fn conic_backend_matches_qp_backend() {
    let boxed = unit_box();
    let cones = unit_box_cones();
    let mut qp = engine_with(&[&boxed], Some(SolverBackend::Qp)).expect("valid problem");
    let mut conic = engine_with(&[&cones], None).expect("valid problem");

    let k_qp = qp.compute_controllable_sets(0., 0.5).expect("valid bounds");
    let k_conic = conic.compute_controllable_sets(0., 0.5).expect("valid bounds");
    for (a, b) in k_qp.iter().zip(&k_conic) {
        let ((la, ha), (lb, hb)) = (a.bounds().expect("qp set"), b.bounds().expect("conic set"));
        assert!(close(la, lb, 1e-6) && close(ha, hb, 1e-6), "{:?} != {:?}", a, b);
    }

    let sd_qp = qp
        .compute_parameterization(0., 0.)
        .expect("valid bounds")
        .into_profile()
        .expect("feasible")
        .sd();
    let sd_conic = conic
        .compute_parameterization(0., 0.)
        .expect("valid bounds")
        .into_profile()
        .expect("feasible")
        .sd();
    for (a, b) in sd_qp.iter().zip(&sd_conic) {
        assert!(close(a.expect("qp entry"), b.expect("conic entry"), 1e-4));
    }
}

#[test]
fn conic_constraints_refuse_qp_backend() {
    let cones = unit_box_cones();
    let err = engine_with(&[&cones], Some(SolverBackend::Qp)).err();
    assert_eq!(err, Some(ReachError::ConicUnsupported(SolverBackend::Qp)));
}

#[test]
fn grid_must_match_path_interval() {
    let boxed = unit_box();
    let err = ReachabilityEngine::new(
        &[&boxed],
        &PathDomain::new(0., 4.),
        GRID.to_vec(),
        EngineConfig::default(),
        Box::new(SilentObserver),
    )
    .err();
    assert!(matches!(err, Some(ReachError::GridPathMismatch { .. })));
}

#[test]
fn short_parameter_table_is_rejected() {
    let short = ConicTable::new(vec![ConicStage::default(); 2]);
    let err = engine_with(&[&short], None).err();
    assert_eq!(
        err,
        Some(ReachError::ParamStageMismatch {
            expected: 4,
            got: 2
        })
    );
}

#[test]
fn reachable_and_controllable_sets_agree_on_rest_to_rest() {
    let boxed = unit_box();
    let mut engine = engine_with(&[&boxed], None).expect("valid problem");
    let reachable = engine.compute_reachable_sets(0., 0.).expect("valid bounds");
    let controllable = engine.compute_controllable_sets(0., 0.).expect("valid bounds");
    // a rest-to-rest profile only visits states both reachable and controllable
    let profile = engine
        .compute_parameterization(0., 0.)
        .expect("valid bounds")
        .into_profile()
        .expect("feasible");
    for (i, x) in profile.squared_velocities().iter().enumerate() {
        let x = x.expect("complete profile");
        assert!(reachable[i].contains(x, 1e-9));
        assert!(controllable[i].contains(x, 1e-9));
    }
    assert_eq!(reachable[0], StageInterval::new(0., 0.));
}

/// Box constraint that also declares one slack variable per stage.
struct SlackedBox(BoxConstraint);

impl Constraint for SlackedBox {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CanonicalLinear
    }

    fn extra_var_count(&self) -> usize {
        1
    }

    fn compute_params(&self, path: &dyn Path, grid: &Discretization) -> ConstraintParams {
        self.0.compute_params(path, grid)
    }
}

#[test]
fn built_in_backends_refuse_extra_variables() {
    let slacked = SlackedBox(unit_box());
    let err = engine_with(&[&slacked], None).err();
    assert_eq!(
        err,
        Some(ReachError::ExtraVariablesUnsupported {
            backend: SolverBackend::Qp,
            extra: 1
        })
    );
}
