use std::{env, error::Error, fs};

use reach_topp::{
    constraints::{BoxConstraint, ConicTable, Constraint, LinearTable},
    discretization::Discretization,
    path::PathDomain,
    EngineConfig, ReachabilityEngine, TracingObserver,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_STAGES: usize = 100;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ConstraintSpec {
    Box(BoxConstraint),
    Linear(LinearTable),
    Conic(ConicTable),
}

impl ConstraintSpec {
    fn as_constraint(&self) -> &dyn Constraint {
        match self {
            Self::Box(c) => c,
            Self::Linear(c) => c,
            Self::Conic(c) => c,
        }
    }
}

#[derive(Deserialize)]
struct Problem {
    path: PathDomain,
    gridpoints: Option<Vec<f64>>,
    stages: Option<usize>,
    constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    sd_start: f64,
    #[serde(default)]
    sd_end: f64,
    #[serde(default)]
    config: EngineConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let problem_path = env::args()
        .nth(1)
        .ok_or("usage: parameterize <problem.json>")?;
    let problem: Problem = serde_json::from_str(&fs::read_to_string(&problem_path)?)?;

    let gridpoints = match problem.gridpoints {
        Some(gridpoints) => gridpoints,
        None => Discretization::uniform(&problem.path, problem.stages.unwrap_or(DEFAULT_STAGES))?
            .gridpoints()
            .to_vec(),
    };
    let constraints: Vec<&dyn Constraint> = problem
        .constraints
        .iter()
        .map(ConstraintSpec::as_constraint)
        .collect();

    let mut engine = ReachabilityEngine::new(
        &constraints,
        &problem.path,
        gridpoints,
        problem.config,
        Box::new(TracingObserver),
    )?;
    let parameterization = engine.compute_parameterization(problem.sd_start, problem.sd_end)?;

    let report = match parameterization.profile() {
        Some(profile) => {
            info!(
                "parameterized {} stages, duration {:?}",
                engine.stage_count(),
                profile.duration()
            );
            json!({
                "sd": profile.sd(),
                "sdd": profile.sdd(),
                "t": profile.time_stamps(),
                "duration": profile.duration(),
            })
        }
        None => serde_json::Value::Null,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
