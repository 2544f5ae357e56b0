//! Functionality for solving the capacity expansion problem for a model.
use crate::model::{ConfigurationError, Model};
use crate::optimisation::{ModelProblem, build_problem};
use crate::output::DataWriter;
use crate::results::ExpansionResults;
use crate::solver::{HighsSolver, SolveError, Solver};
use anyhow::Result;
use log::{Level, info, log_enabled};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// The reasons planning can fail
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// The model could not be turned into a problem
    Configuration(ConfigurationError),
    /// The problem could not be solved to optimality
    Solve(SolveError),
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::Configuration(err) => write!(f, "{err}"),
            PlanningError::Solve(err) => write!(f, "Could not solve model: {err}"),
        }
    }
}

impl Error for PlanningError {}

impl From<ConfigurationError> for PlanningError {
    fn from(err: ConfigurationError) -> Self {
        PlanningError::Configuration(err)
    }
}

impl From<SolveError> for PlanningError {
    fn from(err: SolveError) -> Self {
        PlanningError::Solve(err)
    }
}

/// Find the least-cost capacity mix and dispatch for a model.
///
/// # Arguments
///
/// * `model` - The model
/// * `solver` - The LP solver to use
pub fn solve_model<S: Solver + ?Sized>(
    model: &Model,
    solver: &S,
) -> Result<ExpansionResults, PlanningError> {
    let ModelProblem { problem, variables } = build_problem(model)?;
    let solution = solver.solve(&problem)?;
    let results = ExpansionResults::from_solution(model, &variables, &solution);

    info!("Total system cost: {}", results.system_cost);
    for (id, result) in results.technologies.iter() {
        info!("  {id}: {} MW", result.capacity);
    }
    for (id, result) in results.storage.iter() {
        info!("  {id}: {} MWh of storage", result.capacity);
    }

    Ok(results)
}

/// Run the model and write the results.
///
/// The model is solved with HiGHS, using the solver time limit from the model parameters. Solver
/// output is shown if debug logging is enabled.
///
/// # Arguments
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information to CSV files
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<ExpansionResults> {
    let solver = HighsSolver::new()
        .with_time_limit(model.parameters().solver_time_limit)
        .with_verbose(log_enabled!(Level::Debug));
    let results = solve_model(model, &solver)?;

    let mut writer = DataWriter::create(output_path, debug_model)?;
    writer.write_results(model, &results)?;
    writer.flush()?;

    Ok(results)
}
