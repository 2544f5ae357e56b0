//! A [`Solver`] backed by the HiGHS LP solver.
use super::{SolveError, Solution, Solver};
use crate::optimisation::{Problem, Sense};
use highs::{HighsModelStatus, RowProblem};
use log::{debug, warn};

/// Solves problems with HiGHS
#[derive(Debug, Clone, Default)]
pub struct HighsSolver {
    time_limit: Option<f64>,
    verbose: bool,
}

impl HighsSolver {
    /// Create a solver with no time limit and HiGHS output disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a time limit in seconds, after which solving fails
    pub fn with_time_limit(mut self, time_limit: Option<f64>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Whether to let HiGHS print its own log to the console
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Translate `problem` into a HiGHS model ready to be solved
    fn to_highs_model(&self, problem: &Problem, presolve: bool) -> highs::Model {
        let mut highs_problem = RowProblem::default();
        let cols: Vec<_> = problem
            .columns()
            .iter()
            .map(|column| highs_problem.add_column(column.cost, column.bounds.clone()))
            .collect();

        for constraint in problem.constraints() {
            let factors: Vec<_> = constraint
                .expr
                .iter_terms()
                .map(|(var, coeff)| (cols[var.index()], coeff))
                .collect();
            highs_problem.add_row(constraint.row_limits(), factors);
        }

        let sense = match problem.sense() {
            Sense::Minimise => highs::Sense::Minimise,
            Sense::Maximise => highs::Sense::Maximise,
        };
        let mut model = highs_problem.optimise(sense);
        model.set_option("output_flag", self.verbose);
        if self.verbose {
            model.set_option("log_to_console", true);
        }
        if let Some(time_limit) = self.time_limit {
            model.set_option("time_limit", time_limit);
        }
        if !presolve {
            model.set_option("presolve", "off");
        }

        model
    }

    /// Run HiGHS once on `problem`
    fn run(&self, problem: &Problem, presolve: bool) -> Result<highs::SolvedModel, SolveError> {
        self.to_highs_model(problem, presolve)
            .try_solve()
            .map_err(|status| SolveError::SolverError(format!("Incoherent model: {status:?}")))
    }
}

impl Solver for HighsSolver {
    fn solve(&self, problem: &Problem) -> Result<Solution, SolveError> {
        debug!(
            "Solving problem with HiGHS ({} columns, {} rows)",
            problem.num_columns(),
            problem.num_constraints()
        );

        let mut solved = self.run(problem, true)?;
        if solved.status() == HighsModelStatus::UnboundedOrInfeasible {
            // Presolve can't always tell these apart, but the simplex solver can
            warn!("Problem is unbounded or infeasible; re-solving without presolve");
            solved = self.run(problem, false)?;
        }

        match solved.status() {
            HighsModelStatus::Optimal => {
                let columns = solved.get_solution().columns().to_vec();
                Ok(Solution::new(problem.objective_value(&columns), columns))
            }
            HighsModelStatus::Infeasible => Err(SolveError::Infeasible),
            HighsModelStatus::Unbounded => Err(SolveError::Unbounded),
            HighsModelStatus::ReachedTimeLimit => Err(SolveError::SolverError(
                "Time limit reached before an optimal solution was found".into(),
            )),
            status => Err(SolveError::SolverError(format!(
                "Could not find optimal result: {status:?}"
            ))),
        }
    }
}
