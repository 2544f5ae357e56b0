//! The interface between the capacity expansion problem and LP solvers.
//!
//! A [`Solver`] takes a solver-agnostic [`Problem`] and returns the optimal column values, so
//! swapping backends needs no change to the problem builder or the result extraction.
use crate::optimisation::{Problem, Variable};
use std::error::Error;
use std::fmt;

pub mod highs;
pub use highs::HighsSolver;

/// Something which can solve a linear programme to optimality
pub trait Solver {
    /// Solve the problem, returning the optimal solution or the reason none was found
    fn solve(&self, problem: &Problem) -> Result<Solution, SolveError>;
}

/// An optimal solution to a [`Problem`]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    objective_value: f64,
    columns: Vec<f64>,
}

impl Solution {
    /// Create a new [`Solution`] from the objective value and one value per column
    pub fn new(objective_value: f64, columns: Vec<f64>) -> Self {
        Self {
            objective_value,
            columns,
        }
    }

    /// The value of the objective function at the optimum
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Values for every column, in column order
    pub fn columns(&self) -> &[f64] {
        &self.columns
    }

    /// The value of a single variable
    pub fn value(&self, var: Variable) -> f64 {
        self.columns[var.index()]
    }
}

/// The reasons a solver can fail to return an optimal solution
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// No assignment satisfies all constraints
    Infeasible,
    /// The objective can be improved without limit
    Unbounded,
    /// The solver failed for another reason (e.g. numerical trouble or a time limit)
    SolverError(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Infeasible => write!(f, "The problem is infeasible"),
            SolveError::Unbounded => write!(f, "The problem is unbounded"),
            SolveError::SolverError(msg) => write!(f, "Solver failed: {msg}"),
        }
    }
}

impl Error for SolveError {}
