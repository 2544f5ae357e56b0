//! A solver-agnostic description of a linear programme.
//!
//! Columns (decision variables) and constraints are stored explicitly, so any LP backend can
//! consume the problem without knowing how it was built.
use indexmap::IndexMap;
use std::fmt;
use std::ops::RangeInclusive;
use strum::{Display, EnumIter};

/// A reference to a column of a [`Problem`].
///
/// This type does **not** include the value of the variable; it is an index into the problem's
/// column list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// The position of the column in the problem
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether the objective is minimised or maximised
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    /// Minimise the objective
    Minimise,
    /// Maximise the objective
    Maximise,
}

/// A decision variable of the problem
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// A unique, human-readable name
    pub name: String,
    /// Lower and upper bounds (may be infinite)
    pub bounds: RangeInclusive<f64>,
    /// Coefficient in the objective function
    pub cost: f64,
}

/// A linear expression: a sum of coefficient-weighted variables plus a constant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearExpr {
    terms: IndexMap<Variable, f64>,
    constant: f64,
}

impl LinearExpr {
    /// Create an empty expression (equal to zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expression from `(variable, coefficient)` terms
    pub fn from_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let mut expr = Self::new();
        for (var, coeff) in terms {
            expr.add_term(var, coeff);
        }
        expr
    }

    /// Add `coeff * var` to the expression, merging with any existing term for `var`
    pub fn add_term(&mut self, var: Variable, coeff: f64) -> &mut Self {
        *self.terms.entry(var).or_insert(0.0) += coeff;
        self
    }

    /// Add a term and return the expression (for chaining)
    pub fn with_term(mut self, var: Variable, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Add a constant to the expression
    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// The constant part of the expression
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Iterate over the terms with a non-zero coefficient
    pub fn iter_terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms
            .iter()
            .filter(|(_, coeff)| **coeff != 0.0)
            .map(|(var, coeff)| (*var, *coeff))
    }

    /// Evaluate the expression for the given column values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.iter_terms()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

/// The permitted values of a constraint's expression
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowBound {
    /// The expression must equal the value
    Equal(f64),
    /// The expression must be less than or equal to the value
    AtMost(f64),
    /// The expression must be greater than or equal to the value
    AtLeast(f64),
}

impl RowBound {
    /// Lower and upper limits for the expression
    pub fn limits(self) -> RangeInclusive<f64> {
        match self {
            Self::Equal(value) => value..=value,
            Self::AtMost(value) => f64::NEG_INFINITY..=value,
            Self::AtLeast(value) => value..=f64::INFINITY,
        }
    }

    /// By how much `value` lies outside the bound (zero if within it)
    pub fn violation(self, value: f64) -> f64 {
        let limits = self.limits();
        if value < *limits.start() {
            limits.start() - value
        } else if value > *limits.end() {
            value - limits.end()
        } else {
            0.0
        }
    }
}

/// The families of constraints in the capacity expansion model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintFamily {
    /// Definition of the total system cost
    Objective,
    /// Investment cost accounting per technology
    InvestmentCost,
    /// Variable cost accounting per technology
    VariableCost,
    /// Generation limited by capacity, capacity factor and availability
    GenerationCapacity,
    /// Storage cost accounting per storage technology
    StorageCost,
    /// Supply equals demand in every hour
    DemandBalance,
    /// Emissions accounting per technology
    Emissions,
    /// Emission cost accounting per technology
    EmissionCost,
    /// Storage level continuity between hours
    StorageContinuity,
    /// Storage level limited by installed storage capacity
    StorageCapacity,
}

/// A single constraint of the problem
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// The family this constraint belongs to
    pub family: ConstraintFamily,
    /// A unique, human-readable name
    pub name: String,
    /// The constrained expression
    pub expr: LinearExpr,
    /// The bound applied to `expr`
    pub bound: RowBound,
}

impl Constraint {
    /// The lower and upper limits on the variable part of the expression.
    ///
    /// The expression's constant is moved to the right-hand side, which is the form LP solvers
    /// expect.
    pub fn row_limits(&self) -> RangeInclusive<f64> {
        let limits = self.bound.limits();
        let constant = self.expr.constant();
        (limits.start() - constant)..=(limits.end() - constant)
    }
}

/// A constraint or column bound that a set of values fails to satisfy
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    /// The name of the violated constraint or column
    pub name: String,
    /// The amount by which the bound is exceeded
    pub amount: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (violated by {})", self.name, self.amount)
    }
}

/// A linear programme
#[derive(Clone, Debug)]
pub struct Problem {
    sense: Sense,
    columns: Vec<Column>,
    constraints: Vec<Constraint>,
}

impl Problem {
    /// Create an empty problem with the given objective sense
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a column with the given bounds and a zero objective coefficient
    pub fn add_variable<S: Into<String>>(
        &mut self,
        name: S,
        bounds: RangeInclusive<f64>,
    ) -> Variable {
        self.add_column(name, bounds, 0.0)
    }

    /// Add a column with the given bounds and objective coefficient
    pub fn add_column<S: Into<String>>(
        &mut self,
        name: S,
        bounds: RangeInclusive<f64>,
        cost: f64,
    ) -> Variable {
        self.columns.push(Column {
            name: name.into(),
            bounds,
            cost,
        });
        Variable(self.columns.len() - 1)
    }

    /// Add a constraint `expr` within `bound`
    pub fn add_constraint<S: Into<String>>(
        &mut self,
        family: ConstraintFamily,
        name: S,
        expr: LinearExpr,
        bound: RowBound,
    ) {
        self.constraints.push(Constraint {
            family,
            name: name.into(),
            expr,
            bound,
        });
    }

    /// The objective sense
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The problem's columns, in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get the column for the given variable
    pub fn column(&self, var: Variable) -> &Column {
        &self.columns[var.index()]
    }

    /// The problem's constraints, in order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// The number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Iterate over the constraints belonging to the given family
    pub fn iter_family(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    /// Evaluate the objective function for the given column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.columns
            .iter()
            .zip(values)
            .map(|(column, value)| column.cost * value)
            .sum()
    }

    /// Find all column bounds and constraints violated by `values` by more than `tolerance`.
    ///
    /// # Arguments
    ///
    /// * `values` - One value per column, in column order
    /// * `tolerance` - Absolute tolerance for each bound
    pub fn find_violations(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "Number of values does not match number of columns"
        );

        let column_violations = self.columns.iter().zip(values).filter_map(|(column, value)| {
            let amount = if value < column.bounds.start() {
                column.bounds.start() - value
            } else if value > column.bounds.end() {
                value - column.bounds.end()
            } else {
                0.0
            };
            (amount > tolerance).then(|| Violation {
                name: column.name.clone(),
                amount,
            })
        });

        let constraint_violations = self.constraints.iter().filter_map(|constraint| {
            let amount = constraint.bound.violation(constraint.expr.evaluate(values));
            (amount > tolerance).then(|| Violation {
                name: constraint.name.clone(),
                amount,
            })
        });

        column_violations.chain(constraint_violations).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_linear_expr_merges_terms() {
        let mut problem = Problem::new(Sense::Minimise);
        let x = problem.add_variable("x", 0.0..=f64::INFINITY);
        let y = problem.add_variable("y", 0.0..=f64::INFINITY);

        let mut expr = LinearExpr::from_terms([(x, 1.0), (y, 2.0), (x, -1.0)]);
        expr.add_constant(3.0);

        assert_eq!(expr.iter_terms().collect::<Vec<_>>(), [(y, 2.0)]);
        assert_eq!(expr.evaluate(&[10.0, 4.0]), 11.0);
    }

    #[rstest]
    #[case(RowBound::Equal(5.0), 5.0, 0.0)]
    #[case(RowBound::Equal(5.0), 4.0, 1.0)]
    #[case(RowBound::AtMost(5.0), 7.0, 2.0)]
    #[case(RowBound::AtMost(5.0), -100.0, 0.0)]
    #[case(RowBound::AtLeast(5.0), 2.0, 3.0)]
    #[case(RowBound::AtLeast(5.0), 100.0, 0.0)]
    fn test_row_bound_violation(
        #[case] bound: RowBound,
        #[case] value: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(bound.violation(value), expected);
    }

    #[test]
    fn test_row_limits_move_constant() {
        let mut problem = Problem::new(Sense::Minimise);
        let x = problem.add_variable("x", 0.0..=f64::INFINITY);
        let mut expr = LinearExpr::new().with_term(x, 1.0);
        expr.add_constant(2.0);
        problem.add_constraint(
            ConstraintFamily::DemandBalance,
            "balance",
            expr,
            RowBound::Equal(10.0),
        );

        assert_eq!(problem.constraints()[0].row_limits(), 8.0..=8.0);
    }

    #[test]
    fn test_find_violations() {
        let mut problem = Problem::new(Sense::Minimise);
        let x = problem.add_column("x", 0.0..=f64::INFINITY, 1.0);
        let y = problem.add_variable("y", 0.0..=5.0);
        problem.add_constraint(
            ConstraintFamily::StorageCapacity,
            "y_le_x",
            LinearExpr::from_terms([(y, 1.0), (x, -1.0)]),
            RowBound::AtMost(0.0),
        );

        assert!(problem.find_violations(&[3.0, 3.0], 1e-9).is_empty());
        assert_eq!(problem.objective_value(&[3.0, 3.0]), 3.0);

        let violations = problem.find_violations(&[1.0, 6.0], 1e-9);
        let names: Vec<_> = violations.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["y", "y_le_x"]);
    }
}
