//! Code for building the capacity expansion optimisation problem.
//!
//! The problem jointly chooses installed generation and storage capacity together with hourly
//! dispatch, minimising total annual system cost. It is built as a solver-agnostic [`Problem`],
//! which is then handed to a [`crate::solver::Solver`].
use crate::model::{ConfigurationError, Model};
use crate::results::ExpansionResults;
use crate::technology::{StorageID, TechnologyID};
use crate::time_index::HourID;
use indexmap::IndexMap;
use itertools::iproduct;
use log::debug;
use strum::IntoEnumIterator;

pub mod constraints;
use constraints::add_model_constraints;
pub mod problem;
pub use problem::{ConstraintFamily, LinearExpr, Problem, RowBound, Sense, Variable};

/// Variables indexed by technology
type TechnologyVariableMap = IndexMap<TechnologyID, Variable>;

/// Variables indexed by storage technology
type StorageVariableMap = IndexMap<StorageID, Variable>;

/// Variables indexed by hour and technology
type GenerationVariableMap = IndexMap<(HourID, TechnologyID), Variable>;

/// Variables indexed by hour and storage technology
type StorageDispatchVariableMap = IndexMap<(HourID, StorageID), Variable>;

/// Bounds for non-negative variables
const NON_NEGATIVE: std::ops::RangeInclusive<f64> = 0.0..=f64::INFINITY;

/// Bounds for free variables
const FREE: std::ops::RangeInclusive<f64> = f64::NEG_INFINITY..=f64::INFINITY;

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]).
///
/// We use this data structure for two things:
///
/// 1. In order define constraints for the optimisation
/// 2. To keep track of the combination of parameters that each variable corresponds to, for when we
///    are reading the results of the optimisation.
#[derive(Debug)]
pub struct VariableMap {
    capacity_vars: TechnologyVariableMap,
    storage_capacity_vars: StorageVariableMap,
    generation_vars: GenerationVariableMap,
    charge_vars: StorageDispatchVariableMap,
    discharge_vars: StorageDispatchVariableMap,
    level_vars: StorageDispatchVariableMap,
    investment_cost_vars: TechnologyVariableMap,
    variable_cost_vars: TechnologyVariableMap,
    emissions_vars: TechnologyVariableMap,
    emission_cost_vars: TechnologyVariableMap,
    storage_cost_vars: StorageVariableMap,
    system_cost_var: Variable,
}

impl VariableMap {
    /// Add all decision variables for `model` to `problem`.
    ///
    /// Every variable is non-negative except the total system cost, which is free and is the only
    /// variable with a non-zero objective coefficient.
    fn new(problem: &mut Problem, model: &Model) -> Self {
        let technology_vars = |problem: &mut Problem, prefix: &str| -> TechnologyVariableMap {
            model
                .iter_technologies()
                .map(|technology| {
                    let name = format!("{prefix}[{}]", technology.id);
                    (technology.id.clone(), problem.add_variable(name, NON_NEGATIVE))
                })
                .collect()
        };
        let storage_vars = |problem: &mut Problem, prefix: &str| -> StorageVariableMap {
            model
                .iter_storage()
                .map(|storage| {
                    let name = format!("{prefix}[{}]", storage.id);
                    (storage.id.clone(), problem.add_variable(name, NON_NEGATIVE))
                })
                .collect()
        };
        let dispatch_vars = |problem: &mut Problem, prefix: &str| -> StorageDispatchVariableMap {
            iproduct!(model.iter_hours(), model.iter_storage())
                .map(|(hour, storage)| {
                    let name = format!("{prefix}[{hour},{}]", storage.id);
                    let var = problem.add_variable(name, NON_NEGATIVE);
                    ((hour.clone(), storage.id.clone()), var)
                })
                .collect()
        };

        let capacity_vars = technology_vars(problem, "capacity");
        let storage_capacity_vars = storage_vars(problem, "storage_capacity");
        let generation_vars = iproduct!(model.iter_hours(), model.iter_technologies())
            .map(|(hour, technology)| {
                let name = format!("generation[{hour},{}]", technology.id);
                let var = problem.add_variable(name, NON_NEGATIVE);
                ((hour.clone(), technology.id.clone()), var)
            })
            .collect();
        let charge_vars = dispatch_vars(problem, "charge");
        let discharge_vars = dispatch_vars(problem, "discharge");
        let level_vars = dispatch_vars(problem, "level");
        let investment_cost_vars = technology_vars(problem, "investment_cost");
        let variable_cost_vars = technology_vars(problem, "variable_cost");
        let emissions_vars = technology_vars(problem, "emissions");
        let emission_cost_vars = technology_vars(problem, "emission_cost");
        let storage_cost_vars = storage_vars(problem, "storage_cost");
        let system_cost_var = problem.add_column("system_cost", FREE, 1.0);

        Self {
            capacity_vars,
            storage_capacity_vars,
            generation_vars,
            charge_vars,
            discharge_vars,
            level_vars,
            investment_cost_vars,
            variable_cost_vars,
            emissions_vars,
            emission_cost_vars,
            storage_cost_vars,
            system_cost_var,
        }
    }

    /// Get the installed capacity [`Variable`] for a technology
    pub fn capacity_var(&self, technology_id: &TechnologyID) -> Variable {
        *self
            .capacity_vars
            .get(technology_id)
            .expect("No capacity variable found for given technology")
    }

    /// Get the installed storage capacity [`Variable`] for a storage technology
    pub fn storage_capacity_var(&self, storage_id: &StorageID) -> Variable {
        *self
            .storage_capacity_vars
            .get(storage_id)
            .expect("No storage capacity variable found for given storage technology")
    }

    /// Get the generation [`Variable`] for an hour and technology
    pub fn generation_var(&self, hour: &HourID, technology_id: &TechnologyID) -> Variable {
        *self
            .generation_vars
            .get(&(hour.clone(), technology_id.clone()))
            .expect("No generation variable found for given params")
    }

    /// Get the charge [`Variable`] for an hour and storage technology
    pub fn charge_var(&self, hour: &HourID, storage_id: &StorageID) -> Variable {
        *self
            .charge_vars
            .get(&(hour.clone(), storage_id.clone()))
            .expect("No charge variable found for given params")
    }

    /// Get the discharge [`Variable`] for an hour and storage technology
    pub fn discharge_var(&self, hour: &HourID, storage_id: &StorageID) -> Variable {
        *self
            .discharge_vars
            .get(&(hour.clone(), storage_id.clone()))
            .expect("No discharge variable found for given params")
    }

    /// Get the storage level [`Variable`] for an hour and storage technology
    pub fn level_var(&self, hour: &HourID, storage_id: &StorageID) -> Variable {
        *self
            .level_vars
            .get(&(hour.clone(), storage_id.clone()))
            .expect("No storage level variable found for given params")
    }

    /// Get the investment cost [`Variable`] for a technology
    pub fn investment_cost_var(&self, technology_id: &TechnologyID) -> Variable {
        *self
            .investment_cost_vars
            .get(technology_id)
            .expect("No investment cost variable found for given technology")
    }

    /// Get the variable cost [`Variable`] for a technology
    pub fn variable_cost_var(&self, technology_id: &TechnologyID) -> Variable {
        *self
            .variable_cost_vars
            .get(technology_id)
            .expect("No variable cost variable found for given technology")
    }

    /// Get the emissions [`Variable`] for a technology
    pub fn emissions_var(&self, technology_id: &TechnologyID) -> Variable {
        *self
            .emissions_vars
            .get(technology_id)
            .expect("No emissions variable found for given technology")
    }

    /// Get the emission cost [`Variable`] for a technology
    pub fn emission_cost_var(&self, technology_id: &TechnologyID) -> Variable {
        *self
            .emission_cost_vars
            .get(technology_id)
            .expect("No emission cost variable found for given technology")
    }

    /// Get the storage cost [`Variable`] for a storage technology
    pub fn storage_cost_var(&self, storage_id: &StorageID) -> Variable {
        *self
            .storage_cost_vars
            .get(storage_id)
            .expect("No storage cost variable found for given storage technology")
    }

    /// The total system cost [`Variable`] (the objective)
    pub fn system_cost_var(&self) -> Variable {
        self.system_cost_var
    }

    /// Iterate over installed capacity variables in technology order
    pub fn iter_capacity_vars(&self) -> impl Iterator<Item = (&TechnologyID, Variable)> {
        self.capacity_vars.iter().map(|(id, var)| (id, *var))
    }

    /// Iterate over installed storage capacity variables in storage order
    pub fn iter_storage_capacity_vars(&self) -> impl Iterator<Item = (&StorageID, Variable)> {
        self.storage_capacity_vars.iter().map(|(id, var)| (id, *var))
    }

    /// Iterate over generation variables, hour by hour
    pub fn iter_generation_vars(
        &self,
    ) -> impl Iterator<Item = (&HourID, &TechnologyID, Variable)> {
        self.generation_vars
            .iter()
            .map(|((hour, technology_id), var)| (hour, technology_id, *var))
    }

    /// Iterate over the charge, discharge and level variables, hour by hour
    pub fn iter_storage_dispatch_vars(
        &self,
    ) -> impl Iterator<Item = (&HourID, &StorageID, [Variable; 3])> {
        self.level_vars.iter().map(|(key, level)| {
            let (hour, storage_id) = key;
            let vars = [self.charge_vars[key], self.discharge_vars[key], *level];
            (hour, storage_id, vars)
        })
    }
}

impl VariableMap {
    /// The number of variables in the map
    pub fn num_variables(&self) -> usize {
        self.capacity_vars.len()
            + self.storage_capacity_vars.len()
            + self.generation_vars.len()
            + self.charge_vars.len()
            + self.discharge_vars.len()
            + self.level_vars.len()
            + self.investment_cost_vars.len()
            + self.variable_cost_vars.len()
            + self.emissions_vars.len()
            + self.emission_cost_vars.len()
            + self.storage_cost_vars.len()
            + 1
    }

    /// Map a set of results back onto column values, in column order.
    ///
    /// This is the inverse of [`ExpansionResults::from_solution`], allowing results to be checked
    /// against the problem's constraints.
    pub fn column_values(&self, results: &ExpansionResults) -> Vec<f64> {
        let mut values = vec![0.0; self.num_variables()];
        let mut set = |var: Variable, value: f64| values[var.index()] = value;

        for (id, result) in results.technologies.iter() {
            set(self.capacity_var(id), result.capacity.value());
            set(self.investment_cost_var(id), result.investment_cost.value());
            set(self.variable_cost_var(id), result.variable_cost.value());
            set(self.emissions_var(id), result.emissions.value());
            set(self.emission_cost_var(id), result.emission_cost.value());
        }
        for (id, result) in results.storage.iter() {
            set(self.storage_capacity_var(id), result.capacity.value());
            set(self.storage_cost_var(id), result.storage_cost.value());
        }
        for ((hour, id), generation) in results.generation.iter() {
            set(self.generation_var(hour, id), generation.value());
        }
        for ((hour, id), dispatch) in results.storage_dispatch.iter() {
            set(self.charge_var(hour, id), dispatch.charge.value());
            set(self.discharge_var(hour, id), dispatch.discharge.value());
            set(self.level_var(hour, id), dispatch.level.value());
        }
        set(self.system_cost_var(), results.system_cost.value());

        values
    }
}

/// The optimisation problem together with the keys for its variables
#[derive(Debug)]
pub struct ModelProblem {
    /// The solver-agnostic problem
    pub problem: Problem,
    /// The variables of `problem`
    pub variables: VariableMap,
}

/// Build the capacity expansion problem for the given model.
///
/// # Arguments
///
/// * `model` - The model
///
/// # Returns
///
/// The problem and its variables, or a [`ConfigurationError`] if the model's index sets are empty
/// or inconsistent.
pub fn build_problem(model: &Model) -> Result<ModelProblem, ConfigurationError> {
    if model.time_index().is_empty() {
        return Err(ConfigurationError::new("The time index is empty"));
    }
    if model.iter_technologies().next().is_none() {
        return Err(ConfigurationError::new("No generation technologies defined"));
    }

    let mut problem = Problem::new(Sense::Minimise);
    let variables = VariableMap::new(&mut problem, model);
    add_model_constraints(&mut problem, &variables, model)?;

    debug!(
        "Built capacity expansion problem with {} variables and {} constraints",
        problem.num_columns(),
        problem.num_constraints()
    );
    for family in ConstraintFamily::iter() {
        debug!("  {family}: {} constraints", problem.iter_family(family).count());
    }

    Ok(ModelProblem { problem, variables })
}
