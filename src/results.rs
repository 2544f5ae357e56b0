//! Results of a capacity expansion run, extracted from an optimal solution.
use crate::model::Model;
use crate::optimisation::VariableMap;
use crate::solver::Solution;
use crate::technology::{StorageID, TechnologyID};
use crate::time_index::HourID;
use crate::units::{Capacity, Emissions, Energy, Money};
use indexmap::IndexMap;
use serde::Serialize;

/// Installed capacity and cost accounting for a generation technology
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnologyResult {
    /// Installed capacity (MW)
    pub capacity: Capacity,
    /// Annualised investment cost
    pub investment_cost: Money,
    /// Variable operating cost over the year
    pub variable_cost: Money,
    /// Emissions over the year
    pub emissions: Emissions,
    /// Cost of emissions over the year
    pub emission_cost: Money,
}

/// Installed capacity and cost for a storage technology
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageResult {
    /// Installed energy capacity (MWh)
    pub capacity: Energy,
    /// Annualised storage cost
    pub storage_cost: Money,
}

/// Storage operation in a single hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageDispatch {
    /// Energy put into storage
    pub charge: Energy,
    /// Energy taken out of storage
    pub discharge: Energy,
    /// Stored energy at the end of the hour
    pub level: Energy,
}

/// The value of a single decision variable, with the indices it is defined over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    /// The variable name (e.g. `generation`)
    pub variable: &'static str,
    /// The hour, for hourly variables
    pub hour: Option<HourID>,
    /// The technology or storage technology, where applicable
    pub item: Option<String>,
    /// The optimal value
    pub value: f64,
}

impl NamedValue {
    fn new(variable: &'static str, hour: Option<&HourID>, item: Option<&str>, value: f64) -> Self {
        Self {
            variable,
            hour: hour.cloned(),
            item: item.map(String::from),
            value,
        }
    }
}

/// The optimal capacity mix and dispatch for a model.
///
/// Technologies, storage technologies and hours are in the same order as in the [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionResults {
    /// Results for each generation technology
    pub technologies: IndexMap<TechnologyID, TechnologyResult>,
    /// Results for each storage technology
    pub storage: IndexMap<StorageID, StorageResult>,
    /// Generation for each hour and technology
    pub generation: IndexMap<(HourID, TechnologyID), Energy>,
    /// Storage operation for each hour and storage technology
    pub storage_dispatch: IndexMap<(HourID, StorageID), StorageDispatch>,
    /// Total annual system cost
    pub system_cost: Money,
    /// The objective value reported by the solver
    pub objective_value: Money,
}

impl ExpansionResults {
    /// Extract results from an optimal solution.
    ///
    /// # Arguments
    ///
    /// * `model` - The model the problem was built from
    /// * `variables` - The problem's variables
    /// * `solution` - An optimal solution to the problem
    pub fn from_solution(model: &Model, variables: &VariableMap, solution: &Solution) -> Self {
        let technologies = model
            .iter_technologies()
            .map(|technology| {
                let id = &technology.id;
                let result = TechnologyResult {
                    capacity: Capacity(solution.value(variables.capacity_var(id))),
                    investment_cost: Money(solution.value(variables.investment_cost_var(id))),
                    variable_cost: Money(solution.value(variables.variable_cost_var(id))),
                    emissions: Emissions(solution.value(variables.emissions_var(id))),
                    emission_cost: Money(solution.value(variables.emission_cost_var(id))),
                };
                (id.clone(), result)
            })
            .collect();

        let storage = model
            .iter_storage()
            .map(|storage| {
                let id = &storage.id;
                let result = StorageResult {
                    capacity: Energy(solution.value(variables.storage_capacity_var(id))),
                    storage_cost: Money(solution.value(variables.storage_cost_var(id))),
                };
                (id.clone(), result)
            })
            .collect();

        let generation = variables
            .iter_generation_vars()
            .map(|(hour, technology_id, var)| {
                let key = (hour.clone(), technology_id.clone());
                (key, Energy(solution.value(var)))
            })
            .collect();

        let storage_dispatch = variables
            .iter_storage_dispatch_vars()
            .map(|(hour, storage_id, [charge, discharge, level])| {
                let dispatch = StorageDispatch {
                    charge: Energy(solution.value(charge)),
                    discharge: Energy(solution.value(discharge)),
                    level: Energy(solution.value(level)),
                };
                ((hour.clone(), storage_id.clone()), dispatch)
            })
            .collect();

        Self {
            technologies,
            storage,
            generation,
            storage_dispatch,
            system_cost: Money(solution.value(variables.system_cost_var())),
            objective_value: Money(solution.objective_value()),
        }
    }

    /// Installed capacity for the given technology
    pub fn capacity(&self, technology_id: &TechnologyID) -> Option<Capacity> {
        self.technologies.get(technology_id).map(|r| r.capacity)
    }

    /// Generation for the given hour and technology
    pub fn generation(&self, hour: &HourID, technology_id: &TechnologyID) -> Option<Energy> {
        self.generation
            .get(&(hour.clone(), technology_id.clone()))
            .copied()
    }

    /// Total installed generation capacity
    pub fn total_capacity(&self) -> Capacity {
        self.technologies.values().map(|r| r.capacity).sum()
    }

    /// The sum of investment, variable, storage and emission costs.
    ///
    /// At the optimum this equals [`ExpansionResults::system_cost`].
    pub fn component_cost_sum(&self) -> Money {
        let technology_costs: Money = self
            .technologies
            .values()
            .map(|r| r.investment_cost + r.variable_cost + r.emission_cost)
            .sum();
        let storage_costs: Money = self.storage.values().map(|r| r.storage_cost).sum();
        technology_costs + storage_costs
    }

    /// Iterate over the values of all decision variables.
    ///
    /// Each value is tagged with the variable name and the hour and/or item it is indexed by.
    pub fn iter_named_values(&self) -> impl Iterator<Item = NamedValue> + '_ {
        let technology_values = self.technologies.iter().flat_map(|(id, r)| {
            let id = Some(&*id.0);
            [
                NamedValue::new("capacity", None, id, r.capacity.value()),
                NamedValue::new("investment_cost", None, id, r.investment_cost.value()),
                NamedValue::new("variable_cost", None, id, r.variable_cost.value()),
                NamedValue::new("emissions", None, id, r.emissions.value()),
                NamedValue::new("emission_cost", None, id, r.emission_cost.value()),
            ]
        });
        let storage_values = self.storage.iter().flat_map(|(id, r)| {
            let id = Some(&*id.0);
            [
                NamedValue::new("storage_capacity", None, id, r.capacity.value()),
                NamedValue::new("storage_cost", None, id, r.storage_cost.value()),
            ]
        });
        let generation_values = self.generation.iter().map(|((hour, id), generation)| {
            NamedValue::new("generation", Some(hour), Some(&*id.0), generation.value())
        });
        let dispatch_values = self.storage_dispatch.iter().flat_map(|((hour, id), d)| {
            let (hour, id) = (Some(hour), Some(&*id.0));
            [
                NamedValue::new("charge", hour, id, d.charge.value()),
                NamedValue::new("discharge", hour, id, d.discharge.value()),
                NamedValue::new("level", hour, id, d.level.value()),
            ]
        });
        let system_cost = NamedValue::new("system_cost", None, None, self.system_cost.value());

        technology_values
            .chain(storage_values)
            .chain(generation_values)
            .chain(dispatch_values)
            .chain(std::iter::once(system_cost))
    }
}
