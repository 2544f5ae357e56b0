//! Code for adding constraints to the capacity expansion problem.
//!
//! See [`ConstraintFamily`] for the list of families. Cost and emissions are accounted for with
//! explicit variables tied to the decision variables by equality constraints, so that each
//! component of the system cost can be read directly from the solution.
use super::{ConstraintFamily, LinearExpr, Problem, RowBound, VariableMap};
use crate::model::{ConfigurationError, Model};
use crate::technology::{StorageTechnology, Technology};
use crate::time_index::HourID;

/// Add all constraints for the model to the problem.
///
/// Constraints are added family by family in a fixed order, with hour-indexed families in
/// chronological order.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `model` - The model
pub fn add_model_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<(), ConfigurationError> {
    add_objective_constraint(problem, variables, model);
    for technology in model.iter_technologies() {
        add_investment_cost_constraint(problem, variables, technology);
        add_variable_cost_constraint(problem, variables, model, technology);
    }
    add_generation_capacity_constraints(problem, variables, model)?;
    for storage in model.iter_storage() {
        add_storage_cost_constraint(problem, variables, storage);
    }
    add_demand_balance_constraints(problem, variables, model)?;
    for technology in model.iter_technologies() {
        add_emissions_constraint(problem, variables, model, technology);
        add_emission_cost_constraint(problem, variables, model, technology);
    }
    add_storage_continuity_constraints(problem, variables, model);
    add_storage_capacity_constraints(problem, variables, model);

    Ok(())
}

/// Define the system cost as the sum of all cost components
fn add_objective_constraint(problem: &mut Problem, variables: &VariableMap, model: &Model) {
    let mut expr = LinearExpr::new().with_term(variables.system_cost_var(), 1.0);
    for technology in model.iter_technologies() {
        expr.add_term(variables.investment_cost_var(&technology.id), -1.0);
        expr.add_term(variables.variable_cost_var(&technology.id), -1.0);
        expr.add_term(variables.emission_cost_var(&technology.id), -1.0);
    }
    for storage in model.iter_storage() {
        expr.add_term(variables.storage_cost_var(&storage.id), -1.0);
    }

    problem.add_constraint(
        ConstraintFamily::Objective,
        "system_cost",
        expr,
        RowBound::Equal(0.0),
    );
}

/// Investment cost is annualised capital cost times installed capacity
fn add_investment_cost_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    technology: &Technology,
) {
    let expr = LinearExpr::new()
        .with_term(variables.investment_cost_var(&technology.id), 1.0)
        .with_term(
            variables.capacity_var(&technology.id),
            -technology.annual_capital_cost.value(),
        );
    problem.add_constraint(
        ConstraintFamily::InvestmentCost,
        format!("investment_cost[{}]", technology.id),
        expr,
        RowBound::Equal(0.0),
    );
}

/// Variable cost is the variable cost rate times total annual generation
fn add_variable_cost_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
    technology: &Technology,
) {
    let mut expr = LinearExpr::new().with_term(variables.variable_cost_var(&technology.id), 1.0);
    let cost = technology.variable_cost.value();
    for hour in model.iter_hours() {
        expr.add_term(variables.generation_var(hour, &technology.id), -cost);
    }
    problem.add_constraint(
        ConstraintFamily::VariableCost,
        format!("variable_cost[{}]", technology.id),
        expr,
        RowBound::Equal(0.0),
    );
}

/// Generation in each hour cannot exceed available capacity.
///
/// The limit is capacity scaled by the hourly capacity factor and the technology's availability.
fn add_generation_capacity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<(), ConfigurationError> {
    for hour in model.iter_hours() {
        for technology in model.iter_technologies() {
            let capacity_factor = model.capacity_factor(hour, &technology.id).ok_or_else(|| {
                ConfigurationError::new(format!(
                    "Missing capacity factor for technology {} in hour {hour}",
                    technology.id
                ))
            })?;
            let coeff = capacity_factor * technology.availability;

            let expr = LinearExpr::new()
                .with_term(variables.generation_var(hour, &technology.id), 1.0)
                .with_term(variables.capacity_var(&technology.id), -coeff.value());
            problem.add_constraint(
                ConstraintFamily::GenerationCapacity,
                format!("generation_capacity[{hour},{}]", technology.id),
                expr,
                RowBound::AtMost(0.0),
            );
        }
    }

    Ok(())
}

/// Storage cost is the annualised storage cost times installed storage capacity
fn add_storage_cost_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    storage: &StorageTechnology,
) {
    let expr = LinearExpr::new()
        .with_term(variables.storage_cost_var(&storage.id), 1.0)
        .with_term(
            variables.storage_capacity_var(&storage.id),
            -storage.annual_storage_cost.value(),
        );
    problem.add_constraint(
        ConstraintFamily::StorageCost,
        format!("storage_cost[{}]", storage.id),
        expr,
        RowBound::Equal(0.0),
    );
}

/// Total generation plus net storage discharge must equal demand in every hour
fn add_demand_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<(), ConfigurationError> {
    for hour in model.iter_hours() {
        let demand = model
            .demand(hour)
            .ok_or_else(|| ConfigurationError::new(format!("Missing demand for hour {hour}")))?;

        let mut expr = LinearExpr::new();
        for technology in model.iter_technologies() {
            expr.add_term(variables.generation_var(hour, &technology.id), 1.0);
        }
        for storage in model.iter_storage() {
            expr.add_term(variables.discharge_var(hour, &storage.id), 1.0);
            expr.add_term(variables.charge_var(hour, &storage.id), -1.0);
        }

        problem.add_constraint(
            ConstraintFamily::DemandBalance,
            format!("demand_balance[{hour}]"),
            expr,
            RowBound::Equal(demand.value()),
        );
    }

    Ok(())
}

/// Annual emissions are the emission factor times total annual generation
fn add_emissions_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
    technology: &Technology,
) {
    let mut expr = LinearExpr::new().with_term(variables.emissions_var(&technology.id), 1.0);
    let factor = technology.emission_factor.value();
    for hour in model.iter_hours() {
        expr.add_term(variables.generation_var(hour, &technology.id), -factor);
    }
    problem.add_constraint(
        ConstraintFamily::Emissions,
        format!("emissions[{}]", technology.id),
        expr,
        RowBound::Equal(0.0),
    );
}

/// Emission cost is the emission price times annual emissions
fn add_emission_cost_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
    technology: &Technology,
) {
    let expr = LinearExpr::new()
        .with_term(variables.emission_cost_var(&technology.id), 1.0)
        .with_term(
            variables.emissions_var(&technology.id),
            -model.emission_price().value(),
        );
    problem.add_constraint(
        ConstraintFamily::EmissionCost,
        format!("emission_cost[{}]", technology.id),
        expr,
        RowBound::Equal(0.0),
    );
}

/// Storage level in each hour is the previous level plus charge minus discharge.
///
/// Which level counts as "previous" for the first hour is decided by the storage boundary policy.
/// Where there is no predecessor, the previous level is zero and the term is omitted.
fn add_storage_continuity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) {
    for hour in model.iter_hours() {
        let previous: Option<&HourID> = model.predecessor(hour);
        for storage in model.iter_storage() {
            let mut expr = LinearExpr::new()
                .with_term(variables.level_var(hour, &storage.id), 1.0)
                .with_term(variables.charge_var(hour, &storage.id), -1.0)
                .with_term(variables.discharge_var(hour, &storage.id), 1.0);
            if let Some(previous) = previous {
                // With a single hour under the cyclic policy this cancels the level term
                expr.add_term(variables.level_var(previous, &storage.id), -1.0);
            }

            problem.add_constraint(
                ConstraintFamily::StorageContinuity,
                format!("storage_continuity[{hour},{}]", storage.id),
                expr,
                RowBound::Equal(0.0),
            );
        }
    }
}

/// Storage level cannot exceed installed storage capacity
fn add_storage_capacity_constraints(problem: &mut Problem, variables: &VariableMap, model: &Model) {
    for hour in model.iter_hours() {
        for storage in model.iter_storage() {
            let expr = LinearExpr::new()
                .with_term(variables.level_var(hour, &storage.id), 1.0)
                .with_term(variables.storage_capacity_var(&storage.id), -1.0);
            problem.add_constraint(
                ConstraintFamily::StorageCapacity,
                format!("storage_capacity[{hour},{}]", storage.id),
                expr,
                RowBound::AtMost(0.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{capacity_factors, demand, model, storage, technologies, time_index};
    use crate::model::{CapacityFactorMap, DemandMap, ModelParameters, StorageBoundary};
    use crate::optimisation::{ModelProblem, Variable, build_problem, problem::Constraint};
    use crate::technology::{StorageMap, TechnologyMap};
    use crate::time_index::TimeIndex;
    use crate::units::MoneyPerEmissions;
    use rstest::rstest;

    fn get_constraint<'a>(problem: &'a Problem, name: &str) -> &'a Constraint {
        problem.constraints().iter().find(|c| c.name == name).unwrap()
    }

    fn terms(problem: &Problem, name: &str) -> Vec<(Variable, f64)> {
        get_constraint(problem, name).expr.iter_terms().collect()
    }

    #[rstest]
    fn test_generation_capacity(model: Model) {
        let ModelProblem { problem, variables } = build_problem(&model).unwrap();
        let wind = "wind".into();
        let gas = "gas".into();

        // Capacity factor 0.2, availability 1.0
        assert_eq!(
            terms(&problem, "generation_capacity[h2,wind]"),
            [
                (variables.generation_var(&"h2".into(), &wind), 1.0),
                (variables.capacity_var(&wind), -0.2),
            ]
        );

        // Capacity factor 1.0, availability 0.9
        assert_eq!(
            terms(&problem, "generation_capacity[h1,gas]"),
            [
                (variables.generation_var(&"h1".into(), &gas), 1.0),
                (variables.capacity_var(&gas), -0.9),
            ]
        );
        let constraint = get_constraint(&problem, "generation_capacity[h1,gas]");
        assert_eq!(constraint.bound, RowBound::AtMost(0.0));
    }

    #[rstest]
    fn test_demand_balance(model: Model) {
        let ModelProblem { problem, variables } = build_problem(&model).unwrap();
        let hour: HourID = "h2".into();
        let battery = "battery".into();

        let constraint = get_constraint(&problem, "demand_balance[h2]");
        assert_eq!(constraint.bound, RowBound::Equal(12.0));
        assert_eq!(
            terms(&problem, "demand_balance[h2]"),
            [
                (variables.generation_var(&hour, &"wind".into()), 1.0),
                (variables.generation_var(&hour, &"gas".into()), 1.0),
                (variables.discharge_var(&hour, &battery), 1.0),
                (variables.charge_var(&hour, &battery), -1.0),
            ]
        );
    }

    #[rstest]
    fn test_accounting_constraints(model: Model) {
        let ModelProblem { problem, variables } = build_problem(&model).unwrap();
        let gas = "gas".into();

        assert_eq!(
            terms(&problem, "investment_cost[gas]"),
            [
                (variables.investment_cost_var(&gas), 1.0),
                (variables.capacity_var(&gas), -50.0),
            ]
        );
        assert_eq!(
            terms(&problem, "emission_cost[gas]"),
            [
                (variables.emission_cost_var(&gas), 1.0),
                (variables.emissions_var(&gas), -50.0),
            ]
        );

        let emissions = terms(&problem, "emissions[gas]");
        assert_eq!(emissions.len(), 4);
        assert!(emissions[1..].iter().all(|(_, coeff)| *coeff == -0.4));

        // Wind has no variable cost, so only the cost variable remains
        assert_eq!(
            terms(&problem, "variable_cost[wind]"),
            [(variables.variable_cost_var(&"wind".into()), 1.0)]
        );

        // The objective row links every cost component to the system cost
        assert_eq!(terms(&problem, "system_cost").len(), 8);
    }

    #[rstest]
    fn test_storage_continuity_cyclic(model: Model) {
        let ModelProblem { problem, variables } = build_problem(&model).unwrap();
        let battery = "battery".into();
        let h1 = "h1".into();

        assert_eq!(
            terms(&problem, "storage_continuity[h1,battery]"),
            [
                (variables.level_var(&h1, &battery), 1.0),
                (variables.charge_var(&h1, &battery), -1.0),
                (variables.discharge_var(&h1, &battery), 1.0),
                (variables.level_var(&"h3".into(), &battery), -1.0),
            ]
        );
    }

    #[rstest]
    fn test_storage_continuity_empty_start(
        time_index: TimeIndex,
        technologies: TechnologyMap,
        storage: StorageMap,
        demand: DemandMap,
        capacity_factors: CapacityFactorMap,
    ) {
        let parameters = ModelParameters::new(MoneyPerEmissions(50.0), StorageBoundary::EmptyStart);
        let model = Model::new(
            parameters,
            time_index,
            technologies,
            storage,
            demand,
            capacity_factors,
        )
        .unwrap();
        let ModelProblem { problem, variables } = build_problem(&model).unwrap();
        let battery = "battery".into();
        let (h1, h2) = ("h1".into(), "h2".into());

        // No predecessor term for the first hour
        assert_eq!(
            terms(&problem, "storage_continuity[h1,battery]"),
            [
                (variables.level_var(&h1, &battery), 1.0),
                (variables.charge_var(&h1, &battery), -1.0),
                (variables.discharge_var(&h1, &battery), 1.0),
            ]
        );

        // Later hours link to the previous one as usual
        assert_eq!(
            terms(&problem, "storage_continuity[h2,battery]"),
            [
                (variables.level_var(&h2, &battery), 1.0),
                (variables.charge_var(&h2, &battery), -1.0),
                (variables.discharge_var(&h2, &battery), 1.0),
                (variables.level_var(&h1, &battery), -1.0),
            ]
        );
    }

    #[rstest]
    fn test_no_storage(
        time_index: TimeIndex,
        technologies: TechnologyMap,
        demand: DemandMap,
        capacity_factors: CapacityFactorMap,
    ) {
        let parameters = ModelParameters::new(MoneyPerEmissions(0.0), StorageBoundary::Cyclic);
        let model = Model::new(
            parameters,
            time_index,
            technologies,
            StorageMap::new(),
            demand,
            capacity_factors,
        )
        .unwrap();
        let ModelProblem { problem, .. } = build_problem(&model).unwrap();

        assert_eq!(problem.iter_family(ConstraintFamily::StorageCost).count(), 0);
        assert_eq!(problem.iter_family(ConstraintFamily::StorageContinuity).count(), 0);
        assert_eq!(problem.iter_family(ConstraintFamily::StorageCapacity).count(), 0);
        assert_eq!(terms(&problem, "demand_balance[h1]").len(), 2);
    }
}
