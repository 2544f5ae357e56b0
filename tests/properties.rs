//! Tests that optimal solutions satisfy the physical and accounting rules of the model.
use float_cmp::assert_approx_eq;
use gencap::input::load_model;
use gencap::model::{CapacityFactorMap, DemandMap, Model, ModelParameters, StorageBoundary};
use gencap::optimisation::build_problem;
use gencap::planning::{PlanningError, solve_model};
use gencap::results::ExpansionResults;
use gencap::solver::{HighsSolver, SolveError};
use gencap::technology::{StorageID, StorageMap, StorageTechnology, Technology, TechnologyMap};
use gencap::time_index::TimeIndex;
use gencap::units::{
    Dimensionless, EmissionsPerEnergy, Energy, MoneyPerCapacity, MoneyPerEmissions,
    MoneyPerEnergy,
};

/// Tolerance used when checking solutions
const TOLERANCE: f64 = 1e-5;

fn technology(
    id: &str,
    annual_capital_cost: f64,
    variable_cost: f64,
    emission_factor: f64,
) -> Technology {
    Technology {
        id: id.into(),
        description: String::new(),
        annual_capital_cost: MoneyPerCapacity(annual_capital_cost),
        variable_cost: MoneyPerEnergy(variable_cost),
        availability: Dimensionless(1.0),
        emission_factor: EmissionsPerEnergy(emission_factor),
    }
}

fn battery(annual_storage_cost: f64) -> StorageTechnology {
    StorageTechnology {
        id: "battery".into(),
        description: String::new(),
        annual_storage_cost: MoneyPerEnergy(annual_storage_cost),
    }
}

/// Build a model with hours `h1`, `h2`, ...
///
/// `capacity_factors` gives one row per technology, in the same order as `technologies`.
fn build_model(
    emission_price: f64,
    storage_boundary: StorageBoundary,
    technologies: Vec<Technology>,
    storage: Vec<StorageTechnology>,
    demand: &[f64],
    capacity_factors: &[&[f64]],
) -> Model {
    let time_index = TimeIndex::hourly(demand.len()).unwrap();
    let demand: DemandMap = time_index
        .iter()
        .zip(demand)
        .map(|(hour, value)| (hour.clone(), Energy(*value)))
        .collect();
    let capacity_factors: CapacityFactorMap = technologies
        .iter()
        .zip(capacity_factors)
        .flat_map(|(technology, values)| {
            time_index.iter().zip(values.iter()).map(|(hour, value)| {
                ((hour.clone(), technology.id.clone()), Dimensionless(*value))
            })
        })
        .collect();
    let technologies: TechnologyMap = technologies
        .into_iter()
        .map(|technology| (technology.id.clone(), technology))
        .collect();
    let storage: StorageMap = storage
        .into_iter()
        .map(|storage| (storage.id.clone(), storage))
        .collect();

    Model::new(
        ModelParameters::new(MoneyPerEmissions(emission_price), storage_boundary),
        time_index,
        technologies,
        storage,
        demand,
        capacity_factors,
    )
    .unwrap()
}

/// A small model with a variable renewable, a dispatchable emitter and storage
fn mixed_model(storage_boundary: StorageBoundary) -> Model {
    build_model(
        30.0,
        storage_boundary,
        vec![
            technology("solar", 40.0, 0.0, 0.0),
            technology("gas", 60.0, 25.0, 0.4),
        ],
        vec![battery(5.0)],
        &[8.0, 10.0, 14.0, 12.0, 9.0, 7.0],
        &[
            &[0.0, 0.3, 0.9, 1.0, 0.6, 0.1],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        ],
    )
}

/// Assert that two values are equal, relative to the size of `expected`
fn assert_close(actual: f64, expected: f64) {
    let tolerance = TOLERANCE * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} is not close to {expected}"
    );
}

fn solve(model: &Model) -> ExpansionResults {
    solve_model(model, &HighsSolver::new()).unwrap()
}

/// Check every hard constraint of the model against a solution
fn check_solution(model: &Model, results: &ExpansionResults) {
    for hour in model.iter_hours() {
        // Demand is met exactly
        let mut supply = 0.0;
        for technology in model.iter_technologies() {
            let generation = results.generation(hour, &technology.id).unwrap().value();
            let capacity = results.capacity(&technology.id).unwrap().value();
            let capacity_factor = model.capacity_factor(hour, &technology.id).unwrap();
            assert!(generation >= -TOLERANCE);
            let available = capacity_factor.value() * technology.availability.value() * capacity;
            assert!(generation <= available + TOLERANCE * available.max(1.0));
            supply += generation;
        }

        for storage in model.iter_storage() {
            let dispatch = &results.storage_dispatch[&(hour.clone(), storage.id.clone())];
            let capacity = results.storage[&storage.id].capacity.value();
            assert!(dispatch.charge.value() >= -TOLERANCE);
            assert!(dispatch.discharge.value() >= -TOLERANCE);
            assert!(dispatch.level.value() >= -TOLERANCE);
            assert!(dispatch.level.value() <= capacity + TOLERANCE * capacity.max(1.0));

            // The level follows from the previous level and this hour's flows
            let previous_level = model.predecessor(hour).map_or(0.0, |previous| {
                results.storage_dispatch[&(previous.clone(), storage.id.clone())]
                    .level
                    .value()
            });
            assert_close(
                dispatch.level.value(),
                previous_level + dispatch.charge.value() - dispatch.discharge.value(),
            );

            supply += dispatch.discharge.value() - dispatch.charge.value();
        }

        assert_close(supply, model.demand(hour).unwrap().value());
    }

    // The system cost is the sum of its components and is what the solver minimised
    assert_close(
        results.component_cost_sum().value(),
        results.system_cost.value(),
    );
    assert_close(
        results.objective_value.value(),
        results.system_cost.value(),
    );
}

/// The share of generation from technologies with no emissions
fn zero_emission_share(model: &Model, results: &ExpansionResults) -> f64 {
    let mut clean = 0.0;
    let mut total = 0.0;
    for ((_, id), generation) in &results.generation {
        total += generation.value();
        if model.technology(id).unwrap().is_zero_emission() {
            clean += generation.value();
        }
    }

    clean / total
}

#[test]
fn test_solution_satisfies_constraints_cyclic() {
    let model = mixed_model(StorageBoundary::Cyclic);
    let results = solve(&model);
    check_solution(&model, &results);
}

#[test]
fn test_solution_satisfies_constraints_empty_start() {
    let model = mixed_model(StorageBoundary::EmptyStart);
    let results = solve(&model);
    check_solution(&model, &results);
}

#[test]
fn test_solution_satisfies_constraints_no_storage() {
    let model = build_model(
        0.0,
        StorageBoundary::Cyclic,
        vec![
            technology("wind", 80.0, 0.0, 0.0),
            technology("coal", 50.0, 30.0, 0.9),
        ],
        Vec::new(),
        &[5.0, 6.0, 4.0],
        &[&[0.4, 0.7, 0.2], &[1.0, 1.0, 1.0]],
    );
    let results = solve(&model);
    check_solution(&model, &results);
    assert!(results.storage.is_empty());
    assert!(results.storage_dispatch.is_empty());
}

#[test]
fn test_solution_round_trip() {
    let model = mixed_model(StorageBoundary::Cyclic);
    let results = solve(&model);

    // The results map back onto a feasible point with the same objective
    let model_problem = build_problem(&model).unwrap();
    let values = model_problem.variables.column_values(&results);
    let violations = model_problem.problem.find_violations(&values, TOLERANCE);
    assert!(violations.is_empty(), "Violations: {violations:?}");
    assert_approx_eq!(
        f64,
        model_problem.problem.objective_value(&values),
        results.objective_value.value(),
        epsilon = TOLERANCE
    );
}

#[test]
fn test_zero_demand() {
    let model = build_model(
        50.0,
        StorageBoundary::Cyclic,
        vec![
            technology("wind", 80.0, 0.0, 0.0),
            technology("gas", 40.0, 20.0, 0.4),
        ],
        vec![battery(5.0)],
        &[0.0, 0.0, 0.0],
        &[&[0.5, 0.5, 0.5], &[1.0, 1.0, 1.0]],
    );
    let results = solve(&model);
    check_solution(&model, &results);
    assert_approx_eq!(f64, results.total_capacity().value(), 0.0, epsilon = TOLERANCE);
    assert_approx_eq!(f64, results.system_cost.value(), 0.0, epsilon = TOLERANCE);

    // Nothing is built, so nothing is dispatched either
    for result in results.storage.values() {
        assert_approx_eq!(f64, result.capacity.value(), 0.0, epsilon = TOLERANCE);
    }
    for generation in results.generation.values() {
        assert_approx_eq!(f64, generation.value(), 0.0, epsilon = TOLERANCE);
    }
    assert_eq!(results.storage_dispatch.len(), 3);
    for dispatch in results.storage_dispatch.values() {
        assert_approx_eq!(f64, dispatch.charge.value(), 0.0, epsilon = TOLERANCE);
        assert_approx_eq!(f64, dispatch.discharge.value(), 0.0, epsilon = TOLERANCE);
        assert_approx_eq!(f64, dispatch.level.value(), 0.0, epsilon = TOLERANCE);
    }
}

#[test]
fn test_storage_boundary() {
    // Demand in the first hour can only be met from storage
    let make_model = |storage_boundary| {
        build_model(
            0.0,
            storage_boundary,
            vec![technology("solar", 10.0, 0.0, 0.0)],
            vec![battery(1.0)],
            &[5.0, 5.0],
            &[&[0.0, 1.0]],
        )
    };

    let model = make_model(StorageBoundary::EmptyStart);
    assert_eq!(
        solve_model(&model, &HighsSolver::new()).unwrap_err(),
        PlanningError::Solve(SolveError::Infeasible)
    );

    // If the year wraps round, energy stored in the last hour covers the first
    let model = make_model(StorageBoundary::Cyclic);
    let results = solve(&model);
    check_solution(&model, &results);
    assert_approx_eq!(
        f64,
        results.capacity(&"solar".into()).unwrap().value(),
        10.0,
        epsilon = TOLERANCE
    );
    assert_approx_eq!(
        f64,
        results.storage[&StorageID::from("battery")].capacity.value(),
        5.0,
        epsilon = TOLERANCE
    );
}

#[test]
fn test_emission_price_increases_zero_emission_share() {
    let make_model = |emission_price| {
        build_model(
            emission_price,
            StorageBoundary::Cyclic,
            vec![
                technology("wind", 100.0, 0.0, 0.0),
                technology("gas", 50.0, 10.0, 0.5),
            ],
            Vec::new(),
            &[100.0; 4],
            &[&[0.5; 4], &[1.0; 4]],
        )
    };

    // Without a price on emissions gas is cheaper
    let model = make_model(0.0);
    let results = solve(&model);
    check_solution(&model, &results);
    assert_approx_eq!(f64, zero_emission_share(&model, &results), 0.0, epsilon = TOLERANCE);
    assert_close(results.capacity(&"wind".into()).unwrap().value(), 0.0);
    assert_close(results.capacity(&"gas".into()).unwrap().value(), 100.0);

    // A high enough price makes wind cheaper
    let model = model.with_emission_price(MoneyPerEmissions(100.0)).unwrap();
    let results = solve(&model);
    check_solution(&model, &results);
    assert_approx_eq!(f64, zero_emission_share(&model, &results), 1.0, epsilon = TOLERANCE);
    assert_close(results.capacity(&"wind".into()).unwrap().value(), 200.0);
    assert_close(results.capacity(&"gas".into()).unwrap().value(), 0.0);

    // The share never falls as the price rises
    let mut last_share = 0.0;
    for price in [0.0, 25.0, 50.0, 55.0, 60.0, 100.0] {
        let model = make_model(price);
        let share = zero_emission_share(&model, &solve(&model));
        assert!(share >= last_share - TOLERANCE);
        last_share = share;
    }
}

#[test]
fn test_demo_model_solution() {
    let model = load_model("demos/winter_week").unwrap();
    let ids: Vec<_> = model.iter_technologies().map(|t| t.id.to_string()).collect();
    assert_eq!(ids, ["wind", "pv", "gas", "gas_ccs"]);

    let results = solve(&model);
    check_solution(&model, &results);
}
