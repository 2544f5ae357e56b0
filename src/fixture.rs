//! Fixtures for tests

use crate::model::{CapacityFactorMap, DemandMap, Model, ModelParameters, StorageBoundary};
use crate::technology::{StorageMap, StorageTechnology, Technology, TechnologyMap};
use crate::time_index::TimeIndex;
use crate::units::{
    Dimensionless, EmissionsPerEnergy, Energy, MoneyPerCapacity, MoneyPerEmissions, MoneyPerEnergy,
};
use indexmap::indexmap;
use itertools::iproduct;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn parameters() -> ModelParameters {
    ModelParameters::new(MoneyPerEmissions(50.0), StorageBoundary::Cyclic)
}

#[fixture]
pub fn time_index() -> TimeIndex {
    TimeIndex::hourly(3).unwrap()
}

#[fixture]
pub fn technologies() -> TechnologyMap {
    indexmap! {
        "wind".into() => Technology {
            id: "wind".into(),
            description: "Onshore wind".into(),
            annual_capital_cost: MoneyPerCapacity(100.0),
            variable_cost: MoneyPerEnergy(0.0),
            availability: Dimensionless(1.0),
            emission_factor: EmissionsPerEnergy(0.0),
        },
        "gas".into() => Technology {
            id: "gas".into(),
            description: "Combined cycle gas turbine".into(),
            annual_capital_cost: MoneyPerCapacity(50.0),
            variable_cost: MoneyPerEnergy(20.0),
            availability: Dimensionless(0.9),
            emission_factor: EmissionsPerEnergy(0.4),
        },
    }
}

#[fixture]
pub fn storage() -> StorageMap {
    indexmap! {
        "battery".into() => StorageTechnology {
            id: "battery".into(),
            description: "Lithium-ion battery".into(),
            annual_storage_cost: MoneyPerEnergy(10.0),
        },
    }
}

#[fixture]
pub fn demand() -> DemandMap {
    indexmap! {
        "h1".into() => Energy(10.0),
        "h2".into() => Energy(12.0),
        "h3".into() => Energy(8.0),
    }
}

#[fixture]
pub fn capacity_factors() -> CapacityFactorMap {
    let wind = [0.5, 0.2, 0.8];
    iproduct!(1..=3, ["wind", "gas"])
        .map(|(i, technology)| {
            let value = if technology == "wind" { wind[i - 1] } else { 1.0 };
            (
                (format!("h{i}").into(), technology.into()),
                Dimensionless(value),
            )
        })
        .collect()
}

#[fixture]
pub fn model(
    parameters: ModelParameters,
    time_index: TimeIndex,
    technologies: TechnologyMap,
    storage: StorageMap,
    demand: DemandMap,
    capacity_factors: CapacityFactorMap,
) -> Model {
    Model::new(
        parameters,
        time_index,
        technologies,
        storage,
        demand,
        capacity_factors,
    )
    .unwrap()
}
