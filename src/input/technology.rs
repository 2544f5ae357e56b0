//! Code for reading the technologies CSV file
use super::{deserialise_proportion, input_err_msg, read_csv};
use crate::finance::annual_capital_cost;
use crate::id::into_id_map;
use crate::technology::{Technology, TechnologyMap};
use crate::units::{Dimensionless, EmissionsPerEnergy, MoneyPerCapacity, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

const TECHNOLOGIES_FILE_NAME: &str = "technologies.csv";

/// Represents a row of the technologies CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct TechnologyRaw {
    id: String,
    description: String,
    capital_cost: MoneyPerCapacity,
    lifetime: u32,
    discount_rate: Dimensionless,
    variable_cost: MoneyPerEnergy,
    #[serde(deserialize_with = "deserialise_proportion")]
    availability: Dimensionless,
    emission_factor: EmissionsPerEnergy,
}

impl TechnologyRaw {
    fn validate(&self) -> Result<()> {
        ensure!(!self.id.is_empty(), "Technology ID cannot be empty");
        ensure!(
            self.capital_cost.is_finite() && self.capital_cost >= MoneyPerCapacity(0.0),
            "capital_cost for technology {} must be a finite, non-negative number",
            self.id
        );
        ensure!(
            self.lifetime > 0,
            "lifetime for technology {} must be greater than zero",
            self.id
        );
        ensure!(
            self.discount_rate.value().is_finite() && self.discount_rate >= Dimensionless(0.0),
            "discount_rate for technology {} must be a finite, non-negative number",
            self.id
        );

        Ok(())
    }

    fn into_technology(self) -> Technology {
        Technology {
            id: self.id.as_str().into(),
            description: self.description,
            annual_capital_cost: annual_capital_cost(
                self.capital_cost,
                self.lifetime,
                self.discount_rate,
            ),
            variable_cost: self.variable_cost,
            availability: self.availability,
            emission_factor: self.emission_factor,
        }
    }
}

/// Read generation technologies from the technologies CSV file.
///
/// Capital costs are converted to an annual cost with [`annual_capital_cost`].
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of technologies in file order, or an error.
pub fn read_technologies(model_dir: &Path) -> Result<TechnologyMap> {
    let file_path = model_dir.join(TECHNOLOGIES_FILE_NAME);
    let technologies_csv = read_csv(&file_path)?;
    read_technologies_from_iter(technologies_csv).with_context(|| input_err_msg(&file_path))
}

fn read_technologies_from_iter<I>(iter: I) -> Result<TechnologyMap>
where
    I: Iterator<Item = TechnologyRaw>,
{
    let technologies: Vec<_> = iter
        .map(|raw| -> Result<Technology> {
            raw.validate()?;
            Ok(raw.into_technology())
        })
        .try_collect()?;

    into_id_map(technologies)
}
