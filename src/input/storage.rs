//! Code for reading the storage technologies CSV file
use super::{input_err_msg, read_csv_optional};
use crate::finance::annual_storage_cost;
use crate::id::into_id_map;
use crate::technology::{StorageMap, StorageTechnology};
use crate::units::{Dimensionless, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::debug;
use serde::Deserialize;
use std::path::Path;

const STORAGE_FILE_NAME: &str = "storage.csv";

/// Represents a row of the storage technologies CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct StorageTechnologyRaw {
    id: String,
    description: String,
    capital_cost: MoneyPerEnergy,
    lifetime: u32,
    discount_rate: Dimensionless,
}

impl StorageTechnologyRaw {
    fn validate(&self) -> Result<()> {
        ensure!(!self.id.is_empty(), "Storage technology ID cannot be empty");
        ensure!(
            self.capital_cost.is_finite() && self.capital_cost >= MoneyPerEnergy(0.0),
            "capital_cost for storage technology {} must be a finite, non-negative number",
            self.id
        );
        ensure!(
            self.lifetime > 0,
            "lifetime for storage technology {} must be greater than zero",
            self.id
        );
        ensure!(
            self.discount_rate.value().is_finite() && self.discount_rate >= Dimensionless(0.0),
            "discount_rate for storage technology {} must be a finite, non-negative number",
            self.id
        );

        Ok(())
    }
}

/// Read storage technologies from the storage CSV file.
///
/// The file is optional; if it is missing the model has no storage.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_storage(model_dir: &Path) -> Result<StorageMap> {
    let file_path = model_dir.join(STORAGE_FILE_NAME);
    if !file_path.exists() {
        debug!("No {STORAGE_FILE_NAME} found; the model has no storage technologies");
    }

    let storage_csv = read_csv_optional(&file_path)?;
    read_storage_from_iter(storage_csv).with_context(|| input_err_msg(&file_path))
}

fn read_storage_from_iter<I>(iter: I) -> Result<StorageMap>
where
    I: Iterator<Item = StorageTechnologyRaw>,
{
    let storage: Vec<_> = iter
        .map(|raw| -> Result<StorageTechnology> {
            raw.validate()?;
            Ok(StorageTechnology {
                id: raw.id.as_str().into(),
                description: raw.description,
                annual_storage_cost: annual_storage_cost(
                    raw.capital_cost,
                    raw.lifetime,
                    raw.discount_rate,
                ),
            })
        })
        .try_collect()?;

    into_id_map(storage)
}
