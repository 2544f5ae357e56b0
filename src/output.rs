//! The module responsible for writing output data to disk.
use crate::model::Model;
use crate::results::{ExpansionResults, NamedValue};
use crate::technology::{StorageID, TechnologyID};
use crate::time_index::HourID;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "gencap_results";

/// The output file name for installed generation capacity
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for installed storage capacity
const STORAGE_CAPACITIES_FILE_NAME: &str = "storage_capacities.csv";

/// The output file name for hourly generation
const GENERATION_FILE_NAME: &str = "generation.csv";

/// The output file name for hourly storage operation
const STORAGE_DISPATCH_FILE_NAME: &str = "storage_dispatch.csv";

/// The output file name for the system cost
const SYSTEM_COST_FILE_NAME: &str = "system_cost.csv";

/// The output file name for raw variable values
const DEBUG_VARIABLES_FILE_NAME: &str = "debug_variables.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and contains files, it is only reused if `allow_overwrite` is
/// true, in which case its contents are deleted first.
///
/// # Returns
///
/// Whether an existing directory was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let mut overwrite = false;
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if !is_empty {
            ensure!(
                allow_overwrite,
                "Output folder {} already exists and is not empty. Rerun with --overwrite to \
                 replace its contents.",
                output_dir.display()
            );
            fs::remove_dir_all(output_dir)?;
            overwrite = true;
        }
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the capacities CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapacityRow {
    technology_id: TechnologyID,
    capacity: f64,
    investment_cost: f64,
    variable_cost: f64,
    emissions: f64,
    emission_cost: f64,
}

/// Represents a row in the storage capacities CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct StorageCapacityRow {
    storage_id: StorageID,
    capacity: f64,
    storage_cost: f64,
}

/// Represents a row in the generation CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GenerationRow {
    hour: HourID,
    technology_id: TechnologyID,
    generation: f64,
}

/// Represents a row in the storage dispatch CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct StorageDispatchRow {
    hour: HourID,
    storage_id: StorageID,
    charge: f64,
    discharge: f64,
    level: f64,
}

/// Represents a row in the system cost CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SystemCostRow {
    total_cost: f64,
    objective_value: f64,
    emission_price: f64,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    variables_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(DEBUG_VARIABLES_FILE_NAME);
        Ok(Self {
            variables_writer: csv::Writer::from_path(file_path)?,
        })
    }

    /// Write the value of every decision variable
    fn write_variables<I>(&mut self, iter: I) -> Result<()>
    where
        I: Iterator<Item = NamedValue>,
    {
        for value in iter {
            self.variables_writer.serialize(value)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.variables_writer.flush()?;

        Ok(())
    }
}

/// An object for writing results to file
pub struct DataWriter {
    capacities_writer: csv::Writer<File>,
    storage_capacities_writer: csv::Writer<File>,
    generation_writer: csv::Writer<File>,
    storage_dispatch_writer: csv::Writer<File>,
    system_cost_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            capacities_writer: new_writer(CAPACITIES_FILE_NAME)?,
            storage_capacities_writer: new_writer(STORAGE_CAPACITIES_FILE_NAME)?,
            generation_writer: new_writer(GENERATION_FILE_NAME)?,
            storage_dispatch_writer: new_writer(STORAGE_DISPATCH_FILE_NAME)?,
            system_cost_writer: new_writer(SYSTEM_COST_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write all results to file
    pub fn write_results(&mut self, model: &Model, results: &ExpansionResults) -> Result<()> {
        self.write_capacities(results)?;
        self.write_generation(results)?;
        self.write_storage_dispatch(results)?;
        self.write_system_cost(model, results)?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_variables(results.iter_named_values())?;
        }

        Ok(())
    }

    /// Write installed generation and storage capacities to CSV files
    fn write_capacities(&mut self, results: &ExpansionResults) -> Result<()> {
        for (technology_id, result) in results.technologies.iter() {
            let row = CapacityRow {
                technology_id: technology_id.clone(),
                capacity: result.capacity.value(),
                investment_cost: result.investment_cost.value(),
                variable_cost: result.variable_cost.value(),
                emissions: result.emissions.value(),
                emission_cost: result.emission_cost.value(),
            };
            self.capacities_writer.serialize(row)?;
        }

        for (storage_id, result) in results.storage.iter() {
            let row = StorageCapacityRow {
                storage_id: storage_id.clone(),
                capacity: result.capacity.value(),
                storage_cost: result.storage_cost.value(),
            };
            self.storage_capacities_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write hourly generation to a CSV file
    fn write_generation(&mut self, results: &ExpansionResults) -> Result<()> {
        for ((hour, technology_id), generation) in results.generation.iter() {
            let row = GenerationRow {
                hour: hour.clone(),
                technology_id: technology_id.clone(),
                generation: generation.value(),
            };
            self.generation_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write hourly storage operation to a CSV file
    fn write_storage_dispatch(&mut self, results: &ExpansionResults) -> Result<()> {
        for ((hour, storage_id), dispatch) in results.storage_dispatch.iter() {
            let row = StorageDispatchRow {
                hour: hour.clone(),
                storage_id: storage_id.clone(),
                charge: dispatch.charge.value(),
                discharge: dispatch.discharge.value(),
                level: dispatch.level.value(),
            };
            self.storage_dispatch_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the total system cost to a CSV file
    fn write_system_cost(&mut self, model: &Model, results: &ExpansionResults) -> Result<()> {
        let row = SystemCostRow {
            total_cost: results.system_cost.value(),
            objective_value: results.objective_value.value(),
            emission_price: model.emission_price().value(),
        };
        self.system_cost_writer.serialize(row)?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.capacities_writer.flush()?;
        self.storage_capacities_writer.flush()?;
        self.generation_writer.flush()?;
        self.storage_dispatch_writer.flush()?;
        self.system_cost_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
