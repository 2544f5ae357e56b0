//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use super::ConfigurationError;
use crate::input::{input_err_msg, read_toml};
use crate::units::MoneyPerEmissions;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeStringEnum};
use std::fmt;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// How the storage level before the first hour is defined
#[derive(
    DeserializeLabeledStringEnum, SerializeStringEnum, Debug, PartialEq, Eq, Clone, Copy,
)]
pub enum StorageBoundary {
    /// The year wraps round: the first hour follows the last one
    #[string = "cyclic"]
    Cyclic,
    /// Storage starts the year empty
    #[string = "empty_start"]
    EmptyStart,
}

impl fmt::Display for StorageBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cyclic => write!(f, "cyclic"),
            Self::EmptyStart => write!(f, "empty_start"),
        }
    }
}

/// Scalar parameters for a model run.
///
/// These are fixed once the [`super::Model`] has been constructed.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// The price applied to every tonne of CO2 emitted
    pub emission_price: MoneyPerEmissions,
    /// How storage continuity is closed at the start of the year
    pub storage_boundary: StorageBoundary,
    /// An optional time limit for the solver, in seconds
    #[serde(default)]
    pub solver_time_limit: Option<f64>,
}

impl ModelParameters {
    /// Create a new set of parameters with no solver time limit
    pub fn new(emission_price: MoneyPerEmissions, storage_boundary: StorageBoundary) -> Self {
        Self {
            emission_price,
            storage_boundary,
            solver_time_limit: None,
        }
    }

    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Check that the parameter values are valid
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let price = self.emission_price;
        if !price.is_finite() || price < MoneyPerEmissions(0.0) {
            return Err(ConfigurationError::new(format!(
                "emission_price must be a finite, non-negative number (got {price})"
            )));
        }

        if let Some(limit) = self.solver_time_limit
            && !(limit.is_finite() && limit > 0.0)
        {
            return Err(ConfigurationError::new(format!(
                "solver_time_limit must be a finite number of seconds greater than zero (got {limit})"
            )));
        }

        Ok(())
    }
}
