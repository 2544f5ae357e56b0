//! The model holds all of the (validated, read-only) input data for a capacity expansion run.
use crate::technology::{
    StorageID, StorageMap, StorageTechnology, Technology, TechnologyID, TechnologyMap,
};
use crate::time_index::{HourID, TimeIndex};
use crate::units::{Dimensionless, Energy, MoneyPerEmissions};
use indexmap::IndexMap;
use std::error::Error;
use std::fmt;

pub mod parameters;
pub use parameters::{ModelParameters, StorageBoundary};

/// Demand for each hour
pub type DemandMap = IndexMap<HourID, Energy>;

/// Capacity factors for each combination of hour and technology
pub type CapacityFactorMap = IndexMap<(HourID, TechnologyID), Dimensionless>;

/// Indicates that the model's input data is missing, misindexed or invalid
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    /// Create a new [`ConfigurationError`] with the given message
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid model configuration: {}", self.message)
    }
}

impl Error for ConfigurationError {}

/// Model definition
#[derive(Debug, Clone)]
pub struct Model {
    parameters: ModelParameters,
    time_index: TimeIndex,
    technologies: TechnologyMap,
    storage: StorageMap,
    demand: DemandMap,
    capacity_factors: CapacityFactorMap,
}

impl Model {
    /// Create a new [`Model`], validating the input data.
    ///
    /// # Arguments
    ///
    /// * `parameters` - Scalar model parameters
    /// * `time_index` - The hours over which the model is defined
    /// * `technologies` - Generation technologies (must not be empty)
    /// * `storage` - Storage technologies (may be empty)
    /// * `demand` - Demand for every hour of `time_index`
    /// * `capacity_factors` - Capacity factors for every hour and technology
    pub fn new(
        parameters: ModelParameters,
        time_index: TimeIndex,
        technologies: TechnologyMap,
        storage: StorageMap,
        demand: DemandMap,
        capacity_factors: CapacityFactorMap,
    ) -> Result<Self, ConfigurationError> {
        parameters.validate()?;
        if technologies.is_empty() {
            return Err(ConfigurationError::new("No generation technologies defined"));
        }
        for technology in technologies.values() {
            check_technology(technology)?;
        }
        for storage in storage.values() {
            check_storage(storage)?;
        }

        let demand = order_demand(&time_index, demand)?;
        let capacity_factors =
            order_capacity_factors(&time_index, &technologies, capacity_factors)?;

        Ok(Self {
            parameters,
            time_index,
            technologies,
            storage,
            demand,
            capacity_factors,
        })
    }

    /// Create a copy of this model with a different emission price
    pub fn with_emission_price(
        &self,
        emission_price: MoneyPerEmissions,
    ) -> Result<Self, ConfigurationError> {
        let parameters = ModelParameters {
            emission_price,
            ..self.parameters.clone()
        };
        parameters.validate()?;

        Ok(Self {
            parameters,
            ..self.clone()
        })
    }

    /// The scalar model parameters
    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    /// The price per tonne of CO2 emitted
    pub fn emission_price(&self) -> MoneyPerEmissions {
        self.parameters.emission_price
    }

    /// How storage continuity is closed at the start of the year
    pub fn storage_boundary(&self) -> StorageBoundary {
        self.parameters.storage_boundary
    }

    /// The model's time index
    pub fn time_index(&self) -> &TimeIndex {
        &self.time_index
    }

    /// Iterate over the hours in chronological order
    pub fn iter_hours(&self) -> impl Iterator<Item = &HourID> {
        self.time_index.iter()
    }

    /// The hour whose storage level precedes `hour`.
    ///
    /// For the first hour this depends on the storage boundary policy: with
    /// [`StorageBoundary::Cyclic`] it is the last hour, while with [`StorageBoundary::EmptyStart`]
    /// there is no predecessor and the preceding level is zero.
    pub fn predecessor(&self, hour: &HourID) -> Option<&HourID> {
        match self.storage_boundary() {
            StorageBoundary::Cyclic => self.time_index.cyclic_predecessor(hour),
            StorageBoundary::EmptyStart => self.time_index.predecessor(hour),
        }
    }

    /// Iterate over the generation technologies
    pub fn iter_technologies(&self) -> indexmap::map::Values<'_, TechnologyID, Technology> {
        self.technologies.values()
    }

    /// Get a generation technology by ID
    pub fn technology(&self, id: &TechnologyID) -> Option<&Technology> {
        self.technologies.get(id)
    }

    /// Iterate over the storage technologies
    pub fn iter_storage(&self) -> indexmap::map::Values<'_, StorageID, StorageTechnology> {
        self.storage.values()
    }

    /// Get a storage technology by ID
    pub fn storage(&self, id: &StorageID) -> Option<&StorageTechnology> {
        self.storage.get(id)
    }

    /// Demand in the given hour
    pub fn demand(&self, hour: &HourID) -> Option<Energy> {
        self.demand.get(hour).copied()
    }

    /// Capacity factor for the given hour and technology
    pub fn capacity_factor(
        &self,
        hour: &HourID,
        technology: &TechnologyID,
    ) -> Option<Dimensionless> {
        self.capacity_factors
            .get(&(hour.clone(), technology.clone()))
            .copied()
    }
}

/// Check that a value is finite and non-negative
fn check_non_negative(value: f64, what: &str, owner: &str) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::new(format!(
            "{what} for {owner} must be a finite, non-negative number (got {value})"
        )))
    }
}

/// Check that a value is a proportion between 0 and 1
fn check_proportion(value: f64, what: &str, owner: &str) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::new(format!(
            "{what} for {owner} must be between 0 and 1 (got {value})"
        )))
    }
}

fn check_technology(technology: &Technology) -> Result<(), ConfigurationError> {
    let owner = format!("technology {}", technology.id);
    check_non_negative(technology.annual_capital_cost.value(), "Investment cost", &owner)?;
    check_non_negative(technology.variable_cost.value(), "Variable cost", &owner)?;
    check_proportion(technology.availability.value(), "Availability", &owner)?;
    check_non_negative(technology.emission_factor.value(), "Emission factor", &owner)
}

fn check_storage(storage: &StorageTechnology) -> Result<(), ConfigurationError> {
    let owner = format!("storage technology {}", storage.id);
    check_non_negative(storage.annual_storage_cost.value(), "Storage cost", &owner)
}

/// Check that demand covers exactly the hours in the time index and return it in time order
fn order_demand(
    time_index: &TimeIndex,
    mut demand: DemandMap,
) -> Result<DemandMap, ConfigurationError> {
    let mut ordered = DemandMap::with_capacity(time_index.len());
    for hour in time_index {
        let value = demand
            .swap_remove(hour)
            .ok_or_else(|| ConfigurationError::new(format!("Missing demand for hour {hour}")))?;
        check_non_negative(value.value(), "Demand", &format!("hour {hour}"))?;
        ordered.insert(hour.clone(), value);
    }

    if let Some(hour) = demand.keys().next() {
        return Err(ConfigurationError::new(format!(
            "Demand given for hour {hour}, which is not in the time index"
        )));
    }

    Ok(ordered)
}

/// Check that capacity factors cover every hour and technology and return them in time order
fn order_capacity_factors(
    time_index: &TimeIndex,
    technologies: &TechnologyMap,
    mut capacity_factors: CapacityFactorMap,
) -> Result<CapacityFactorMap, ConfigurationError> {
    let mut ordered = CapacityFactorMap::with_capacity(time_index.len() * technologies.len());
    for hour in time_index {
        for technology_id in technologies.keys() {
            let key = (hour.clone(), technology_id.clone());
            let value = capacity_factors.swap_remove(&key).ok_or_else(|| {
                ConfigurationError::new(format!(
                    "Missing capacity factor for technology {technology_id} in hour {hour}"
                ))
            })?;
            check_proportion(
                value.value(),
                "Capacity factor",
                &format!("technology {technology_id} in hour {hour}"),
            )?;
            ordered.insert(key, value);
        }
    }

    if let Some((hour, technology_id)) = capacity_factors.keys().next() {
        return Err(ConfigurationError::new(format!(
            "Capacity factor given for unknown hour/technology combination ({hour}, {technology_id})"
        )));
    }

    Ok(ordered)
}
