//! Generation and storage technologies.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Dimensionless, EmissionsPerEnergy, MoneyPerCapacity, MoneyPerEnergy};
use indexmap::IndexMap;

define_id_type! {TechnologyID}
define_id_type! {StorageID}

/// A map of generation technologies, keyed by ID
pub type TechnologyMap = IndexMap<TechnologyID, Technology>;

/// A map of storage technologies, keyed by ID
pub type StorageMap = IndexMap<StorageID, StorageTechnology>;

/// A generation technology (e.g. wind, pv, gas)
#[derive(PartialEq, Debug, Clone)]
pub struct Technology {
    /// A unique identifier for the technology
    pub id: TechnologyID,
    /// A human-readable description
    pub description: String,
    /// Annuitised investment cost
    pub annual_capital_cost: MoneyPerCapacity,
    /// Cost per MWh generated
    pub variable_cost: MoneyPerEnergy,
    /// Fraction of capacity not lost to forced outages
    pub availability: Dimensionless,
    /// CO2 emitted per MWh generated
    pub emission_factor: EmissionsPerEnergy,
}
define_id_getter! {Technology, TechnologyID}

impl Technology {
    /// Whether the technology emits nothing when generating
    pub fn is_zero_emission(&self) -> bool {
        self.emission_factor == EmissionsPerEnergy(0.0)
    }
}

/// A storage technology (e.g. battery)
#[derive(PartialEq, Debug, Clone)]
pub struct StorageTechnology {
    /// A unique identifier for the storage technology
    pub id: StorageID,
    /// A human-readable description
    pub description: String,
    /// Annuitised cost per MWh of installed storage capacity
    pub annual_storage_cost: MoneyPerEnergy,
}
define_id_getter! {StorageTechnology, StorageID}
