//! Annuitisation of investment costs.
use crate::units::{Dimensionless, MoneyPerCapacity, MoneyPerEnergy};

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF converts an up-front capital cost into an equivalent constant annual charge over the
/// lifetime of an investment.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let exponent = i32::try_from(lifetime).unwrap_or(i32::MAX);
    let factor = (Dimensionless(1.0) + discount_rate).powi(exponent);
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the annual capital cost of generation capacity per MW
pub fn annual_capital_cost(
    capital_cost: MoneyPerCapacity,
    lifetime: u32,
    discount_rate: Dimensionless,
) -> MoneyPerCapacity {
    capital_cost * capital_recovery_factor(lifetime, discount_rate)
}

/// Calculates the annual capital cost of storage capacity per MWh
pub fn annual_storage_cost(
    capital_cost: MoneyPerEnergy,
    lifetime: u32,
    discount_rate: Dimensionless,
) -> MoneyPerEnergy {
    capital_cost * capital_recovery_factor(lifetime, discount_rate)
}
