//! Unit types for the physical and monetary quantities used in the model.
//!
//! Quantities are stored as `f64` newtypes so that only dimensionally valid products can be formed,
//! e.g. a [`MoneyPerCapacity`] multiplied by a [`Capacity`] gives [`Money`].
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new quantity from an `f64`
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// The underlying value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

/// A dimensionless quantity (fractions, factors)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    /// Create a new dimensionless value
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }

    /// The underlying value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Dimensionless {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl ApproxEq for Dimensionless {
    type Margin = F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        self.0.approx_eq(other.0, margin)
    }
}

// Base quantities
unit_struct!(Money, "An amount of money (annual, in the model currency)");
unit_struct!(Capacity, "Installed generation capacity (MW)");
unit_struct!(Energy, "An amount of energy (MWh)");
unit_struct!(Emissions, "A quantity of CO2 emissions (tCO2)");

// Derived quantities
unit_struct!(MoneyPerCapacity, "Annual cost per unit of installed capacity (money/MW/year)");
unit_struct!(MoneyPerEnergy, "Cost per unit of energy (money/MWh)");
unit_struct!(EmissionsPerEnergy, "Emission factor (tCO2/MWh)");
unit_struct!(MoneyPerEmissions, "Emission price (money/tCO2)");

// Multiplication rules
impl_mul!(MoneyPerCapacity, Capacity, Money);
impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(EmissionsPerEnergy, Energy, Emissions);
impl_mul!(MoneyPerEmissions, Emissions, Money);

// Division rules
impl_div!(Money, Capacity, MoneyPerCapacity);
impl_div!(Money, Energy, MoneyPerEnergy);
impl_div!(Energy, Energy, Dimensionless);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_dimensional_products() {
        assert_eq!(MoneyPerCapacity(10.0) * Capacity(3.0), Money(30.0));
        assert_eq!(Energy(4.0) * MoneyPerEnergy(2.5), Money(10.0));
        assert_eq!(EmissionsPerEnergy(0.4) * Energy(10.0), Emissions(4.0));
        assert_eq!(MoneyPerEmissions(50.0) * Emissions(2.0), Money(100.0));
        assert_eq!(Capacity(10.0) * Dimensionless(0.5), Capacity(5.0));
    }

    #[test]
    fn test_sum_and_share() {
        let total: Energy = [Energy(1.0), Energy(2.5), Energy(0.5)].into_iter().sum();
        assert_eq!(total, Energy(4.0));
        assert_approx_eq!(Dimensionless, Energy(1.0) / total, Dimensionless(0.25));
    }
}
