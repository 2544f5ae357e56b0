//! The hourly time index over which the model is defined.
use crate::id::define_id_type;
use crate::model::ConfigurationError;
use indexmap::{Equivalent, IndexSet};
use std::hash::Hash;

define_id_type! {HourID}

/// The number of hourly steps in a (non-leap) year
pub const HOURS_PER_YEAR: usize = 8760;

/// An ordered sequence of distinct hours.
///
/// The order is the order in which hours were supplied and defines the predecessor relation used
/// for storage continuity.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeIndex(IndexSet<HourID>);

impl TimeIndex {
    /// Create a new [`TimeIndex`] from hours in chronological order.
    ///
    /// Fails if there are no hours or if an hour appears more than once.
    pub fn new<I>(hours: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = HourID>,
    {
        let mut set = IndexSet::new();
        for hour in hours {
            if !set.insert(hour.clone()) {
                return Err(ConfigurationError::new(format!(
                    "Hour {hour} appears more than once in the time index"
                )));
            }
        }

        if set.is_empty() {
            return Err(ConfigurationError::new("The time index is empty"));
        }

        Ok(Self(set))
    }

    /// Create a time index of `num_hours` hours named `h1`, `h2`, ...
    pub fn hourly(num_hours: usize) -> Result<Self, ConfigurationError> {
        Self::new((1..=num_hours).map(|i| HourID::from(format!("h{i}"))))
    }

    /// The number of hours
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the index is empty (never true for a constructed index)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the index covers a full year
    pub fn is_full_year(&self) -> bool {
        self.len() == HOURS_PER_YEAR
    }

    /// Whether the given hour is part of this index
    pub fn contains<Q>(&self, hour: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<HourID>,
    {
        self.0.contains(hour)
    }

    /// Get the position of the given hour
    pub fn position<Q>(&self, hour: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<HourID>,
    {
        self.0.get_index_of(hour)
    }

    /// Look up an hour by name
    pub fn get<Q>(&self, hour: &Q) -> Option<&HourID>
    where
        Q: ?Sized + Hash + Equivalent<HourID>,
    {
        self.0.get(hour)
    }

    /// Iterate over the hours in order
    pub fn iter(&self) -> indexmap::set::Iter<'_, HourID> {
        self.0.iter()
    }

    /// The first hour
    pub fn first(&self) -> &HourID {
        self.0.first().expect("Time index cannot be empty")
    }

    /// The last hour
    pub fn last(&self) -> &HourID {
        self.0.last().expect("Time index cannot be empty")
    }

    /// The hour preceding `hour`, or `None` for the first hour (or an unknown hour)
    pub fn predecessor<Q>(&self, hour: &Q) -> Option<&HourID>
    where
        Q: ?Sized + Hash + Equivalent<HourID>,
    {
        let idx = self.position(hour)?;
        idx.checked_sub(1).and_then(|prev| self.0.get_index(prev))
    }

    /// The hour preceding `hour`, wrapping the first hour round to the last one
    pub fn cyclic_predecessor<Q>(&self, hour: &Q) -> Option<&HourID>
    where
        Q: ?Sized + Hash + Equivalent<HourID>,
    {
        let idx = self.position(hour)?;
        let prev = if idx == 0 { self.len() - 1 } else { idx - 1 };
        self.0.get_index(prev)
    }
}

impl<'a> IntoIterator for &'a TimeIndex {
    type Item = &'a HourID;
    type IntoIter = indexmap::set::Iter<'a, HourID>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
