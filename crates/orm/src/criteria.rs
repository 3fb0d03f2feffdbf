use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::DataType;
use crate::error::{Error, Result};
use crate::schema::Schema;

/// Ordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// SQL keyword, always lowercase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Keyset comparison operator: rows strictly after the cursor.
    #[must_use]
    pub const fn comparator(self) -> &'static str {
        match self {
            Self::Asc => ">",
            Self::Desc => "<",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(Error::InvalidDirection(s.to_string()))
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality predicates keyed by logical field name.
///
/// Predicates keep insertion order, so the generated SQL text is
/// deterministic. Setting the same field twice replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    predicates: Vec<(String, DataType)>,
}

impl Criteria {
    /// Creates an empty set of predicates.
    #[must_use]
    pub const fn new() -> Self {
        Self { predicates: Vec::new() }
    }

    /// Adds an equality predicate (field = value).
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<DataType>) -> Self {
        self.insert(field, value);
        self
    }

    /// Adds or replaces an equality predicate.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DataType>) {
        let field = field.into();
        let value = value.into();
        if let Some(existing) = self.predicates.iter_mut().find(|(name, _)| *name == field) {
            existing.1 = value;
        } else {
            self.predicates.push((field, value));
        }
    }

    /// Number of predicates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns `true` when there are no predicates.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Predicates in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataType)> {
        self.predicates.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Map each predicate to its column, keeping order.
    pub(crate) fn resolve<E>(&self, schema: &Schema<E>) -> Result<Vec<(&'static str, DataType)>> {
        self.predicates
            .iter()
            .map(|(field, value)| Ok((schema.resolve(field)?.column(), value.clone())))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Criteria
where
    K: Into<String>,
    V: Into<DataType>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (field, value) in iter {
            criteria.insert(field, value);
        }
        criteria
    }
}

// Sorted maps give key order.
impl<K, V> From<BTreeMap<K, V>> for Criteria
where
    K: Into<String>,
    V: Into<DataType>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}
