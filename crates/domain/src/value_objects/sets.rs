//! Set-valued columns.
//!
//! Stored as arrays, compared as multisets: order never matters, duplicates are
//! kept and counted. No uniqueness is enforced at this layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unordered collection of primitive values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetField<T>(Vec<T>);

/// Set of integer ids (segments, follows, groups, memberships).
pub type IdSet = SetField<i64>;

/// Set of strings (profile types, alt names, email domains, roles).
pub type TagSet = SetField<String>;

impl<T> SetField<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, value: T) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T: Clone> SetField<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }
}

impl<T: PartialEq> SetField<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }
}

impl TagSet {
    pub fn contains_str(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }
}

impl<T: Ord + Clone> PartialEq for SetField<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut left = self.0.clone();
        let mut right = other.0.clone();
        left.sort_unstable();
        right.sort_unstable();
        left == right
    }
}

impl<T: Ord + Clone> Eq for SetField<T> {}

impl<T> From<Vec<T>> for SetField<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

impl<T> FromIterator<T> for SetField<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl<T> IntoIterator for SetField<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: fmt::Display> fmt::Display for SetField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}
