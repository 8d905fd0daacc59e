//! Role Level Value Objects
//!
//! A role level is an integer permission rank. Higher means more privilege
//! and comparisons use `>=`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Integer permission rank
pub type RoleLevel = i32;

/// Sorted, duplicate-free set of role levels held by an identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleLevels(BTreeSet<RoleLevel>);

impl RoleLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest level held, if any
    pub fn max(&self) -> Option<RoleLevel> {
        self.0.last().copied()
    }

    /// True iff at least one held level is `>= required`
    pub fn satisfies(&self, required: RoleLevel) -> bool {
        self.max().is_some_and(|max| max >= required)
    }

    pub fn contains(&self, level: RoleLevel) -> bool {
        self.0.contains(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Levels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = RoleLevel> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<RoleLevel> {
        self.iter().collect()
    }
}

impl FromIterator<RoleLevel> for RoleLevels {
    fn from_iter<I: IntoIterator<Item = RoleLevel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<RoleLevel>> for RoleLevels {
    fn from(levels: Vec<RoleLevel>) -> Self {
        levels.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_unique() {
        let levels: RoleLevels = vec![3, 1, 3, 2, 1].into();
        assert_eq!(levels.to_vec(), vec![1, 2, 3]);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels.max(), Some(3));
    }

    #[test]
    fn test_satisfies_uses_greater_or_equal() {
        let levels: RoleLevels = vec![1, 3].into();
        assert!(levels.satisfies(1));
        assert!(levels.satisfies(3));
        assert!(!levels.satisfies(4));
    }

    #[test]
    fn test_empty_satisfies_nothing() {
        let levels = RoleLevels::new();
        assert!(levels.is_empty());
        assert_eq!(levels.max(), None);
        assert!(!levels.satisfies(i32::MIN));
    }

    #[test]
    fn test_serializes_as_array() {
        let levels: RoleLevels = vec![2, 1].into();
        assert_eq!(serde_json::to_string(&levels).unwrap(), "[1,2]");
        let parsed: RoleLevels = serde_json::from_str("[5,5,4]").unwrap();
        assert_eq!(parsed.to_vec(), vec![4, 5]);
    }
}
