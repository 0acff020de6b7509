//! Desired-vs-live set differences for principals and tags.
//!
//! Pure functions: no registry calls. Output order follows input order but
//! callers must not depend on it.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use crate::registry::Tag;

/// Principals to grant and revoke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl PrincipalDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Tags to put and tag keys to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Desired tags with no live tag of the same key *and* value. Putting a
    /// tag whose key already exists overwrites the old value.
    pub to_add: Vec<Tag>,
    /// Live keys absent from the desired key set.
    pub keys_to_remove: Vec<String>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.keys_to_remove.is_empty()
    }
}

/// `left \ right`, de-duplicated, in `left` order.
fn difference<T: Eq + Hash + Clone>(left: &[T], right: &[T]) -> Vec<T> {
    let right: HashSet<&T> = right.iter().collect();
    let mut seen = HashSet::new();
    left.iter()
        .filter(|item| !right.contains(item) && seen.insert(*item))
        .cloned()
        .collect()
}

/// `to_add = desired \ live`, `to_remove = live \ desired`.
pub fn diff_principals(desired: &[String], live: &[String]) -> PrincipalDiff {
    PrincipalDiff {
        to_add: difference(desired, live),
        to_remove: difference(live, desired),
    }
}

/// Compare desired tags against the live tag list.
pub fn diff_tags(desired: &BTreeMap<String, String>, live: &[Tag]) -> TagDiff {
    let live_pairs: HashSet<(&str, &str)> = live
        .iter()
        .map(|t| (t.key.as_str(), t.value.as_str()))
        .collect();

    let to_add = desired
        .iter()
        .filter(|(k, v)| !live_pairs.contains(&(k.as_str(), v.as_str())))
        .map(|(k, v)| Tag::new(k, v))
        .collect();

    let mut seen = HashSet::new();
    let keys_to_remove = live
        .iter()
        .filter(|&t| !desired.contains_key(&t.key) && seen.insert(t.key.as_str()))
        .map(|t| t.key.clone())
        .collect();

    TagDiff {
        to_add,
        keys_to_remove,
    }
}
