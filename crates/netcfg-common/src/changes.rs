//! Per-node change tracking.
//!
//! Every configuration node owns one [`ChangeSet`]. The tree-building path
//! marks the field names it assigns; emitters read the set once per apply
//! cycle to decide which leaves to serialize.

use std::collections::BTreeSet;
use std::fmt;

/// Set of field names explicitly marked as changed on one node.
///
/// Absence of a key means "not known to have changed". Sets only grow;
/// a node that needs a fresh set is rebuilt instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    keys: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a single field as changed.
    pub fn mark(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    /// Marks every field in `keys` as changed.
    pub fn mark_all<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
    }

    pub fn is_changed(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// True when every key in `keys` is marked. Vacuously true for an
    /// empty query.
    pub fn all_changed(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.keys.contains(*key))
    }

    /// True when at least one key in `keys` is marked.
    pub fn any_changed(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.keys.contains(*key))
    }

    /// True when the marked set is exactly `keys`, ignoring order and
    /// duplicates in the query.
    ///
    /// Emitters use this to tell "only X changed" apart from "X and Y
    /// changed".
    pub fn equals_exactly(&self, keys: &[&str]) -> bool {
        let query: BTreeSet<&str> = keys.iter().copied().collect();
        query.len() == self.keys.len() && query.iter().all(|key| self.keys.contains(*key))
    }

    /// Marked keys in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.keys {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(key)?;
            first = false;
        }
        Ok(())
    }
}
