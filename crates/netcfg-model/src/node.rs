//! Building blocks shared by every configuration tree.

use netcfg_common::ChangeSet;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};
use crate::xpath::XPathNode;

/// A change-tracked subtree that accepts leaf assignments by path.
pub trait ConfigNode {
    /// Assigns `value` to the leaf addressed by `nodes`, relative to this
    /// node, and marks the first step changed.
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()>;

    fn changes(&self) -> &ChangeSet;
}

/// A container whose only child is `config`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigContainer<C> {
    pub changes: ChangeSet,
    pub config: C,
}

impl<C: ConfigNode> ConfigNode for ConfigContainer<C> {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "config" {
            self.config.put(&nodes[1..], value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Returns the predicate value `key` of a list node.
pub(crate) fn key_attr<'a>(node: &'a XPathNode, key: &str) -> ModelResult<&'a str> {
    node.attr(key).ok_or_else(|| ModelError::MissingKey {
        node: node.name.clone(),
        key: key.to_string(),
        path: node.to_string(),
    })
}

/// Looks up the list entry addressed by `node`, creating it on first sight.
pub(crate) fn keyed_entry<'a, K, V>(
    map: &'a mut BTreeMap<K, V>,
    node: &XPathNode,
    key: &str,
    parse: impl FnOnce(&str) -> ModelResult<K>,
    new: impl FnOnce(&K) -> V,
) -> ModelResult<&'a mut V>
where
    K: Ord + Clone,
{
    let id = parse(key_attr(node, key)?)?;
    Ok(match map.entry(id) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let value = new(entry.key());
            entry.insert(value)
        }
    })
}

/// Identity key parser for string-keyed lists.
pub(crate) fn string_key(s: &str) -> ModelResult<String> {
    Ok(s.to_string())
}
