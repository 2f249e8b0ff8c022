//! Edit loading and tree building.
//!
//! An edit list is a JSON array of `{"xpath": ..., "value": ...}` objects.
//! The first node of each path picks the tree it lands in:
//!
//! | first node | tree |
//! |------------|------|
//! | `network-instance` | [`NetworkInstances`] |
//! | `policy-definitions`, `defined-sets` | [`RoutingPolicy`] |
//! | `interface` | [`Interfaces`] |
//!
//! A leading `network-instances`, `routing-policy` or `interfaces`
//! container node is accepted and stripped.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use netcfg_model::{parse_xpath, ConfigNode, Interfaces, NetworkInstances, RoutingPolicy, XPathNode};

use crate::error::{NcmdError, NcmdResult};

/// One leaf assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub xpath: String,
    pub value: String,
}

impl Edit {
    pub fn new(xpath: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            value: value.into(),
        }
    }
}

/// Parses a JSON edit list.
pub fn parse_edits(text: &str) -> NcmdResult<Vec<Edit>> {
    Ok(serde_json::from_str(text)?)
}

/// Reads a JSON edit list from `path`.
pub fn load_edits(path: impl AsRef<Path>) -> NcmdResult<Vec<Edit>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| NcmdError::io(path, e))?;
    parse_edits(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    NetworkInstances,
    RoutingPolicy,
    Interfaces,
}

/// Strips an optional container node and picks the tree.
fn route<'a>(xpath: &str, nodes: &'a [XPathNode]) -> NcmdResult<(Root, &'a [XPathNode])> {
    let nodes = match nodes.first().map(|n| n.name.as_str()) {
        Some("network-instances" | "routing-policy" | "interfaces") => &nodes[1..],
        _ => nodes,
    };
    let root = match nodes.first().map(|n| n.name.as_str()) {
        Some("network-instance") => Root::NetworkInstances,
        Some("policy-definitions" | "defined-sets") => Root::RoutingPolicy,
        Some("interface") => Root::Interfaces,
        other => {
            return Err(NcmdError::UnsupportedRoot {
                root: other.unwrap_or_default().to_string(),
                xpath: xpath.to_string(),
            })
        }
    };
    Ok((root, nodes))
}

/// The three trees an edit list can touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTrees {
    pub instances: NetworkInstances,
    pub policy: RoutingPolicy,
    pub interfaces: Interfaces,
}

impl ConfigTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds trees from `edits`, stopping at the first bad edit.
    pub fn from_edits(edits: &[Edit]) -> NcmdResult<Self> {
        let mut trees = Self::new();
        for edit in edits {
            trees.put(edit)?;
        }
        Ok(trees)
    }

    /// Puts one edit into the tree its path addresses.
    pub fn put(&mut self, edit: &Edit) -> NcmdResult<()> {
        let nodes = parse_xpath(&edit.xpath)?;
        let (root, nodes) = route(&edit.xpath, &nodes)?;
        debug!(xpath = %edit.xpath, value = %edit.value, root = ?root, "put");

        let tree: &mut dyn ConfigNode = match root {
            Root::NetworkInstances => &mut self.instances,
            Root::RoutingPolicy => &mut self.policy,
            Root::Interfaces => &mut self.interfaces,
        };
        tree.put(nodes, &edit.value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_edits() {
        let edits = parse_edits(
            r#"[
                {"xpath": "/network-instance[name='mic']/config/name", "value": "mic"},
                {"xpath": "/interface[name='eth1']/config/mtu", "value": "1500"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            edits,
            vec![
                Edit::new("/network-instance[name='mic']/config/name", "mic"),
                Edit::new("/interface[name='eth1']/config/mtu", "1500"),
            ]
        );
    }

    #[test]
    fn test_parse_edits_rejects_bad_json() {
        assert!(matches!(
            parse_edits(r#"[{"xpath": "/a"}]"#),
            Err(NcmdError::Edits(_))
        ));
    }

    #[test]
    fn test_load_edits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"xpath": "/x", "value": "y"}}]"#).unwrap();
        assert_eq!(load_edits(file.path()).unwrap(), vec![Edit::new("/x", "y")]);

        assert!(matches!(
            load_edits("/nonexistent/edits.json"),
            Err(NcmdError::Io { .. })
        ));
    }

    #[test]
    fn test_edits_land_in_their_tree() {
        let trees = ConfigTrees::from_edits(&[
            Edit::new("/network-instance[name='mic']/config/name", "mic"),
            Edit::new(
                "/policy-definitions/policy-definition[name='p1']/config/name",
                "p1",
            ),
            Edit::new("/interface[name='eth1']/config/mtu", "1500"),
        ])
        .unwrap();

        assert!(trees.instances.instances.contains_key("mic"));
        assert!(trees.policy.policy_definitions.contains_key("p1"));
        assert_eq!(trees.interfaces.interfaces["eth1"].config.mtu, 1500);
    }

    #[test]
    fn test_container_prefix_is_stripped() {
        let trees = ConfigTrees::from_edits(&[Edit::new(
            "/network-instances/network-instance[name='mic']/config/name",
            "mic",
        )])
        .unwrap();
        assert!(trees.instances.instances.contains_key("mic"));
    }

    #[test]
    fn test_unsupported_root() {
        let err = ConfigTrees::from_edits(&[Edit::new("/system/config/hostname", "r1")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported edit root 'system' in /system/config/hostname"
        );
    }

    #[test]
    fn test_bad_value_is_model_error() {
        let err = ConfigTrees::from_edits(&[Edit::new(
            "/interface[name='eth1']/config/mtu",
            "jumbo",
        )])
        .unwrap_err();
        assert!(matches!(err, NcmdError::Model(_)));
    }
}
