//! Edit fixtures for common configuration patterns
//!
//! An [`EditSet`] is an ordered list of `(xpath, value)` edits. It can be
//! applied to any tree directly or written out in the JSON form `ncmd`
//! reads.

use std::io::{self, Write};

use netcfg_model::{parse_xpath, ConfigNode, ModelResult};
use serde_json::json;
use tempfile::NamedTempFile;

/// One leaf assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub xpath: String,
    pub value: String,
}

/// Ordered list of edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edit
    pub fn edit(mut self, xpath: impl Into<String>, value: impl ToString) -> Self {
        self.edits.push(Edit {
            xpath: xpath.into(),
            value: value.to_string(),
        });
        self
    }

    /// Append the edits of `other`
    pub fn merge(mut self, other: EditSet) -> Self {
        self.edits.extend(other.edits);
        self
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Put every edit into `node`, in order
    pub fn apply(&self, node: &mut dyn ConfigNode) -> ModelResult<()> {
        for edit in &self.edits {
            node.put(&parse_xpath(&edit.xpath)?, &edit.value)?;
        }
        Ok(())
    }

    /// `[{"xpath": ..., "value": ...}, ...]`
    pub fn to_json(&self) -> String {
        let edits: Vec<_> = self
            .edits
            .iter()
            .map(|e| json!({ "xpath": e.xpath, "value": e.value }))
            .collect();
        serde_json::Value::Array(edits).to_string()
    }

    /// Write the JSON form to a temporary file
    pub fn write_temp(&self) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(self.to_json().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

fn protocol_path(instance: &str, ident: &str, name: &str) -> String {
    format!(
        "/network-instance[name='{}']/protocols/protocol[identifier='{}'][name='{}']",
        instance, ident, name
    )
}

/// BGP fixtures, rooted at `network-instances`
pub mod bgp_fixtures {
    use super::*;

    pub fn bgp_path(instance: &str) -> String {
        format!("{}/bgp", protocol_path(instance, "BGP", "bgp"))
    }

    /// Global AS and router id
    pub fn global(instance: &str, as_number: u32, router_id: &str) -> EditSet {
        let base = format!("{}/global/config", bgp_path(instance));
        EditSet::new()
            .edit(format!("{}/as", base), as_number)
            .edit(format!("{}/router-id", base), router_id)
    }

    /// Zebra connection redistributing connected routes
    pub fn zebra(instance: &str, version: u32) -> EditSet {
        let base = format!("{}/zebra/config", bgp_path(instance));
        EditSet::new()
            .edit(format!("{}/enabled", base), "true")
            .edit(format!("{}/version", base), version)
            .edit(format!("{}/redistribute-routes", base), "DIRECTLY_CONNECTED")
    }

    /// Neighbor with its address and peer AS
    pub fn neighbor(instance: &str, addr: &str, peer_as: u32) -> EditSet {
        let base = format!(
            "{}/neighbors/neighbor[neighbor-address='{}']",
            bgp_path(instance),
            addr
        );
        EditSet::new()
            .edit(format!("{}/neighbor-address", base), addr)
            .edit(format!("{}/config/neighbor-address", base), addr)
            .edit(format!("{}/config/peer-as", base), peer_as)
    }
}

/// OSPFv2 fixtures, rooted at `network-instances`
pub mod ospf_fixtures {
    use super::*;

    pub fn ospf_path(instance: &str) -> String {
        format!("{}/ospfv2", protocol_path(instance, "OSPF", "ospf"))
    }

    pub fn router_id(instance: &str, router_id: &str) -> EditSet {
        EditSet::new().edit(
            format!("{}/global/config/router-id", ospf_path(instance)),
            router_id,
        )
    }

    /// Interface cost in an area
    pub fn interface_metric(instance: &str, area: &str, ifname: &str, metric: u16) -> EditSet {
        let base = format!(
            "{}/areas/area[identifier='{}']/interfaces/interface[id='{}']",
            ospf_path(instance),
            area,
            ifname
        );
        EditSet::new().edit(format!("{}/config/metric", base), metric)
    }
}

/// MPLS/LDP fixtures, rooted at `network-instances`
pub mod ldp_fixtures {
    use super::*;

    pub fn ldp_path(instance: &str) -> String {
        format!(
            "/network-instance[name='{}']/mpls/signaling-protocols/ldp/global",
            instance
        )
    }

    pub fn lsr_id(instance: &str, lsr_id: &str) -> EditSet {
        EditSet::new().edit(format!("{}/config/lsr-id", ldp_path(instance)), lsr_id)
    }
}

/// Static route fixtures, rooted at `network-instances`
pub mod static_fixtures {
    use super::*;

    pub fn nexthop(instance: &str, ip: &str, prefix_len: u8, index: &str, next_hop: &str) -> EditSet {
        let base = format!(
            "{}/static-routes/static[ip='{}'][prefix-length='{}']/next-hops/next-hop[index='{}']",
            protocol_path(instance, "STATIC", "static"),
            ip,
            prefix_len,
            index
        );
        EditSet::new().edit(format!("{}/config/next-hop", base), next_hop)
    }
}

/// Interface fixtures, rooted at `interfaces`
pub mod interface_fixtures {
    use super::*;

    pub fn ethernet(name: &str, mtu: u16) -> EditSet {
        let base = format!("/interface[name='{}']", name);
        EditSet::new()
            .edit(format!("{}/name", base), name)
            .edit(format!("{}/config/name", base), name)
            .edit(format!("{}/config/type", base), "iana-if-type:ethernetCsmacd")
            .edit(format!("{}/config/mtu", base), mtu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcfg_model::NetworkInstances;

    #[test]
    fn test_edit_set_to_json() {
        let edits = EditSet::new().edit("/a/b", "1").edit("/a/c", 2);
        let value: serde_json::Value = serde_json::from_str(&edits.to_json()).unwrap();
        assert_eq!(
            value,
            json!([
                { "xpath": "/a/b", "value": "1" },
                { "xpath": "/a/c", "value": "2" },
            ])
        );
    }

    #[test]
    fn test_edit_set_apply() {
        let mut nis = NetworkInstances::new();
        bgp_fixtures::global("mic", 65000, "10.0.0.1")
            .merge(bgp_fixtures::neighbor("mic", "10.0.0.2", 65001))
            .apply(&mut nis)
            .unwrap();

        let ni = &nis.instances["mic"];
        assert_eq!(ni.protocols.len(), 1);
        let bgp = &ni.protocols.values().next().unwrap().bgp;
        assert_eq!(bgp.global.config.as_number, 65000);
        assert_eq!(bgp.neighbors["10.0.0.2"].config.peer_as, 65001);
    }

    #[test]
    fn test_write_temp() {
        let file = EditSet::new().edit("/x", "y").write_temp().unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!([{ "xpath": "/x", "value": "y" }]));
    }
}
