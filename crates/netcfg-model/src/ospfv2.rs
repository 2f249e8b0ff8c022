//! OSPFv2 protocol tree.
//!
//! ```text
//! ospfv2
//!  +- global/config (router-id)
//!  +- areas/area[identifier]
//!      +- config (identifier)
//!      +- interfaces/interface[id]
//!          +- config (id, metric, passive, network-type, priority)
//!          +- timers (dead-interval, hello-interval)
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::network_instance::ProtocolKey;
use crate::node::{keyed_entry, string_key, ConfigContainer, ConfigNode};
use crate::processor::{ordered, Ospfv2Processor, Processor};
use crate::types::{parse_bool, parse_ip, parse_uint, OspfNetworkType};
use crate::xpath::XPathNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2 {
    pub changes: ChangeSet,
    pub global: ConfigContainer<Ospfv2GlobalConfig>,
    pub areas: BTreeMap<String, Ospfv2Area>,
}

impl ConfigNode for Ospfv2 {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match (node.name.as_str(), nodes.get(1)) {
            ("global", _) => self.global.put(&nodes[1..], value)?,
            ("areas", Some(area)) if area.name == "area" => {
                keyed_entry(&mut self.areas, area, "identifier", string_key, |id| {
                    Ospfv2Area::new(id.as_str())
                })?
                .put(&nodes[2..], value)?;
            }
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2GlobalConfig {
    pub changes: ChangeSet,
    pub router_id: Option<IpAddr>,
}

impl ConfigNode for Ospfv2GlobalConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "router-id" {
            self.router_id = Some(parse_ip("router-id", value)?);
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2Area {
    pub changes: ChangeSet,
    pub identifier: String,
    pub config: Ospfv2AreaConfig,
    pub interfaces: BTreeMap<String, Ospfv2Interface>,
}

impl Ospfv2Area {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for Ospfv2Area {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match (node.name.as_str(), nodes.get(1)) {
            ("config", _) => self.config.put(&nodes[1..], value)?,
            ("interfaces", Some(iface)) if iface.name == "interface" => {
                keyed_entry(&mut self.interfaces, iface, "id", string_key, |id| {
                    Ospfv2Interface::new(id.as_str())
                })?
                .put(&nodes[2..], value)?;
            }
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2AreaConfig {
    pub changes: ChangeSet,
    pub identifier: String,
}

impl ConfigNode for Ospfv2AreaConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "identifier" {
            self.identifier = value.to_string();
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2Interface {
    pub changes: ChangeSet,
    pub id: String,
    pub config: Ospfv2InterfaceConfig,
    pub timers: Ospfv2InterfaceTimers,
}

impl Ospfv2Interface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for Ospfv2Interface {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "timers" => self.timers.put(&nodes[1..], value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ospfv2InterfaceConfig {
    pub changes: ChangeSet,
    pub id: String,
    pub metric: u16,
    pub passive: bool,
    pub network_type: OspfNetworkType,
    pub priority: u8,
}

impl Default for Ospfv2InterfaceConfig {
    fn default() -> Self {
        Self {
            changes: ChangeSet::new(),
            id: String::new(),
            metric: 0,
            passive: false,
            network_type: OspfNetworkType::BROADCAST_NETWORK,
            priority: 1,
        }
    }
}

impl ConfigNode for Ospfv2InterfaceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "id" => self.id = value.to_string(),
            "metric" => self.metric = parse_uint("metric", value)?,
            "passive" => self.passive = parse_bool("passive", value)?,
            "network-type" => self.network_type = OspfNetworkType::parse(value)?,
            "priority" => self.priority = parse_uint("priority", value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ospfv2InterfaceTimers {
    pub changes: ChangeSet,
    pub dead_interval: u32,
    pub hello_interval: u32,
}

impl ConfigNode for Ospfv2InterfaceTimers {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "dead-interval" => self.dead_interval = parse_uint("dead-interval", value)?,
            "hello-interval" => self.hello_interval = parse_uint("hello-interval", value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Walks an OSPFv2 tree: the ospfv2 callback, then global and areas.
pub fn process_ospfv2(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    ospf: &Ospfv2,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Ospfv2,
        Global,
        Areas,
    }

    let Some(g) = p.as_ospfv2() else {
        return Ok(());
    };

    tracing::debug!(instance = name, changes = %ospf.changes, "Processing ospfv2");

    for step in ordered([Step::Ospfv2, Step::Global, Step::Areas], reverse) {
        match step {
            Step::Ospfv2 => g.ospfv2(name, key, ospf)?,
            Step::Global
                if ospf.changes.is_changed("global") && ospf.global.changes.is_changed("config") =>
            {
                g.ospfv2_global_config(name, key, &ospf.global.config)?
            }
            Step::Areas if ospf.changes.is_changed("areas") => {
                for area in ospf.areas.values() {
                    process_ospfv2_area(g, reverse, name, key, area)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_ospfv2_area(
    g: &mut dyn Ospfv2Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    area: &Ospfv2Area,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Area,
        Config,
        Interfaces,
    }

    let area_id = area.identifier.as_str();
    for step in ordered([Step::Area, Step::Config, Step::Interfaces], reverse) {
        match step {
            Step::Area if area.changes.is_changed("identifier") => {
                g.ospfv2_area(name, key, area_id, area)?
            }
            Step::Config if area.changes.is_changed("config") => {
                g.ospfv2_area_config(name, key, area_id, &area.config)?
            }
            Step::Interfaces if area.changes.is_changed("interfaces") => {
                for iface in area.interfaces.values() {
                    process_ospfv2_interface(g, reverse, name, key, area_id, iface)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_ospfv2_interface(
    g: &mut dyn Ospfv2Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    area_id: &str,
    iface: &Ospfv2Interface,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Interface,
        Config,
        Timers,
    }

    let ifid = iface.id.as_str();
    for step in ordered([Step::Interface, Step::Config, Step::Timers], reverse) {
        match step {
            Step::Interface if iface.changes.is_changed("id") => {
                g.ospfv2_interface(name, key, area_id, ifid, iface)?
            }
            Step::Config if iface.changes.is_changed("config") => {
                g.ospfv2_interface_config(name, key, area_id, ifid, &iface.config)?
            }
            Step::Timers if iface.changes.is_changed("timers") => {
                g.ospfv2_interface_timers(name, key, area_id, ifid, &iface.timers)?
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::parse_xpath;

    #[test]
    fn test_put_interface_timers() {
        let mut ospf = Ospfv2::default();
        let base = "/areas/area[identifier='0.0.0.0']/interfaces/interface[id='eth1']";
        for (leaf, value) in [
            ("config/metric", "100"),
            ("config/network-type", "oc-ospf-types:POINT_TO_POINT_NETWORK"),
            ("timers/dead-interval", "40"),
            ("timers/hello-interval", "10"),
        ] {
            ospf.put(&parse_xpath(&format!("{}/{}", base, leaf)).unwrap(), value)
                .unwrap();
        }

        let iface = &ospf.areas["0.0.0.0"].interfaces["eth1"];
        assert_eq!(iface.config.metric, 100);
        assert_eq!(
            iface.config.network_type,
            OspfNetworkType::POINT_TO_POINT_NETWORK
        );
        assert_eq!(iface.config.priority, 1);
        assert_eq!(iface.timers.dead_interval, 40);
        assert_eq!(iface.timers.hello_interval, 10);
        assert!(iface.changes.equals_exactly(&["config", "timers"]));
    }

    #[test]
    fn test_interface_config_defaults() {
        let config = Ospfv2InterfaceConfig::default();
        assert_eq!(config.network_type, OspfNetworkType::BROADCAST_NETWORK);
        assert_eq!(config.priority, 1);
    }

    #[test]
    fn test_put_area_without_identifier() {
        let mut ospf = Ospfv2::default();
        let err = ospf
            .put(&parse_xpath("/areas/area/config/identifier").unwrap(), "0")
            .unwrap_err();
        assert_eq!(err.to_string(), "area@identifier not found. area");
    }
}
