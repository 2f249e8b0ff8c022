//! Network instance tree.
//!
//! ```text
//! network-instances/network-instance[name]
//!  +- config (name, type, description, router-id, route-distinguisher, route-target)
//!  +- loopbacks/loopback[id] {config, addresses/address[index]/config}
//!  +- interfaces/interface[id]/config (id, interface, subinterface)
//!  +- mpls
//!  +- protocols/protocol[identifier][name]
//!      +- config (identifier, name)
//!      +- static-routes, ospfv2, bgp
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::bgp::{process_bgp, Bgp};
use crate::error::ModelResult;
use crate::mpls::{process_mpls, Mpls};
use crate::node::{key_attr, keyed_entry, string_key, ConfigNode};
use crate::ospfv2::{process_ospfv2, Ospfv2};
use crate::processor::{ordered, NetworkInstanceLoopbackProcessor, Processor};
use crate::static_route::{process_static_routes, put_static_routes, StaticRoute, StaticRouteKey};
use crate::types::{parse_ip, parse_uint, InstallProtocolType, NetworkInstanceType};
use crate::xpath::XPathNode;

/// Children of the `network-instances` container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstances {
    pub changes: ChangeSet,
    pub instances: BTreeMap<String, NetworkInstance>,
}

impl NetworkInstances {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigNode for NetworkInstances {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "network-instance" {
            keyed_entry(&mut self.instances, node, "name", string_key, |name| {
                NetworkInstance::new(name.as_str())
            })?
            .put(&nodes[1..], value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstance {
    pub changes: ChangeSet,
    pub name: String,
    pub config: NetworkInstanceConfig,
    pub interfaces: BTreeMap<String, NetworkInstanceInterface>,
    pub loopbacks: BTreeMap<String, Loopback>,
    pub mpls: Mpls,
    pub protocols: BTreeMap<ProtocolKey, Protocol>,
}

impl NetworkInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn put_protocols(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "protocol" {
            return Ok(());
        }
        let key = ProtocolKey::new(
            InstallProtocolType::parse(key_attr(node, "identifier")?)?,
            key_attr(node, "name")?,
        );
        self.protocols
            .entry(key)
            .or_insert_with_key(|key| Protocol::new(key.clone()))
            .put(&nodes[1..], value)
    }
}

impl ConfigNode for NetworkInstance {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        let rest = &nodes[1..];
        match (node.name.as_str(), rest.first()) {
            ("config", _) => self.config.put(rest, value)?,
            ("interfaces", Some(iface)) if iface.name == "interface" => {
                keyed_entry(&mut self.interfaces, iface, "id", string_key, |id| {
                    NetworkInstanceInterface::new(id.as_str())
                })?
                .put(&rest[1..], value)?;
            }
            ("loopbacks", Some(lo)) if lo.name == "loopback" => {
                keyed_entry(&mut self.loopbacks, lo, "id", string_key, |id| {
                    Loopback::new(id.as_str())
                })?
                .put(&rest[1..], value)?;
            }
            ("mpls", _) => self.mpls.put(rest, value)?,
            ("protocols", _) => self.put_protocols(rest, value)?,
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
pub struct NetworkInstanceConfig {
    pub changes: ChangeSet,
    pub name: String,
    pub instance_type: NetworkInstanceType,
    pub description: String,
    pub router_id: Option<IpAddr>,
    pub route_distinguisher: String,
    pub route_target: String,
}

/// Validates a route distinguisher or target: `<asn>:<nn>` or
/// `<ipv4>:<nn>`.
fn parse_route_distinguisher(field: &str, value: &str) -> ModelResult<String> {
    let invalid = || crate::error::ModelError::invalid_value(field, value);
    let (admin, assigned) = value.rsplit_once(':').ok_or_else(invalid)?;
    parse_uint::<u32>(field, assigned).map_err(|_| invalid())?;
    if admin.parse::<std::net::Ipv4Addr>().is_err() {
        parse_uint::<u32>(field, admin).map_err(|_| invalid())?;
    }
    Ok(value.to_string())
}

impl ConfigNode for NetworkInstanceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "name" => self.name = value.to_string(),
            "type" => self.instance_type = NetworkInstanceType::parse(value)?,
            "description" => self.description = value.to_string(),
            "router-id" => self.router_id = Some(parse_ip("router-id", value)?),
            "route-distinguisher" => {
                self.route_distinguisher = parse_route_distinguisher("route-distinguisher", value)?
            }
            "route-target" => {
                self.route_target = parse_route_distinguisher("route-target", value)?
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

/// Interface bound to a network instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstanceInterface {
    pub changes: ChangeSet,
    pub id: String,
    pub config: NetworkInstanceInterfaceConfig,
}

impl NetworkInstanceInterface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for NetworkInstanceInterface {
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstanceInterfaceConfig {
    pub changes: ChangeSet,
    pub id: String,
    pub interface: String,
    pub subinterface: u32,
}

impl ConfigNode for NetworkInstanceInterfaceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "id" => self.id = value.to_string(),
            "interface" => self.interface = value.to_string(),
            "subinterface" => self.subinterface = parse_uint("subinterface", value)?,
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
pub struct Loopback {
    pub changes: ChangeSet,
    pub id: String,
    pub config: LoopbackConfig,
    pub addresses: BTreeMap<String, LoopbackAddress>,
}

impl Loopback {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for Loopback {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match (node.name.as_str(), nodes.get(1)) {
            ("config", _) => self.config.put(&nodes[1..], value)?,
            ("addresses", Some(addr)) if addr.name == "address" => {
                keyed_entry(&mut self.addresses, addr, "index", string_key, |index| {
                    LoopbackAddress::new(index.as_str())
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
pub struct LoopbackConfig {
    pub changes: ChangeSet,
    pub id: String,
}

impl ConfigNode for LoopbackConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "id" {
            self.id = value.to_string();
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopbackAddress {
    pub changes: ChangeSet,
    pub index: String,
    pub config: LoopbackAddressConfig,
}

impl LoopbackAddress {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for LoopbackAddress {
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopbackAddressConfig {
    pub changes: ChangeSet,
    pub index: String,
    pub ip: Option<IpAddr>,
    pub prefix_length: u8,
}

impl ConfigNode for LoopbackAddressConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "index" => self.index = value.to_string(),
            "ip" => self.ip = Some(parse_ip("ip", value)?),
            "prefix-length" => self.prefix_length = parse_uint("prefix-length", value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Key of a protocol entry: `[identifier][name]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolKey {
    pub ident: InstallProtocolType,
    pub name: String,
}

impl ProtocolKey {
    pub fn new(ident: InstallProtocolType, name: impl Into<String>) -> Self {
        Self {
            ident,
            name: name.into(),
        }
    }
}

impl fmt::Display for ProtocolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ident, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protocol {
    pub changes: ChangeSet,
    pub key: ProtocolKey,
    pub config: ProtocolConfig,
    pub static_routes: BTreeMap<StaticRouteKey, StaticRoute>,
    pub ospfv2: Ospfv2,
    pub bgp: Bgp,
}

impl Protocol {
    pub fn new(key: ProtocolKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }
}

impl ConfigNode for Protocol {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        let rest = &nodes[1..];
        match node.name.as_str() {
            "config" => self.config.put(rest, value)?,
            "static-routes" => put_static_routes(&mut self.static_routes, rest, value)?,
            "ospfv2" => self.ospfv2.put(rest, value)?,
            "bgp" => self.bgp.put(rest, value)?,
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
pub struct ProtocolConfig {
    pub changes: ChangeSet,
    pub identifier: InstallProtocolType,
    pub name: String,
}

impl ConfigNode for ProtocolConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "identifier" => self.identifier = InstallProtocolType::parse(value)?,
            "name" => self.name = value.to_string(),
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Walks every network instance.
pub fn process_network_instances(
    p: &mut dyn Processor,
    reverse: bool,
    instances: &NetworkInstances,
) -> ModelResult<()> {
    for ni in instances.instances.values() {
        process_network_instance(p, reverse, ni)?;
    }
    Ok(())
}

/// Walks one network instance: its own callbacks, then loopbacks,
/// interfaces, mpls and protocols.
pub fn process_network_instance(
    p: &mut dyn Processor,
    reverse: bool,
    ni: &NetworkInstance,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Instance,
        Config,
        Loopbacks,
        Interfaces,
        Mpls,
        Protocols,
    }

    let name = ni.name.as_str();
    let changes = &ni.changes;
    tracing::debug!(instance = name, changes = %changes, "Processing network-instance");

    let steps = [
        Step::Instance,
        Step::Config,
        Step::Loopbacks,
        Step::Interfaces,
        Step::Mpls,
        Step::Protocols,
    ];
    for step in ordered(steps, reverse) {
        match step {
            Step::Instance if changes.is_changed("name") => {
                if let Some(g) = p.as_network_instance() {
                    g.network_instance(name, ni)?;
                }
            }
            Step::Config if changes.is_changed("config") => {
                if let Some(g) = p.as_network_instance() {
                    g.network_instance_config(name, &ni.config)?;
                }
            }
            Step::Loopbacks if changes.is_changed("loopbacks") => {
                if let Some(g) = p.as_network_instance_loopback() {
                    for lo in ni.loopbacks.values() {
                        process_loopback(g, reverse, name, lo)?;
                    }
                }
            }
            Step::Interfaces if changes.is_changed("interfaces") => {
                if let Some(g) = p.as_network_instance_interface() {
                    for (id, iface) in &ni.interfaces {
                        for own in ordered([true, false], reverse) {
                            if own && iface.changes.is_changed("id") {
                                g.network_instance_interface(name, id, iface)?;
                            } else if !own && iface.changes.is_changed("config") {
                                g.network_instance_interface_config(name, id, &iface.config)?;
                            }
                        }
                    }
                }
            }
            Step::Mpls if changes.is_changed("mpls") => process_mpls(p, reverse, name, &ni.mpls)?,
            Step::Protocols if changes.is_changed("protocols") => {
                for proto in ni.protocols.values() {
                    process_protocol(p, reverse, name, proto)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_loopback(
    g: &mut dyn NetworkInstanceLoopbackProcessor,
    reverse: bool,
    name: &str,
    lo: &Loopback,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Loopback,
        Config,
        Addresses,
    }

    let id = lo.id.as_str();
    for step in ordered([Step::Loopback, Step::Config, Step::Addresses], reverse) {
        match step {
            Step::Loopback if lo.changes.is_changed("id") => {
                g.network_instance_loopback(name, id, lo)?
            }
            Step::Config if lo.changes.is_changed("config") => {
                g.network_instance_loopback_config(name, id, &lo.config)?
            }
            Step::Addresses if lo.changes.is_changed("addresses") => {
                for (index, addr) in &lo.addresses {
                    for own in ordered([true, false], reverse) {
                        if own && addr.changes.is_changed("index") {
                            g.network_instance_loopback_address(name, id, index, addr)?;
                        } else if !own && addr.changes.is_changed("config") {
                            g.network_instance_loopback_address_config(
                                name,
                                id,
                                index,
                                &addr.config,
                            )?;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Walks one protocol. Each protocol subtree is walked only when the
/// protocol identifier matches it.
fn process_protocol(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    proto: &Protocol,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Protocol,
        Config,
        StaticRoutes,
        Ospfv2,
        Bgp,
    }

    let key = &proto.key;
    let changes = &proto.changes;
    tracing::debug!(instance = name, protocol = %key, changes = %changes, "Processing protocol");

    let steps = [
        Step::Protocol,
        Step::Config,
        Step::StaticRoutes,
        Step::Ospfv2,
        Step::Bgp,
    ];
    for step in ordered(steps, reverse) {
        match step {
            Step::Protocol if changes.all_changed(&["identifier", "name"]) => {
                if let Some(g) = p.as_network_instance() {
                    g.network_instance_protocol(name, key, proto)?;
                }
            }
            Step::Config if changes.is_changed("config") => {
                if let Some(g) = p.as_network_instance() {
                    g.network_instance_protocol_config(name, key, &proto.config)?;
                }
            }
            Step::StaticRoutes
                if key.ident == InstallProtocolType::STATIC
                    && changes.is_changed("static-routes") =>
            {
                process_static_routes(p, reverse, name, key, &proto.static_routes)?
            }
            Step::Ospfv2 if key.ident == InstallProtocolType::OSPF && changes.is_changed("ospfv2") => {
                process_ospfv2(p, reverse, name, key, &proto.ospfv2)?
            }
            Step::Bgp if key.ident == InstallProtocolType::BGP && changes.is_changed("bgp") => {
                process_bgp(p, reverse, name, key, &proto.bgp)?
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
    use pretty_assertions::assert_eq;

    fn put(nis: &mut NetworkInstances, xpath: &str, value: &str) -> ModelResult<()> {
        nis.put(&parse_xpath(xpath)?, value)
    }

    #[test]
    fn test_put_instance_config() {
        let mut nis = NetworkInstances::new();
        put(&mut nis, "/network-instance[name='mic']/config/type", "oc-ni-types:DEFAULT_INSTANCE")
            .unwrap();
        put(&mut nis, "/network-instance[name='mic']/config/router-id", "10.0.0.1").unwrap();
        put(
            &mut nis,
            "/network-instance[name='mic']/config/route-distinguisher",
            "65001:10",
        )
        .unwrap();

        let ni = &nis.instances["mic"];
        assert_eq!(ni.config.instance_type, NetworkInstanceType::DEFAULT_INSTANCE);
        assert_eq!(ni.config.router_id, Some("10.0.0.1".parse().unwrap()));
        assert!(ni
            .config
            .changes
            .equals_exactly(&["type", "router-id", "route-distinguisher"]));
    }

    #[test]
    fn test_route_distinguisher() {
        assert!(parse_route_distinguisher("rd", "10.0.0.1:100").is_ok());
        assert!(parse_route_distinguisher("rd", "65001:100").is_ok());
        assert!(parse_route_distinguisher("rd", "abc:100").is_err());
        assert!(parse_route_distinguisher("rd", "65001").is_err());
    }

    #[test]
    fn test_put_protocol_bgp() {
        let mut nis = NetworkInstances::new();
        put(
            &mut nis,
            "/network-instance[name='mic']/protocols/protocol[identifier='oc-pol-types:BGP'][name='bgp']/bgp/global/config/as",
            "65001",
        )
        .unwrap();

        let key = ProtocolKey::new(InstallProtocolType::BGP, "bgp");
        let proto = &nis.instances["mic"].protocols[&key];
        assert_eq!(proto.bgp.global.config.as_number, 65001);
        assert!(proto.changes.equals_exactly(&["bgp"]));
        assert_eq!(key.to_string(), "BGP/bgp");
    }

    #[test]
    fn test_put_protocol_bad_identifier() {
        let mut nis = NetworkInstances::new();
        let err = put(
            &mut nis,
            "/network-instance[name='mic']/protocols/protocol[identifier='RIP'][name='rip']/config/name",
            "rip",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid InstallProtocolType. RIP");
    }

    #[test]
    fn test_put_loopback_address() {
        let mut nis = NetworkInstances::new();
        put(
            &mut nis,
            "/network-instance[name='mic']/loopbacks/loopback[id='lo']/addresses/address[index='0']/config/ip",
            "10.0.0.1",
        )
        .unwrap();
        let lo = &nis.instances["mic"].loopbacks["lo"];
        assert_eq!(
            lo.addresses["0"].config.ip,
            Some("10.0.0.1".parse().unwrap())
        );
    }
}
