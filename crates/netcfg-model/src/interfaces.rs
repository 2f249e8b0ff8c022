//! Interfaces tree.
//!
//! ```text
//! interfaces/interface[name]
//!  +- config (name, type, enabled, mtu, description)
//!  +- ethernet/config (mac-address)
//!  +- subinterfaces/subinterface[index]
//!      +- config (index, enabled, description)
//!      +- ipv4|ipv6 {config (mtu), addresses/address[ip]/config (ip, prefix-length)}
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::node::{keyed_entry, string_key, ConfigContainer, ConfigNode};
use crate::processor::{ordered, Processor, SubinterfaceProcessor};
use crate::types::{parse_bool, parse_ip, parse_uint, InterfaceType};
use crate::xpath::XPathNode;

/// Children of the `interfaces` container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interfaces {
    pub changes: ChangeSet,
    pub interfaces: BTreeMap<String, Interface>,
}

impl Interfaces {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigNode for Interfaces {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "interface" {
            keyed_entry(&mut self.interfaces, node, "name", string_key, |name| {
                Interface::new(name.as_str())
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
pub struct Interface {
    pub changes: ChangeSet,
    pub name: String,
    pub config: InterfaceConfig,
    pub ethernet: ConfigContainer<EthernetConfig>,
    pub subinterfaces: BTreeMap<u32, Subinterface>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn put_subinterfaces(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "subinterface" {
            return Ok(());
        }
        keyed_entry(
            &mut self.subinterfaces,
            node,
            "index",
            |s| parse_uint("index", s),
            |index| Subinterface::new(*index),
        )?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for Interface {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "ethernet" => self.ethernet.put(&nodes[1..], value)?,
            "subinterfaces" => self.put_subinterfaces(&nodes[1..], value)?,
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
pub struct InterfaceConfig {
    pub changes: ChangeSet,
    pub name: String,
    pub if_type: InterfaceType,
    pub enabled: bool,
    pub mtu: u16,
    pub description: String,
}

impl ConfigNode for InterfaceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "name" => self.name = value.to_string(),
            "type" => self.if_type = InterfaceType::parse(value)?,
            "enabled" => self.enabled = parse_bool("enabled", value)?,
            "mtu" => self.mtu = parse_uint("mtu", value)?,
            "description" => self.description = value.to_string(),
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
pub struct EthernetConfig {
    pub changes: ChangeSet,
    pub mac_address: String,
}

impl ConfigNode for EthernetConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "mac-address" {
            self.mac_address = value.to_string();
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subinterface {
    pub changes: ChangeSet,
    pub index: u32,
    pub config: SubinterfaceConfig,
    pub ipv4: SubinterfaceIp,
    pub ipv6: SubinterfaceIp,
}

impl Subinterface {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn ip(&self, family: IpFamily) -> &SubinterfaceIp {
        match family {
            IpFamily::Ipv4 => &self.ipv4,
            IpFamily::Ipv6 => &self.ipv6,
        }
    }
}

impl ConfigNode for Subinterface {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "ipv4" => self.ipv4.put(&nodes[1..], value)?,
            "ipv6" => self.ipv6.put(&nodes[1..], value)?,
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
pub struct SubinterfaceConfig {
    pub changes: ChangeSet,
    pub index: u32,
    pub enabled: bool,
    pub description: String,
}

impl ConfigNode for SubinterfaceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "index" => self.index = parse_uint("index", value)?,
            "enabled" => self.enabled = parse_bool("enabled", value)?,
            "description" => self.description = value.to_string(),
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Address family of a subinterface `ipv4`/`ipv6` container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::Ipv4 => f.write_str("ipv4"),
            IpFamily::Ipv6 => f.write_str("ipv6"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubinterfaceIp {
    pub changes: ChangeSet,
    pub config: SubinterfaceIpConfig,
    pub addresses: BTreeMap<IpAddr, SubinterfaceAddress>,
}

impl SubinterfaceIp {
    fn put_addresses(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "address" {
            return Ok(());
        }
        keyed_entry(
            &mut self.addresses,
            node,
            "ip",
            |s| parse_ip("ip", s),
            |ip| SubinterfaceAddress::new(*ip),
        )?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for SubinterfaceIp {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "addresses" => self.put_addresses(&nodes[1..], value)?,
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
pub struct SubinterfaceIpConfig {
    pub changes: ChangeSet,
    pub mtu: u16,
}

impl ConfigNode for SubinterfaceIpConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "mtu" {
            self.mtu = parse_uint("mtu", value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubinterfaceAddress {
    pub changes: ChangeSet,
    pub ip: IpAddr,
    pub config: SubinterfaceAddressConfig,
}

impl SubinterfaceAddress {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            changes: ChangeSet::new(),
            ip,
            config: SubinterfaceAddressConfig::default(),
        }
    }
}

impl ConfigNode for SubinterfaceAddress {
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
pub struct SubinterfaceAddressConfig {
    pub changes: ChangeSet,
    pub ip: Option<IpAddr>,
    pub prefix_length: u8,
}

impl ConfigNode for SubinterfaceAddressConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
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

/// Walks every interface: the interface callbacks, then its subinterfaces.
pub fn process_interfaces(
    p: &mut dyn Processor,
    reverse: bool,
    ifaces: &Interfaces,
) -> ModelResult<()> {
    for iface in ifaces.interfaces.values() {
        process_interface(p, reverse, iface)?;
    }
    Ok(())
}

fn process_interface(p: &mut dyn Processor, reverse: bool, iface: &Interface) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Interface,
        Config,
        Ethernet,
        Subinterfaces,
    }

    let name = iface.name.as_str();
    let changes = &iface.changes;
    tracing::debug!(interface = name, changes = %changes, "Processing interface");

    let steps = [Step::Interface, Step::Config, Step::Ethernet, Step::Subinterfaces];
    for step in ordered(steps, reverse) {
        match step {
            Step::Interface if changes.is_changed("name") => {
                if let Some(g) = p.as_interface() {
                    g.interface(name, iface)?;
                }
            }
            Step::Config if changes.is_changed("config") => {
                if let Some(g) = p.as_interface() {
                    g.interface_config(name, &iface.config)?;
                }
            }
            Step::Ethernet
                if changes.is_changed("ethernet") && iface.ethernet.changes.is_changed("config") =>
            {
                if let Some(g) = p.as_interface() {
                    g.interface_ethernet_config(name, &iface.ethernet.config)?;
                }
            }
            Step::Subinterfaces if changes.is_changed("subinterfaces") => {
                if let Some(g) = p.as_subinterface() {
                    for subif in iface.subinterfaces.values() {
                        process_subinterface(g, reverse, name, subif)?;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_subinterface(
    g: &mut dyn SubinterfaceProcessor,
    reverse: bool,
    name: &str,
    subif: &Subinterface,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Subinterface,
        Config,
        Ip(IpFamily),
    }

    let index = subif.index;
    let changes = &subif.changes;
    let steps = [
        Step::Subinterface,
        Step::Config,
        Step::Ip(IpFamily::Ipv4),
        Step::Ip(IpFamily::Ipv6),
    ];

    for step in ordered(steps, reverse) {
        match step {
            Step::Subinterface if changes.is_changed("index") => {
                g.subinterface(name, index, subif)?
            }
            Step::Config if changes.is_changed("config") => {
                g.subinterface_config(name, index, &subif.config)?
            }
            Step::Ip(family) if changes.is_changed(&family.to_string()) => {
                process_subinterface_ip(g, reverse, name, index, family, subif.ip(family))?
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_subinterface_ip(
    g: &mut dyn SubinterfaceProcessor,
    reverse: bool,
    name: &str,
    index: u32,
    family: IpFamily,
    ip: &SubinterfaceIp,
) -> ModelResult<()> {
    for config in ordered([true, false], reverse) {
        if config && ip.changes.is_changed("config") {
            g.subinterface_ip_config(name, index, family, &ip.config)?;
        } else if !config && ip.changes.is_changed("addresses") {
            for (addr, entry) in &ip.addresses {
                if entry.changes.is_changed("ip") {
                    g.subinterface_ip_address(name, index, family, *addr, entry)?;
                }
                if entry.changes.is_changed("config") {
                    g.subinterface_ip_address_config(name, index, family, *addr, &entry.config)?;
                }
            }
        }
    }
    Ok(())
}
