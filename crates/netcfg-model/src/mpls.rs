//! MPLS tree of a network instance.
//!
//! ```text
//! mpls
//!  +- global/config (null-label)
//!  +- signaling-protocols/ldp/global
//!      +- config (lsr-id)
//!      +- address-families/ipv4/config (transport-address, session-ka-holdtime,
//!      |                                label-policy/advertise/egress-explicit-null/enable)
//!      +- discovery/interfaces
//!          +- config (hello-holdtime, hello-interval)
//!          +- interface[interface-id]/config (interface-id, hello-holdtime, hello-interval)
//! ```
//!
//! `interface-attributes` and `interface-ref` are accepted and ignored.

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::node::{keyed_entry, string_key, ConfigContainer, ConfigNode};
use crate::processor::{ordered, MplsProcessor, Processor};
use crate::types::{parse_bool, parse_ip, parse_uint, MplsNullLabelType};
use crate::xpath::XPathNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mpls {
    pub changes: ChangeSet,
    pub global: ConfigContainer<MplsGlobalConfig>,
    pub ldp: MplsLdp,
}

impl ConfigNode for Mpls {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "global" => self.global.put(&nodes[1..], value)?,
            "signaling-protocols" => {
                if nodes.get(1).is_some_and(|n| n.name == "ldp") {
                    self.ldp.put(&nodes[2..], value)?;
                }
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
pub struct MplsGlobalConfig {
    pub changes: ChangeSet,
    pub null_label: MplsNullLabelType,
}

impl ConfigNode for MplsGlobalConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "null-label" {
            self.null_label = MplsNullLabelType::parse(value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// `signaling-protocols/ldp`. Its change set records the children of
/// `ldp/global`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdp {
    pub changes: ChangeSet,
    pub config: MplsLdpConfig,
    pub ipv4: MplsLdpIpv4,
    pub discovery: MplsLdpDiscovery,
}

impl ConfigNode for MplsLdp {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "global" {
            return Ok(());
        }
        let Some(child) = nodes.get(1) else {
            return Ok(());
        };
        let rest = &nodes[2..];
        match (child.name.as_str(), rest.first()) {
            ("config", _) => self.config.put(rest, value)?,
            ("address-families", Some(af)) if af.name == "ipv4" => {
                self.ipv4.put(&rest[1..], value)?
            }
            ("discovery", Some(ifaces)) if ifaces.name == "interfaces" => {
                self.discovery.put(&rest[1..], value)?
            }
            _ => {}
        }
        self.changes.mark(child.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdpConfig {
    pub changes: ChangeSet,
    pub lsr_id: Option<IpAddr>,
}

impl ConfigNode for MplsLdpConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "lsr-id" {
            self.lsr_id = Some(parse_ip("lsr-id", value)?);
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// `address-families/ipv4`.
pub type MplsLdpIpv4 = ConfigContainer<MplsLdpIpv4Config>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdpIpv4Config {
    pub changes: ChangeSet,
    pub transport_address: Option<IpAddr>,
    pub session_ka_holdtime: u16,
    pub explicit_null: MplsLdpExplicitNull,
}

impl ConfigNode for MplsLdpIpv4Config {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "transport-address" => {
                self.transport_address = Some(parse_ip("transport-address", value)?)
            }
            "session-ka-holdtime" => {
                self.session_ka_holdtime = parse_uint("session-ka-holdtime", value)?
            }
            "label-policy" => {
                let names: Vec<&str> = nodes[1..].iter().map(|n| n.name.as_str()).collect();
                if let ["advertise", "egress-explicit-null", ..] = names.as_slice() {
                    self.explicit_null.put(&nodes[3..], value)?;
                }
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

/// `label-policy/advertise/egress-explicit-null`.
#[derive(Debug, Clone, PartialEq)]
pub struct MplsLdpExplicitNull {
    pub changes: ChangeSet,
    pub enable: bool,
}

impl Default for MplsLdpExplicitNull {
    fn default() -> Self {
        Self {
            changes: ChangeSet::new(),
            enable: true,
        }
    }
}

impl ConfigNode for MplsLdpExplicitNull {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "enable" {
            self.enable = parse_bool("enable", value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// `discovery/interfaces`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdpDiscovery {
    pub changes: ChangeSet,
    pub config: MplsLdpHelloConfig,
    pub interfaces: BTreeMap<String, MplsLdpInterface>,
}

impl ConfigNode for MplsLdpDiscovery {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "interface" => keyed_entry(
                &mut self.interfaces,
                node,
                "interface-id",
                string_key,
                |id| MplsLdpInterface::new(id.as_str()),
            )?
            .put(&nodes[1..], value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Hello timers shared by all discovery interfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdpHelloConfig {
    pub changes: ChangeSet,
    pub hello_holdtime: u16,
    pub hello_interval: u16,
}

impl ConfigNode for MplsLdpHelloConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "hello-holdtime" => self.hello_holdtime = parse_uint("hello-holdtime", value)?,
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MplsLdpInterface {
    pub changes: ChangeSet,
    pub interface_id: String,
    pub config: MplsLdpInterfaceConfig,
}

impl MplsLdpInterface {
    pub fn new(interface_id: impl Into<String>) -> Self {
        Self {
            interface_id: interface_id.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for MplsLdpInterface {
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
pub struct MplsLdpInterfaceConfig {
    pub changes: ChangeSet,
    pub interface_id: String,
    pub hello_holdtime: u16,
    pub hello_interval: u16,
}

impl ConfigNode for MplsLdpInterfaceConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "interface-id" => self.interface_id = value.to_string(),
            "hello-holdtime" => self.hello_holdtime = parse_uint("hello-holdtime", value)?,
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

/// Walks the MPLS tree of network instance `name`: global, then LDP.
pub fn process_mpls(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    mpls: &Mpls,
) -> ModelResult<()> {
    let Some(g) = p.as_mpls() else {
        return Ok(());
    };

    tracing::debug!(instance = name, changes = %mpls.changes, "Processing mpls");

    for global in ordered([true, false], reverse) {
        if global {
            if mpls.changes.is_changed("global") && mpls.global.changes.is_changed("config") {
                g.mpls_global_config(name, &mpls.global.config)?;
            }
        } else if mpls.changes.is_changed("signaling-protocols") {
            process_mpls_ldp(g, reverse, name, &mpls.ldp)?;
        }
    }

    Ok(())
}

fn process_mpls_ldp(
    g: &mut dyn MplsProcessor,
    reverse: bool,
    name: &str,
    ldp: &MplsLdp,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Config,
        Ipv4,
        Discovery,
    }

    for step in ordered([Step::Config, Step::Ipv4, Step::Discovery], reverse) {
        match step {
            Step::Config if ldp.changes.is_changed("config") => {
                g.mpls_ldp_config(name, &ldp.config)?
            }
            Step::Ipv4
                if ldp.changes.is_changed("address-families")
                    && ldp.ipv4.changes.is_changed("config") =>
            {
                g.mpls_ldp_ipv4_config(name, &ldp.ipv4.config)?
            }
            Step::Discovery if ldp.changes.is_changed("discovery") => {
                let discovery = &ldp.discovery;
                for config in ordered([true, false], reverse) {
                    if config && discovery.changes.is_changed("config") {
                        g.mpls_ldp_discovery_interfaces_config(name, &discovery.config)?;
                    } else if !config && discovery.changes.is_changed("interface") {
                        for (ifid, iface) in &discovery.interfaces {
                            if iface.changes.is_changed("interface-id") {
                                g.mpls_ldp_interface(name, ifid, iface)?;
                            }
                            if iface.changes.is_changed("config") {
                                g.mpls_ldp_interface_config(name, ifid, &iface.config)?;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}
