//! Datastore mutation emitter.
//!
//! [`InterfaceMutations`] turns the changed leaves of an interfaces tree into
//! `(xpath, value, kind)` tuples for the interfaces datastore. Tuples are
//! appended in walk order; the same path may appear more than once and the
//! consumer keeps the last write.

use std::fmt;
use std::net::IpAddr;

use netcfg_model::interfaces::{
    EthernetConfig, Interface, InterfaceConfig, IpFamily, Subinterface, SubinterfaceAddress,
    SubinterfaceAddressConfig, SubinterfaceConfig, SubinterfaceIpConfig,
};
use netcfg_model::processor::{InterfaceProcessor, SubinterfaceProcessor};
use netcfg_model::{ModelResult, Processor};

pub const INTERFACES_MODULE: &str = "beluganos-interfaces";
pub const IF_ETHERNET_MODULE: &str = "beluganos-if-ethernet";
pub const IF_IP_MODULE: &str = "beluganos-if-ip";

/// Value type of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    String,
    Bool,
    Uint8,
    Uint16,
    Uint32,
    IdentityRef,
}

impl MutationKind {
    /// Whether the value is rendered quoted.
    pub fn is_string_like(&self) -> bool {
        matches!(self, MutationKind::String | MutationKind::IdentityRef)
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::String => "STRING",
            MutationKind::Bool => "BOOL",
            MutationKind::Uint8 => "UINT8",
            MutationKind::Uint16 => "UINT16",
            MutationKind::Uint32 => "UINT32",
            MutationKind::IdentityRef => "IDENTITYREF",
        };
        f.write_str(name)
    }
}

/// One leaf write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub xpath: String,
    pub data: String,
    pub kind: MutationKind,
}

impl Mutation {
    pub fn new(xpath: impl Into<String>, data: impl ToString, kind: MutationKind) -> Self {
        Self {
            xpath: xpath.into(),
            data: data.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_string_like() {
            write!(f, "{} = '{}' {}", self.xpath, self.data, self.kind)
        } else {
            write!(f, "{} = {} {}", self.xpath, self.data, self.kind)
        }
    }
}

fn interface_path(name: &str) -> String {
    format!("/{}:interfaces/interface[name='{}']", INTERFACES_MODULE, name)
}

fn subinterface_path(name: &str, index: u32) -> String {
    format!(
        "{}/subinterfaces/subinterface[index='{}']",
        interface_path(name),
        index
    )
}

fn ip_path(name: &str, index: u32, family: IpFamily) -> String {
    format!("{}/{}:{}", subinterface_path(name, index), IF_IP_MODULE, family)
}

fn address_path(name: &str, index: u32, family: IpFamily, ip: IpAddr) -> String {
    format!("{}/addresses/address[ip='{}']", ip_path(name, index, family), ip)
}

/// Accumulated interface datastore mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceMutations {
    mutations: Vec<Mutation>,
}

impl InterfaceMutations {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, xpath: String, data: impl ToString, kind: MutationKind) {
        self.mutations.push(Mutation::new(xpath, data, kind));
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn clear(&mut self) {
        self.mutations.clear();
    }
}

impl Processor for InterfaceMutations {
    fn as_interface(&mut self) -> Option<&mut dyn InterfaceProcessor> {
        Some(self)
    }

    fn as_subinterface(&mut self) -> Option<&mut dyn SubinterfaceProcessor> {
        Some(self)
    }
}

impl InterfaceProcessor for InterfaceMutations {
    fn interface(&mut self, _name: &str, _iface: &Interface) -> ModelResult<()> {
        Ok(())
    }

    fn interface_config(&mut self, name: &str, config: &InterfaceConfig) -> ModelResult<()> {
        let base = format!("{}/config", interface_path(name));
        let changes = &config.changes;

        if changes.is_changed("name") {
            self.add(format!("{}/name", base), &config.name, MutationKind::String);
        }
        if changes.is_changed("type") {
            let identity = config.if_type.identity();
            self.add(format!("{}/type", base), identity, MutationKind::IdentityRef);
        }
        if changes.is_changed("enabled") {
            self.add(format!("{}/enabled", base), config.enabled, MutationKind::Bool);
        }
        if changes.is_changed("mtu") {
            self.add(format!("{}/mtu", base), config.mtu, MutationKind::Uint16);
        }
        if changes.is_changed("description") {
            let path = format!("{}/description", base);
            self.add(path, &config.description, MutationKind::String);
        }
        Ok(())
    }

    fn interface_ethernet_config(&mut self, name: &str, config: &EthernetConfig) -> ModelResult<()> {
        if config.changes.is_changed("mac-address") {
            let path = format!(
                "{}/{}:ethernet/config/mac-address",
                interface_path(name),
                IF_ETHERNET_MODULE
            );
            self.add(path, &config.mac_address, MutationKind::String);
        }
        Ok(())
    }
}

impl SubinterfaceProcessor for InterfaceMutations {
    fn subinterface(&mut self, _name: &str, _index: u32, _subif: &Subinterface) -> ModelResult<()> {
        Ok(())
    }

    fn subinterface_config(
        &mut self,
        name: &str,
        index: u32,
        config: &SubinterfaceConfig,
    ) -> ModelResult<()> {
        let base = format!("{}/config", subinterface_path(name, index));
        let changes = &config.changes;

        if changes.is_changed("index") {
            self.add(format!("{}/index", base), config.index, MutationKind::Uint32);
        }
        if changes.is_changed("enabled") {
            self.add(format!("{}/enabled", base), config.enabled, MutationKind::Bool);
        }
        if changes.is_changed("description") {
            let path = format!("{}/description", base);
            self.add(path, &config.description, MutationKind::String);
        }
        Ok(())
    }

    fn subinterface_ip_config(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        config: &SubinterfaceIpConfig,
    ) -> ModelResult<()> {
        if config.changes.is_changed("mtu") {
            let path = format!("{}/config/mtu", ip_path(name, index, family));
            self.add(path, config.mtu, MutationKind::Uint16);
        }
        Ok(())
    }

    fn subinterface_ip_address(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        ip: IpAddr,
        _addr: &SubinterfaceAddress,
    ) -> ModelResult<()> {
        let path = format!("{}/ip", address_path(name, index, family, ip));
        self.add(path, ip, MutationKind::String);
        Ok(())
    }

    fn subinterface_ip_address_config(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        ip: IpAddr,
        config: &SubinterfaceAddressConfig,
    ) -> ModelResult<()> {
        let base = format!("{}/config", address_path(name, index, family, ip));

        if config.changes.is_changed("ip") {
            if let Some(addr) = config.ip {
                self.add(format!("{}/ip", base), addr, MutationKind::String);
            }
        }
        if config.changes.is_changed("prefix-length") {
            let path = format!("{}/prefix-length", base);
            self.add(path, config.prefix_length, MutationKind::Uint8);
        }
        Ok(())
    }
}
