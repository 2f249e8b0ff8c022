//! BGP protocol tree.
//!
//! ```text
//! bgp
//!  +- global/config (as, router-id)
//!  +- zebra/config (enabled, version, url, redistribute-routes)
//!  +- neighbors/neighbor[neighbor-address]
//!      +- config, timers/config, transport/config, apply-policy/config
//!      +- afi-safis/afi-safi[afi-safi-name]/config
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::network_instance::ProtocolKey;
use crate::node::{keyed_entry, string_key, ConfigContainer, ConfigNode};
use crate::policy::PolicyApplyConfig;
use crate::processor::{ordered, Processor};
use crate::types::{parse_bool, parse_ip, parse_uint, AfiSafiType, InstallProtocolType};
use crate::xpath::XPathNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bgp {
    pub changes: ChangeSet,
    pub global: ConfigContainer<BgpGlobalConfig>,
    pub zebra: ConfigContainer<BgpZebraConfig>,
    pub neighbors: BTreeMap<String, BgpNeighbor>,
}

impl Bgp {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_neighbors(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "neighbor" {
            return Ok(());
        }
        keyed_entry(
            &mut self.neighbors,
            node,
            "neighbor-address",
            string_key,
            |addr| BgpNeighbor::new(addr.as_str()),
        )?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for Bgp {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "global" => self.global.put(&nodes[1..], value)?,
            "zebra" => self.zebra.put(&nodes[1..], value)?,
            "neighbors" => self.put_neighbors(&nodes[1..], value)?,
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
pub struct BgpGlobalConfig {
    pub changes: ChangeSet,
    pub as_number: u32,
    pub router_id: String,
}

impl ConfigNode for BgpGlobalConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "as" => self.as_number = parse_uint("as", value)?,
            "router-id" => self.router_id = value.to_string(),
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Connection to the RIB manager (zebra).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgpZebraConfig {
    pub changes: ChangeSet,
    pub enabled: bool,
    pub version: u32,
    pub url: String,
    /// Route types redistributed from zebra. Each edit appends one entry.
    pub redistribute_routes: Vec<InstallProtocolType>,
}

impl ConfigNode for BgpZebraConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "enabled" => self.enabled = parse_bool("enabled", value)?,
            "version" => self.version = parse_uint("version", value)?,
            "url" => self.url = value.to_string(),
            "redistribute-routes" => self
                .redistribute_routes
                .push(InstallProtocolType::parse(value)?),
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
pub struct BgpNeighbor {
    pub changes: ChangeSet,
    pub address: String,
    pub config: BgpNeighborConfig,
    pub timers: ConfigContainer<BgpTimersConfig>,
    pub transport: ConfigContainer<BgpTransportConfig>,
    pub apply_policy: ConfigContainer<PolicyApplyConfig>,
    pub afi_safis: BTreeMap<AfiSafiType, BgpAfiSafi>,
}

impl BgpNeighbor {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    fn put_afi_safis(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "afi-safi" {
            return Ok(());
        }
        keyed_entry(
            &mut self.afi_safis,
            node,
            "afi-safi-name",
            AfiSafiType::parse,
            |name| BgpAfiSafi::new(*name),
        )?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for BgpNeighbor {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "neighbor-address" => {}
            "config" => self.config.put(&nodes[1..], value)?,
            "timers" => self.timers.put(&nodes[1..], value)?,
            "transport" => self.transport.put(&nodes[1..], value)?,
            "apply-policy" => self.apply_policy.put(&nodes[1..], value)?,
            "afi-safis" => self.put_afi_safis(&nodes[1..], value)?,
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
pub struct BgpNeighborConfig {
    pub changes: ChangeSet,
    pub neighbor_address: Option<IpAddr>,
    pub peer_as: u32,
    pub local_as: u32,
    pub description: String,
}

impl ConfigNode for BgpNeighborConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "neighbor-address" => {
                self.neighbor_address = Some(parse_ip("neighbor-address", value)?)
            }
            "peer-as" => self.peer_as = parse_uint("peer-as", value)?,
            "local-as" => self.local_as = parse_uint("local-as", value)?,
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
pub struct BgpTimersConfig {
    pub changes: ChangeSet,
    pub hold_time: u64,
    pub keepalive_interval: u64,
}

impl ConfigNode for BgpTimersConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "hold-time" => self.hold_time = parse_uint("hold-time", value)?,
            "keepalive-interval" => {
                self.keepalive_interval = parse_uint("keepalive-interval", value)?
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
pub struct BgpTransportConfig {
    pub changes: ChangeSet,
    pub local_address: Option<IpAddr>,
}

impl ConfigNode for BgpTransportConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "local-address" {
            self.local_address = Some(parse_ip("local-address", value)?);
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgpAfiSafi {
    pub changes: ChangeSet,
    pub name: AfiSafiType,
    pub config: BgpAfiSafiConfig,
}

impl BgpAfiSafi {
    pub fn new(name: AfiSafiType) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}

impl ConfigNode for BgpAfiSafi {
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
pub struct BgpAfiSafiConfig {
    pub changes: ChangeSet,
    pub afi_safi_name: AfiSafiType,
}

impl ConfigNode for BgpAfiSafiConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "afi-safi-name" {
            self.afi_safi_name = AfiSafiType::parse(value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Walks a BGP tree: the bgp callback, then global, zebra and neighbors.
pub fn process_bgp(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    bgp: &Bgp,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Bgp,
        Global,
        Zebra,
        Neighbors,
    }

    tracing::debug!(instance = name, "Processing bgp");

    for step in ordered([Step::Bgp, Step::Global, Step::Zebra, Step::Neighbors], reverse) {
        match step {
            Step::Bgp => {
                if let Some(g) = p.as_bgp() {
                    g.bgp(name, key, bgp)?;
                }
            }
            Step::Global => {
                if bgp.changes.is_changed("global") && bgp.global.changes.is_changed("config") {
                    if let Some(g) = p.as_bgp_global() {
                        g.bgp_global_config(name, key, &bgp.global.config)?;
                    }
                }
            }
            Step::Zebra => {
                if bgp.changes.is_changed("zebra") && bgp.zebra.changes.is_changed("config") {
                    if let Some(g) = p.as_bgp_zebra() {
                        g.bgp_zebra_config(name, key, &bgp.zebra.config)?;
                    }
                }
            }
            Step::Neighbors => {
                if bgp.changes.is_changed("neighbors") {
                    for neighbor in bgp.neighbors.values() {
                        process_bgp_neighbor(p, reverse, name, key, neighbor)?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Walks one neighbor: the neighbor callback, then config, timers,
/// transport, apply-policy and afi-safis.
pub fn process_bgp_neighbor(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    neighbor: &BgpNeighbor,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Neighbor,
        Config,
        Timers,
        Transport,
        ApplyPolicy,
        AfiSafis,
    }

    let Some(g) = p.as_bgp_neighbor() else {
        return Ok(());
    };
    let addr = neighbor.address.as_str();
    let changes = &neighbor.changes;

    tracing::debug!(instance = name, neighbor = addr, changes = %changes, "Processing bgp neighbor");

    let steps = [
        Step::Neighbor,
        Step::Config,
        Step::Timers,
        Step::Transport,
        Step::ApplyPolicy,
        Step::AfiSafis,
    ];
    for step in ordered(steps, reverse) {
        match step {
            Step::Neighbor if changes.is_changed("neighbor-address") => {
                g.bgp_neighbor(name, key, addr, neighbor)?;
            }
            Step::Config if changes.is_changed("config") => {
                g.bgp_neighbor_config(name, key, addr, &neighbor.config)?;
            }
            Step::Timers
                if changes.is_changed("timers") && neighbor.timers.changes.is_changed("config") =>
            {
                g.bgp_neighbor_timers_config(name, key, addr, &neighbor.timers.config)?;
            }
            Step::Transport
                if changes.is_changed("transport")
                    && neighbor.transport.changes.is_changed("config") =>
            {
                g.bgp_neighbor_transport_config(name, key, addr, &neighbor.transport.config)?;
            }
            Step::ApplyPolicy
                if changes.is_changed("apply-policy")
                    && neighbor.apply_policy.changes.is_changed("config") =>
            {
                g.bgp_neighbor_apply_policy_config(
                    name,
                    key,
                    addr,
                    &neighbor.apply_policy.config,
                )?;
            }
            Step::AfiSafis if changes.is_changed("afi-safis") => {
                for (afi_safi, entry) in &neighbor.afi_safis {
                    for own in ordered([true, false], reverse) {
                        if own && entry.changes.is_changed("afi-safi-name") {
                            g.bgp_neighbor_afi_safi(name, key, addr, *afi_safi, entry)?;
                        } else if !own && entry.changes.is_changed("config") {
                            g.bgp_neighbor_afi_safi_config(
                                name,
                                key,
                                addr,
                                *afi_safi,
                                &entry.config,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::parse_xpath;
    use pretty_assertions::assert_eq;

    fn put(bgp: &mut Bgp, xpath: &str, value: &str) -> ModelResult<()> {
        bgp.put(&parse_xpath(xpath)?, value)
    }

    #[test]
    fn test_put_global_config() {
        let mut bgp = Bgp::new();
        put(&mut bgp, "/global/config/as", "65000").unwrap();
        put(&mut bgp, "/global/config/router-id", "10.10.10.10").unwrap();

        assert!(bgp.changes.equals_exactly(&["global"]));
        assert!(bgp.global.changes.equals_exactly(&["config"]));
        assert!(bgp.global.config.changes.equals_exactly(&["as", "router-id"]));
        assert_eq!(bgp.global.config.as_number, 65000);
        assert_eq!(bgp.global.config.router_id, "10.10.10.10");
    }

    #[test]
    fn test_put_neighbor() {
        let mut bgp = Bgp::new();
        let base = "/neighbors/neighbor[neighbor-address='10.0.0.1']";
        put(&mut bgp, &format!("{}/neighbor-address", base), "10.0.0.1").unwrap();
        put(&mut bgp, &format!("{}/config/peer-as", base), "65001").unwrap();
        put(&mut bgp, &format!("{}/timers/config/hold-time", base), "90").unwrap();

        let neighbor = &bgp.neighbors["10.0.0.1"];
        assert_eq!(neighbor.address, "10.0.0.1");
        assert!(neighbor
            .changes
            .equals_exactly(&["neighbor-address", "config", "timers"]));
        assert_eq!(neighbor.config.peer_as, 65001);
        assert_eq!(neighbor.timers.config.hold_time, 90);
        assert!(bgp.changes.equals_exactly(&["neighbors"]));
    }

    #[test]
    fn test_put_neighbor_without_key() {
        let mut bgp = Bgp::new();
        let err = put(&mut bgp, "/neighbors/neighbor/config/peer-as", "65001").unwrap_err();
        assert_eq!(
            err.to_string(),
            "neighbor@neighbor-address not found. neighbor"
        );
        assert!(bgp.neighbors.is_empty());
        assert!(bgp.changes.is_empty());
    }

    #[test]
    fn test_put_invalid_neighbor_address() {
        let mut bgp = Bgp::new();
        let err = put(
            &mut bgp,
            "/neighbors/neighbor[neighbor-address='x']/config/neighbor-address",
            "10.0.0",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid neighbor-address. 10.0.0");
    }

    #[test]
    fn test_put_afi_safi() {
        let mut bgp = Bgp::new();
        put(
            &mut bgp,
            "/neighbors/neighbor[neighbor-address='10.0.0.1']/afi-safis/afi-safi[afi-safi-name='oc-bgp-types:IPV4_UNICAST']/config/afi-safi-name",
            "oc-bgp-types:IPV4_UNICAST",
        )
        .unwrap();

        let entry = &bgp.neighbors["10.0.0.1"].afi_safis[&AfiSafiType::IPV4_UNICAST];
        assert_eq!(entry.config.afi_safi_name, AfiSafiType::IPV4_UNICAST);
    }

    #[test]
    fn test_put_zebra_redistribute_appends() {
        let mut bgp = Bgp::new();
        put(&mut bgp, "/zebra/config/redistribute-routes", "DIRECTLY_CONNECTED").unwrap();
        put(&mut bgp, "/zebra/config/redistribute-routes", "STATIC").unwrap();
        assert_eq!(
            bgp.zebra.config.redistribute_routes,
            vec![
                InstallProtocolType::DIRECTLY_CONNECTED,
                InstallProtocolType::STATIC
            ]
        );
    }
}
