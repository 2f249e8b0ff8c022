//! Static routes of a `STATIC` protocol.
//!
//! ```text
//! static-routes/static[ip][prefix-length]
//!  +- config (ip, prefix-length)
//!  +- next-hops/next-hop[index]/config (index, next-hop)
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::network_instance::ProtocolKey;
use crate::node::{key_attr, keyed_entry, string_key, ConfigNode};
use crate::processor::{ordered, Processor};
use crate::types::{parse_ip, parse_non_empty, parse_uint};
use crate::xpath::XPathNode;

/// Key of a static route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticRouteKey {
    pub ip: IpAddr,
    pub prefix_len: u8,
}

impl StaticRouteKey {
    pub fn new(ip: IpAddr, prefix_len: u8) -> Self {
        Self { ip, prefix_len }
    }

    fn from_node(node: &XPathNode) -> ModelResult<Self> {
        let ip = parse_ip("IP", key_attr(node, "ip")?)?;
        let prefix_len = parse_uint("prefix-length", key_attr(node, "prefix-length")?)?;
        Ok(Self::new(ip, prefix_len))
    }
}

impl fmt::Display for StaticRouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

/// Assigns a leaf below `static-routes`.
pub(crate) fn put_static_routes(
    routes: &mut BTreeMap<StaticRouteKey, StaticRoute>,
    nodes: &[XPathNode],
    value: &str,
) -> ModelResult<()> {
    let Some(node) = nodes.first() else {
        return Ok(());
    };
    if node.name != "static" {
        return Ok(());
    }
    let key = StaticRouteKey::from_node(node)?;
    routes
        .entry(key)
        .or_insert_with(|| StaticRoute::new(key))
        .put(&nodes[1..], value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticRoute {
    pub changes: ChangeSet,
    pub key: StaticRouteKey,
    pub config: StaticRouteConfig,
    pub nexthops: BTreeMap<String, StaticNexthop>,
}

impl StaticRoute {
    pub fn new(key: StaticRouteKey) -> Self {
        Self {
            changes: ChangeSet::new(),
            key,
            config: StaticRouteConfig::default(),
            nexthops: BTreeMap::new(),
        }
    }
}

impl ConfigNode for StaticRoute {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match (node.name.as_str(), nodes.get(1)) {
            ("config", _) => self.config.put(&nodes[1..], value)?,
            ("next-hops", Some(nh)) if nh.name == "next-hop" => {
                keyed_entry(&mut self.nexthops, nh, "index", string_key, |index| {
                    StaticNexthop::new(index.as_str())
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
pub struct StaticRouteConfig {
    pub changes: ChangeSet,
    pub ip: Option<IpAddr>,
    pub prefix_len: u8,
}

impl ConfigNode for StaticRouteConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "ip" => self.ip = Some(parse_ip("IP", value)?),
            "prefix-length" => self.prefix_len = parse_uint("prefix-length", value)?,
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
pub struct StaticNexthop {
    pub changes: ChangeSet,
    pub index: String,
    pub config: StaticNexthopConfig,
}

impl StaticNexthop {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for StaticNexthop {
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

/// Next hop of a static route: an address or one of the local keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticNexthopConfig {
    pub changes: ChangeSet,
    pub index: String,
    pub next_hop: String,
}

/// Next-hop keywords accepted in place of an address.
pub const LOCAL_DEFINED_NEXTHOPS: &[&str] = &["DROP", "LOCAL_LINK"];

fn parse_next_hop(value: &str) -> ModelResult<String> {
    let local = crate::xpath::split_name(value).1;
    if LOCAL_DEFINED_NEXTHOPS.contains(&local) {
        return Ok(local.to_string());
    }
    parse_ip("next-hop", value).map(|ip| ip.to_string())
}

impl ConfigNode for StaticNexthopConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "index" => self.index = parse_non_empty("index", value)?,
            "next-hop" => self.next_hop = parse_next_hop(value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Walks the static routes of protocol `key` in network instance `name`.
pub fn process_static_routes(
    p: &mut dyn Processor,
    reverse: bool,
    name: &str,
    key: &ProtocolKey,
    routes: &BTreeMap<StaticRouteKey, StaticRoute>,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Route,
        Config,
        Nexthops,
    }

    let Some(g) = p.as_static_route() else {
        return Ok(());
    };

    for (route_key, route) in routes {
        tracing::debug!(instance = name, route = %route_key, changes = %route.changes, "Processing static route");

        for step in ordered([Step::Route, Step::Config, Step::Nexthops], reverse) {
            match step {
                Step::Route if route.changes.all_changed(&["ip", "prefix-length"]) => {
                    g.static_route(name, key, route_key, route)?
                }
                Step::Config if route.changes.is_changed("config") => {
                    g.static_route_config(name, key, route_key, &route.config)?
                }
                Step::Nexthops if route.changes.is_changed("next-hops") => {
                    for (index, nh) in &route.nexthops {
                        for own in ordered([true, false], reverse) {
                            if own && nh.changes.is_changed("index") {
                                g.static_route_nexthop(name, key, route_key, index, nh)?;
                            } else if !own && nh.changes.is_changed("config") {
                                g.static_route_nexthop_config(
                                    name, key, route_key, index, &nh.config,
                                )?;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::parse_xpath;

    #[test]
    fn test_put_static_route() {
        let mut routes = BTreeMap::new();
        let base = "/static[ip='10.1.0.0'][prefix-length='16']";
        put_static_routes(
            &mut routes,
            &parse_xpath(&format!("{}/next-hops/next-hop[index='1']/config/next-hop", base))
                .unwrap(),
            "192.168.0.1",
        )
        .unwrap();

        let key = StaticRouteKey::new("10.1.0.0".parse().unwrap(), 16);
        assert_eq!(key.to_string(), "10.1.0.0/16");
        let route = &routes[&key];
        assert!(route.changes.equals_exactly(&["next-hops"]));
        assert_eq!(route.nexthops["1"].config.next_hop, "192.168.0.1");
    }

    #[test]
    fn test_put_local_next_hop() {
        let mut config = StaticNexthopConfig::default();
        config
            .put(&[XPathNode::new("next-hop")], "oc-loc-rt:DROP")
            .unwrap();
        assert_eq!(config.next_hop, "DROP");
        assert!(config.put(&[XPathNode::new("next-hop")], "nowhere").is_err());
    }

    #[test]
    fn test_put_bad_route_key() {
        let mut routes = BTreeMap::new();
        let err = put_static_routes(
            &mut routes,
            &parse_xpath("/static[ip='10.1.0.0'][prefix-length='40x']/config").unwrap(),
            "",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid prefix-length. 40x");
    }

    #[test]
    fn test_put_empty_index() {
        let mut config = StaticNexthopConfig::default();
        let err = config.put(&[XPathNode::new("index")], "").unwrap_err();
        assert_eq!(err.to_string(), "Invalid index. ''");
    }
}
