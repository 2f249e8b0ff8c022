//! gobgpd configuration emitter.
//!
//! [`GobgpConfig`] turns the changed parts of a BGP tree and a routing
//! policy into the TOML dialect gobgpd reads. Lines come out in walk order:
//! a table header first, then one `key = value` per changed leaf.
//!
//! ```text
//! [global.config]
//! as = 65000
//! router-id = "10.10.10.10"
//! ```

use itertools::Itertools;
use std::fmt::Display;
use toml::{Table, Value};

use netcfg_model::bgp::{
    BgpAfiSafi, BgpAfiSafiConfig, BgpGlobalConfig, BgpNeighbor, BgpNeighborConfig,
    BgpTimersConfig, BgpTransportConfig, BgpZebraConfig,
};
use netcfg_model::policy::{
    PolicyActionsConfig, PolicyApplyConfig, PolicyBgpActionsConfig, PolicyDefinition,
    PolicyDefinitionConfig, PolicyStatement, PolicyStatementConfig,
};
use netcfg_model::processor::{
    BgpGlobalProcessor, BgpNeighborProcessor, BgpZebraProcessor, PolicyDefinitionProcessor,
};
use netcfg_model::{
    AfiSafiType, BgpNexthop, InstallProtocolType, ModelResult, PolicyDefaultType,
    PolicyResultType, Processor, ProtocolKey,
};

use crate::error::{EmitError, EmitResult};

/// External name of an address family.
pub fn afi_safi_name(v: AfiSafiType) -> String {
    let name = match v {
        AfiSafiType::IPV4_UNICAST => "ipv4-unicast",
        AfiSafiType::IPV6_UNICAST => "ipv6-unicast",
        AfiSafiType::IPV4_LABELED_UNICAST => "ipv4-labelled-unicast",
        AfiSafiType::IPV6_LABELED_UNICAST => "ipv6-labelled-unicast",
        AfiSafiType::L3VPN_IPV4_UNICAST => "l3vpn-ipv4-unicast",
        AfiSafiType::L3VPN_IPV6_UNICAST => "l3vpn-ipv6-unicast",
        AfiSafiType::L3VPN_IPV4_MULTICAST => "l3vpn-ipv4-multicast",
        AfiSafiType::L3VPN_IPV6_MULTICAST => "l3vpn-ipv6-multicast",
        AfiSafiType::L2VPN_VPLS => "l2vpn-vpls",
        AfiSafiType::L2VPN_EVPN => "l2vpn-evpn",
        _ => return invalid("AfiSafiType", v.0),
    };
    name.to_string()
}

/// External name of a route source.
pub fn install_protocol_name(v: InstallProtocolType) -> String {
    let name = match v {
        InstallProtocolType::BGP => "bgp",
        InstallProtocolType::ISIS => "isis",
        InstallProtocolType::OSPF => "ospf",
        InstallProtocolType::OSPF3 => "ospfv3",
        InstallProtocolType::STATIC => "static",
        InstallProtocolType::DIRECTLY_CONNECTED => "connected",
        InstallProtocolType::LOCAL_AGGREGATE => "aggregate",
        _ => return invalid("InstallProtocolType", v.0),
    };
    name.to_string()
}

pub fn policy_result_name(v: PolicyResultType) -> String {
    match v {
        PolicyResultType::ACCEPT_ROUTE => "accept-route".to_string(),
        PolicyResultType::REJECT_ROUTE => "reject-route".to_string(),
        _ => invalid("PolicyResultType", v.0),
    }
}

pub fn policy_default_name(v: PolicyDefaultType) -> String {
    match v {
        PolicyDefaultType::ACCEPT_ROUTE => "accept-route".to_string(),
        PolicyDefaultType::REJECT_ROUTE => "reject-route".to_string(),
        _ => invalid("PolicyDefaultType", v.0),
    }
}

pub fn bgp_nexthop_name(v: &BgpNexthop) -> String {
    match v {
        BgpNexthop::SelfNexthop => "self".to_string(),
        BgpNexthop::Address(ip) => ip.to_string(),
        BgpNexthop::Unspecified => invalid("BgpNexthop", 0),
    }
}

fn invalid(type_name: &str, value: u32) -> String {
    format!("Invalid {}({})", type_name, value)
}

fn quote(s: impl Display) -> String {
    format!("\"{}\"", s)
}

fn quote_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    format!("[{}]", items.into_iter().map(quote).join(", "))
}

/// Accumulated gobgpd configuration lines.
///
/// Every list entry carries its key (`neighbor-address`, afi-safi name,
/// policy or statement name) even when only a nested leaf changed, so the
/// lines can be merged into an existing document with [`merge_config`].
/// Built from forward walks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GobgpConfig {
    items: Vec<String>,
    /// Item index where each top-level section starts.
    sections: Vec<usize>,
    /// Last table header.
    table: String,
    /// Open top-level list entry, e.g. `neighbors/10.0.0.1`.
    entry: Option<String>,
    /// Open nested list entry (afi-safi or statement name).
    child: Option<String>,
}

impl GobgpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[[name]]`
    fn add_list(&mut self, name: &str) {
        self.items.push(format!("[[{}]]", name));
        self.table = name.to_string();
    }

    /// `[name]`
    fn add_node(&mut self, name: &str) {
        self.items.push(format!("[{}]", name));
        self.table = name.to_string();
    }

    /// `key = value`
    fn add_item(&mut self, key: &str, value: impl Display) {
        self.items.push(format!("{} = {}", key, value));
    }

    fn begin_section(&mut self) {
        self.sections.push(self.items.len());
        self.entry = None;
        self.child = None;
    }

    /// Top-level `[name]` table in a section of its own.
    fn open_table(&mut self, name: &str) {
        self.begin_section();
        self.add_node(name);
    }

    /// `[[neighbors]]` entry for `addr`, unless it is the open one.
    fn open_neighbor(&mut self, addr: &str) {
        let key = format!("neighbors/{}", addr);
        if self.entry.as_deref() == Some(key.as_str()) {
            return;
        }
        self.begin_section();
        self.add_list("neighbors");
        self.add_node("neighbors.config");
        self.add_item("neighbor-address", quote(addr));
        self.entry = Some(key);
    }

    /// Positions the following lines in `[neighbors.config]` of `addr`.
    fn open_neighbor_config(&mut self, addr: &str) {
        self.open_neighbor(addr);
        if self.table != "neighbors.config" {
            // the table is closed; a second entry with the same address
            // merges into the first one
            self.entry = None;
            self.open_neighbor(addr);
        }
    }

    fn open_afi_safi(&mut self, addr: &str, afi_safi: AfiSafiType) {
        self.open_neighbor(addr);
        let name = afi_safi_name(afi_safi);
        if self.child.as_deref() == Some(name.as_str())
            && self.table == "neighbors.afi-safis.config"
        {
            return;
        }
        self.add_list("neighbors.afi-safis");
        self.add_node("neighbors.afi-safis.config");
        self.add_item("afi-safi-name", quote(&name));
        self.child = Some(name);
    }

    /// `[[policy-definitions]]` entry for `name`, unless it is the open one.
    fn open_policy(&mut self, name: &str) {
        let key = format!("policy-definitions/{}", name);
        if self.entry.as_deref() == Some(key.as_str()) {
            return;
        }
        self.begin_section();
        self.add_list("policy-definitions");
        self.add_item("name", quote(name));
        self.entry = Some(key);
    }

    fn open_statement(&mut self, policy: &str, statement: &str) {
        self.open_policy(policy);
        if self.child.as_deref() == Some(statement) {
            return;
        }
        self.add_list("policy-definitions.statements");
        self.add_item("name", quote(statement));
        self.child = Some(statement.to_string());
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Lines grouped by top-level section. Each group is a TOML document
    /// of its own.
    pub fn sections(&self) -> Vec<&[String]> {
        let mut bounds = self.sections.clone();
        if bounds.first() != Some(&0) {
            bounds.insert(0, 0);
        }
        bounds.push(self.items.len());
        bounds
            .windows(2)
            .map(|w| &self.items[w[0]..w[1]])
            .filter(|lines| !lines.is_empty())
            .collect()
    }

    /// The whole document, one line per item.
    pub fn bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for item in &self.items {
            buf.extend_from_slice(item.as_bytes());
            buf.push(b'\n');
        }
        buf
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Key of an entry in a keyed list, if `list` is one.
fn entry_key<'a>(list: &str, entry: &'a Value) -> Option<&'a Value> {
    match list {
        "neighbors" => entry.get("config")?.get("neighbor-address"),
        "afi-safis" => entry.get("config")?.get("afi-safi-name"),
        "policy-definitions" | "statements" => entry.get("name"),
        _ => None,
    }
}

fn merge_table(base: &mut Table, update: Table) {
    for (key, value) in update {
        match base.get_mut(&key) {
            Some(current) => merge_value(&key, current, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn merge_value(key: &str, base: &mut Value, update: Value) {
    match (base, update) {
        (Value::Table(base), Value::Table(update)) => merge_table(base, update),
        (Value::Array(base), Value::Array(update)) if is_keyed_list(key) => {
            for entry in update {
                let found = entry_key(key, &entry).and_then(|k| {
                    base.iter()
                        .position(|current| entry_key(key, current) == Some(k))
                });
                match found {
                    Some(index) => merge_value(key, &mut base[index], entry),
                    None => base.push(entry),
                }
            }
        }
        (base, update) => *base = update,
    }
}

fn is_keyed_list(key: &str) -> bool {
    matches!(
        key,
        "neighbors" | "afi-safis" | "policy-definitions" | "statements"
    )
}

/// Merges changed lines into an existing gobgpd document.
///
/// Tables merge key by key. Neighbors match on `neighbor-address`,
/// afi-safis on `afi-safi-name`, policies and statements on `name`; a
/// matching entry is merged, any other entry is appended. Every other
/// value is replaced.
pub fn merge_config(existing: &str, changes: &GobgpConfig) -> EmitResult<String> {
    let mut doc: Table =
        toml::from_str(existing).map_err(|e| EmitError::document("existing config", e))?;

    for section in changes.sections() {
        let text = section.join("\n");
        let update: Table =
            toml::from_str(&text).map_err(|e| EmitError::document("rendered config", e))?;
        merge_table(&mut doc, update);
    }

    toml::to_string(&doc).map_err(|e| EmitError::document("merged config", e))
}

impl Processor for GobgpConfig {
    fn as_bgp_global(&mut self) -> Option<&mut dyn BgpGlobalProcessor> {
        Some(self)
    }

    fn as_bgp_zebra(&mut self) -> Option<&mut dyn BgpZebraProcessor> {
        Some(self)
    }

    fn as_bgp_neighbor(&mut self) -> Option<&mut dyn BgpNeighborProcessor> {
        Some(self)
    }

    fn as_policy_definition(&mut self) -> Option<&mut dyn PolicyDefinitionProcessor> {
        Some(self)
    }
}

impl BgpGlobalProcessor for GobgpConfig {
    fn bgp_global_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        config: &BgpGlobalConfig,
    ) -> ModelResult<()> {
        self.open_table("global.config");
        if config.changes.is_changed("as") {
            self.add_item("as", config.as_number);
        }
        if config.changes.is_changed("router-id") {
            self.add_item("router-id", quote(&config.router_id));
        }
        Ok(())
    }
}

impl BgpZebraProcessor for GobgpConfig {
    fn bgp_zebra_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        config: &BgpZebraConfig,
    ) -> ModelResult<()> {
        self.open_table("zebra.config");
        if config.changes.is_changed("enabled") {
            self.add_item("enabled", config.enabled);
        }
        if config.changes.is_changed("version") {
            self.add_item("version", config.version);
        }
        if config.changes.is_changed("url") {
            self.add_item("url", quote(&config.url));
        }
        if config.changes.is_changed("redistribute-routes") {
            let routes = config
                .redistribute_routes
                .iter()
                .map(|r| install_protocol_name(*r));
            self.add_item("redistribute-route-type-list", quote_list(routes));
        }
        Ok(())
    }
}

impl BgpNeighborProcessor for GobgpConfig {
    fn bgp_neighbor(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        _neighbor: &BgpNeighbor,
    ) -> ModelResult<()> {
        self.open_neighbor(addr);
        Ok(())
    }

    /// `neighbor-address` always comes from the list key.
    fn bgp_neighbor_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        config: &BgpNeighborConfig,
    ) -> ModelResult<()> {
        self.open_neighbor_config(addr);
        if config.changes.is_changed("peer-as") {
            self.add_item("peer-as", config.peer_as);
        }
        if config.changes.is_changed("local-as") {
            self.add_item("local-as", config.local_as);
        }
        Ok(())
    }

    fn bgp_neighbor_timers_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        config: &BgpTimersConfig,
    ) -> ModelResult<()> {
        self.open_neighbor(addr);
        self.add_node("neighbors.timers.config");
        if config.changes.is_changed("hold-time") {
            self.add_item("hold-time", config.hold_time);
        }
        if config.changes.is_changed("keepalive-interval") {
            self.add_item("keepalive-interval", config.keepalive_interval);
        }
        Ok(())
    }

    fn bgp_neighbor_transport_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        config: &BgpTransportConfig,
    ) -> ModelResult<()> {
        self.open_neighbor(addr);
        self.add_node("neighbors.transport.config");
        if config.changes.is_changed("local-address") {
            if let Some(addr) = config.local_address {
                self.add_item("local-address", quote(addr));
            }
        }
        Ok(())
    }

    fn bgp_neighbor_apply_policy_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        config: &PolicyApplyConfig,
    ) -> ModelResult<()> {
        self.open_neighbor(addr);
        self.add_node("neighbors.apply-policy.config");
        if config.changes.is_changed("import-policy") {
            self.add_item("import-policy-list", quote_list(&config.import_policies));
        }
        if config.changes.is_changed("export-policy") {
            self.add_item("export-policy-list", quote_list(&config.export_policies));
        }
        if config.changes.is_changed("default-import-policy") {
            let name = policy_default_name(config.default_import_policy);
            self.add_item("default-import-policy", quote(name));
        }
        if config.changes.is_changed("default-export-policy") {
            let name = policy_default_name(config.default_export_policy);
            self.add_item("default-export-policy", quote(name));
        }
        Ok(())
    }

    fn bgp_neighbor_afi_safi(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        _entry: &BgpAfiSafi,
    ) -> ModelResult<()> {
        self.open_afi_safi(addr, afi_safi);
        Ok(())
    }

    /// `afi-safi-name` always comes from the list key.
    fn bgp_neighbor_afi_safi_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        _config: &BgpAfiSafiConfig,
    ) -> ModelResult<()> {
        self.open_afi_safi(addr, afi_safi);
        Ok(())
    }
}

impl PolicyDefinitionProcessor for GobgpConfig {
    fn policy_definition(&mut self, name: &str, _def: &PolicyDefinition) -> ModelResult<()> {
        self.open_policy(name);
        Ok(())
    }

    fn policy_definition_config(
        &mut self,
        _name: &str,
        _config: &PolicyDefinitionConfig,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn policy_statement(
        &mut self,
        policy: &str,
        statement: &str,
        _stmt: &PolicyStatement,
    ) -> ModelResult<()> {
        self.open_statement(policy, statement);
        Ok(())
    }

    fn policy_statement_config(
        &mut self,
        _policy: &str,
        _statement: &str,
        _config: &PolicyStatementConfig,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn policy_statement_actions_config(
        &mut self,
        policy: &str,
        statement: &str,
        config: &PolicyActionsConfig,
    ) -> ModelResult<()> {
        self.open_statement(policy, statement);
        self.add_node("policy-definitions.statements.actions");
        if config.changes.is_changed("policy-result") {
            let name = policy_result_name(config.policy_result);
            self.add_item("route-disposition", quote(name));
        }
        Ok(())
    }

    fn policy_bgp_actions_config(
        &mut self,
        policy: &str,
        statement: &str,
        config: &PolicyBgpActionsConfig,
    ) -> ModelResult<()> {
        self.open_statement(policy, statement);
        self.add_node("policy-definitions.statements.actions.bgp-actions");
        if config.changes.is_changed("set-next-hop") {
            self.add_item("set-next-hop", quote(bgp_nexthop_name(&config.set_next_hop)));
        }
        if config.changes.is_changed("set-local-pref") {
            self.add_item("set-local-pref", config.set_local_pref);
        }
        Ok(())
    }
}
