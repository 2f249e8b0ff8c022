//! Routing policy tree and the per-neighbor apply-policy container.
//!
//! ```text
//! routing-policy
//!  +- defined-sets
//!  |   +- prefix-sets/prefix-set[name] {config, prefixes/prefix[ip-prefix][masklength-range]}
//!  |   +- neighbor-sets/neighbor-set[name]/config
//!  |   +- tag-sets/tag-set[name]/config
//!  +- policy-definitions/policy-definition[name]
//!      +- config
//!      +- statements/statement[name] {config, actions {config, bgp-actions/config}}
//! ```

use netcfg_common::ChangeSet;
use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::error::ModelResult;
use crate::node::{key_attr, keyed_entry, string_key, ConfigContainer, ConfigNode};
use crate::processor::{ordered, PolicyDefinedSetsProcessor, PolicyDefinitionProcessor, Processor};
use crate::types::{
    parse_ip, parse_uint, BgpNexthop, IpPrefix, PolicyDefaultType, PolicyPrefixSetMode,
    PolicyResultType,
};
use crate::xpath::XPathNode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingPolicy {
    pub changes: ChangeSet,
    pub defined_sets: DefinedSets,
    pub policy_definitions: BTreeMap<String, PolicyDefinition>,
}

impl RoutingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_definitions(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "policy-definition" {
            return Ok(());
        }
        keyed_entry(&mut self.policy_definitions, node, "name", string_key, |name| {
            PolicyDefinition::new(name.as_str())
        })?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for RoutingPolicy {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "defined-sets" => self.defined_sets.put(&nodes[1..], value)?,
            "policy-definitions" => self.put_definitions(&nodes[1..], value)?,
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
pub struct DefinedSets {
    pub changes: ChangeSet,
    pub prefix_sets: BTreeMap<String, PrefixSet>,
    pub neighbor_sets: BTreeMap<String, NeighborSet>,
    pub tag_sets: BTreeMap<String, TagSet>,
}

impl ConfigNode for DefinedSets {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        let rest = &nodes[1..];
        match (node.name.as_str(), rest.first()) {
            ("prefix-sets", Some(entry)) if entry.name == "prefix-set" => {
                keyed_entry(&mut self.prefix_sets, entry, "name", string_key, |name| {
                    PrefixSet::new(name.as_str())
                })?
                .put(&rest[1..], value)?;
            }
            ("neighbor-sets", Some(entry)) if entry.name == "neighbor-set" => {
                keyed_entry(&mut self.neighbor_sets, entry, "name", string_key, |name| {
                    NeighborSet::new(name.as_str())
                })?
                .put(&rest[1..], value)?;
            }
            ("tag-sets", Some(entry)) if entry.name == "tag-set" => {
                keyed_entry(&mut self.tag_sets, entry, "name", string_key, |name| {
                    TagSet::new(name.as_str())
                })?
                .put(&rest[1..], value)?;
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
pub struct PrefixSet {
    pub changes: ChangeSet,
    pub name: String,
    pub config: PrefixSetConfig,
    pub prefixes: BTreeMap<PrefixKey, Prefix>,
}

impl PrefixSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn put_prefixes(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "prefix" {
            return Ok(());
        }
        let key = PrefixKey {
            ip_prefix: key_attr(node, "ip-prefix")?.to_string(),
            masklength_range: key_attr(node, "masklength-range")?.to_string(),
        };
        self.prefixes
            .entry(key)
            .or_insert_with_key(|key| Prefix::new(key.clone()))
            .put(&nodes[1..], value)
    }
}

impl ConfigNode for PrefixSet {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "prefixes" => self.put_prefixes(&nodes[1..], value)?,
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
pub struct PrefixSetConfig {
    pub changes: ChangeSet,
    pub name: String,
    pub mode: PolicyPrefixSetMode,
}

impl ConfigNode for PrefixSetConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "name" => self.name = value.to_string(),
            "mode" => self.mode = PolicyPrefixSetMode::parse(value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Key of a prefix-set entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixKey {
    pub ip_prefix: String,
    pub masklength_range: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prefix {
    pub changes: ChangeSet,
    pub key: PrefixKey,
    pub config: PrefixConfig,
}

impl Prefix {
    pub fn new(key: PrefixKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }
}

impl ConfigNode for Prefix {
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
pub struct PrefixConfig {
    pub changes: ChangeSet,
    pub ip_prefix: Option<IpPrefix>,
    /// `exact` or `<min>..<max>`.
    pub masklength_range: String,
}

impl ConfigNode for PrefixConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "ip-prefix" => self.ip_prefix = Some(IpPrefix::parse(value)?),
            "masklength-range" => self.masklength_range = value.to_string(),
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
pub struct NeighborSet {
    pub changes: ChangeSet,
    pub name: String,
    pub config: NeighborSetConfig,
}

impl NeighborSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for NeighborSet {
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
pub struct NeighborSetConfig {
    pub changes: ChangeSet,
    pub name: String,
    /// Each edit appends one address.
    pub addresses: Vec<IpAddr>,
}

impl ConfigNode for NeighborSetConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "name" => self.name = value.to_string(),
            "address" => self.addresses.push(parse_ip("address", value)?),
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
pub struct TagSet {
    pub changes: ChangeSet,
    pub name: String,
    pub config: TagSetConfig,
}

impl TagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for TagSet {
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
pub struct TagSetConfig {
    pub changes: ChangeSet,
    pub name: String,
    pub tag_value: u32,
}

impl ConfigNode for TagSetConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "name" => self.name = value.to_string(),
            "tag-value" => self.tag_value = parse_uint("tag-value", value)?,
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
pub struct PolicyDefinition {
    pub changes: ChangeSet,
    pub name: String,
    pub config: PolicyDefinitionConfig,
    pub statements: BTreeMap<String, PolicyStatement>,
}

impl PolicyDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn put_statements(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name != "statement" {
            return Ok(());
        }
        keyed_entry(&mut self.statements, node, "name", string_key, |name| {
            PolicyStatement::new(name.as_str())
        })?
        .put(&nodes[1..], value)
    }
}

impl ConfigNode for PolicyDefinition {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "statements" => self.put_statements(&nodes[1..], value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// `config` container holding only a `name` leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameConfig {
    pub changes: ChangeSet,
    pub name: String,
}

impl ConfigNode for NameConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "name" {
            self.name = value.to_string();
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

pub type PolicyDefinitionConfig = NameConfig;
pub type PolicyStatementConfig = NameConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyStatement {
    pub changes: ChangeSet,
    pub name: String,
    pub config: PolicyStatementConfig,
    pub actions: PolicyActions,
}

impl PolicyStatement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl ConfigNode for PolicyStatement {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "actions" => self.actions.put(&nodes[1..], value)?,
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
pub struct PolicyActions {
    pub changes: ChangeSet,
    pub config: PolicyActionsConfig,
    pub bgp_actions: ConfigContainer<PolicyBgpActionsConfig>,
}

impl ConfigNode for PolicyActions {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "config" => self.config.put(&nodes[1..], value)?,
            "bgp-actions" => self.bgp_actions.put(&nodes[1..], value)?,
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
pub struct PolicyActionsConfig {
    pub changes: ChangeSet,
    pub policy_result: PolicyResultType,
}

impl ConfigNode for PolicyActionsConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        if node.name == "policy-result" {
            self.policy_result = PolicyResultType::parse(value)?;
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyBgpActionsConfig {
    pub changes: ChangeSet,
    pub set_local_pref: u32,
    pub set_next_hop: BgpNexthop,
}

impl ConfigNode for PolicyBgpActionsConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "set-local-pref" => self.set_local_pref = parse_uint("set-local-pref", value)?,
            "set-next-hop" => self.set_next_hop = BgpNexthop::parse(value)?,
            _ => {}
        }
        self.changes.mark(node.name.as_str());
        Ok(())
    }

    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

/// Import/export policy chains bound to a BGP neighbor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyApplyConfig {
    pub changes: ChangeSet,
    pub import_policies: Vec<String>,
    pub default_import_policy: PolicyDefaultType,
    pub export_policies: Vec<String>,
    pub default_export_policy: PolicyDefaultType,
}

impl ConfigNode for PolicyApplyConfig {
    fn put(&mut self, nodes: &[XPathNode], value: &str) -> ModelResult<()> {
        let Some(node) = nodes.first() else {
            return Ok(());
        };
        match node.name.as_str() {
            "import-policy" => self.import_policies.push(value.to_string()),
            "export-policy" => self.export_policies.push(value.to_string()),
            "default-import-policy" => {
                self.default_import_policy = PolicyDefaultType::parse(value)?
            }
            "default-export-policy" => {
                self.default_export_policy = PolicyDefaultType::parse(value)?
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

/// Walks a routing-policy tree: defined sets, then policy definitions.
pub fn process_routing_policy(
    p: &mut dyn Processor,
    reverse: bool,
    policy: &RoutingPolicy,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        DefinedSets,
        Definitions,
    }

    for step in ordered([Step::DefinedSets, Step::Definitions], reverse) {
        match step {
            Step::DefinedSets if policy.changes.is_changed("defined-sets") => {
                if let Some(g) = p.as_policy_defined_sets() {
                    process_defined_sets(g, reverse, &policy.defined_sets)?;
                }
            }
            Step::Definitions if policy.changes.is_changed("policy-definitions") => {
                if let Some(g) = p.as_policy_definition() {
                    for def in policy.policy_definitions.values() {
                        process_policy_definition(g, reverse, def)?;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_defined_sets(
    g: &mut dyn PolicyDefinedSetsProcessor,
    reverse: bool,
    sets: &DefinedSets,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        PrefixSets,
        NeighborSets,
        TagSets,
    }

    let steps = [Step::PrefixSets, Step::NeighborSets, Step::TagSets];
    for step in ordered(steps, reverse) {
        match step {
            Step::PrefixSets if sets.changes.is_changed("prefix-sets") => {
                for set in sets.prefix_sets.values() {
                    process_prefix_set(g, reverse, set)?;
                }
            }
            Step::NeighborSets if sets.changes.is_changed("neighbor-sets") => {
                for set in sets.neighbor_sets.values() {
                    let name = set.name.as_str();
                    for own in ordered([true, false], reverse) {
                        if own && set.changes.is_changed("name") {
                            g.policy_neighbor_set(name, set)?;
                        } else if !own && set.changes.is_changed("config") {
                            g.policy_neighbor_set_config(name, &set.config)?;
                        }
                    }
                }
            }
            Step::TagSets if sets.changes.is_changed("tag-sets") => {
                for set in sets.tag_sets.values() {
                    let name = set.name.as_str();
                    for own in ordered([true, false], reverse) {
                        if own && set.changes.is_changed("name") {
                            g.policy_tag_set(name, set)?;
                        } else if !own && set.changes.is_changed("config") {
                            g.policy_tag_set_config(name, &set.config)?;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_prefix_set(
    g: &mut dyn PolicyDefinedSetsProcessor,
    reverse: bool,
    set: &PrefixSet,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Set,
        Config,
        Prefixes,
    }

    let name = set.name.as_str();
    tracing::debug!(prefix_set = name, changes = %set.changes, "Processing prefix-set");

    for step in ordered([Step::Set, Step::Config, Step::Prefixes], reverse) {
        match step {
            Step::Set if set.changes.is_changed("name") => g.policy_prefix_set(name, set)?,
            Step::Config if set.changes.is_changed("config") => {
                g.policy_prefix_set_config(name, &set.config)?
            }
            Step::Prefixes if set.changes.is_changed("prefixes") => {
                for (key, prefix) in &set.prefixes {
                    for own in ordered([true, false], reverse) {
                        if own && prefix.changes.all_changed(&["ip-prefix", "masklength-range"]) {
                            g.policy_prefix_set_prefix(name, key, prefix)?;
                        } else if !own && prefix.changes.is_changed("config") {
                            g.policy_prefix_set_prefix_config(name, key, &prefix.config)?;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_policy_definition(
    g: &mut dyn PolicyDefinitionProcessor,
    reverse: bool,
    def: &PolicyDefinition,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Definition,
        Config,
        Statements,
    }

    let name = def.name.as_str();
    tracing::debug!(policy = name, changes = %def.changes, "Processing policy-definition");

    for step in ordered([Step::Definition, Step::Config, Step::Statements], reverse) {
        match step {
            Step::Definition if def.changes.is_changed("name") => g.policy_definition(name, def)?,
            Step::Config if def.changes.is_changed("config") => {
                g.policy_definition_config(name, &def.config)?
            }
            Step::Statements if def.changes.is_changed("statements") => {
                for stmt in def.statements.values() {
                    process_policy_statement(g, reverse, name, stmt)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn process_policy_statement(
    g: &mut dyn PolicyDefinitionProcessor,
    reverse: bool,
    policy: &str,
    stmt: &PolicyStatement,
) -> ModelResult<()> {
    #[derive(Clone, Copy)]
    enum Step {
        Statement,
        Config,
        Actions,
        BgpActions,
    }

    let name = stmt.name.as_str();
    let actions = &stmt.actions;
    let steps = [Step::Statement, Step::Config, Step::Actions, Step::BgpActions];

    for step in ordered(steps, reverse) {
        match step {
            Step::Statement if stmt.changes.is_changed("name") => {
                g.policy_statement(policy, name, stmt)?
            }
            Step::Config if stmt.changes.is_changed("config") => {
                g.policy_statement_config(policy, name, &stmt.config)?
            }
            Step::Actions
                if stmt.changes.is_changed("actions") && actions.changes.is_changed("config") =>
            {
                g.policy_statement_actions_config(policy, name, &actions.config)?
            }
            Step::BgpActions
                if stmt.changes.is_changed("actions")
                    && actions.changes.is_changed("bgp-actions")
                    && actions.bgp_actions.changes.is_changed("config") =>
            {
                g.policy_bgp_actions_config(policy, name, &actions.bgp_actions.config)?
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

    fn put(policy: &mut RoutingPolicy, xpath: &str, value: &str) {
        policy.put(&parse_xpath(xpath).unwrap(), value).unwrap();
    }

    #[test]
    fn test_put_prefix_set() {
        let mut policy = RoutingPolicy::new();
        let base = "/defined-sets/prefix-sets/prefix-set[name='ps1']";
        put(&mut policy, &format!("{}/name", base), "ps1");
        put(&mut policy, &format!("{}/config/mode", base), "IPV4");
        put(
            &mut policy,
            &format!(
                "{}/prefixes/prefix[ip-prefix='10.0.0.0/8'][masklength-range='exact']/config/ip-prefix",
                base
            ),
            "10.0.0.0/8",
        );

        let set = &policy.defined_sets.prefix_sets["ps1"];
        assert!(set.changes.equals_exactly(&["name", "config", "prefixes"]));
        assert_eq!(set.config.mode, PolicyPrefixSetMode::IPV4);

        let key = PrefixKey {
            ip_prefix: "10.0.0.0/8".to_string(),
            masklength_range: "exact".to_string(),
        };
        let prefix = &set.prefixes[&key];
        assert_eq!(prefix.config.ip_prefix.unwrap().len, 8);
    }

    #[test]
    fn test_put_prefix_needs_both_keys() {
        let mut policy = RoutingPolicy::new();
        let err = policy
            .put(
                &parse_xpath(
                    "/defined-sets/prefix-sets/prefix-set[name='ps1']/prefixes/prefix[ip-prefix='10.0.0.0/8']/config",
                )
                .unwrap(),
                "",
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("prefix@masklength-range not found."));
    }

    #[test]
    fn test_put_statement_actions() {
        let mut policy = RoutingPolicy::new();
        let base = "/policy-definitions/policy-definition[name='pol']/statements/statement[name='s1']";
        put(
            &mut policy,
            &format!("{}/actions/config/policy-result", base),
            "ACCEPT_ROUTE",
        );
        put(
            &mut policy,
            &format!("{}/actions/bgp-actions/config/set-next-hop", base),
            "SELF",
        );

        let stmt = &policy.policy_definitions["pol"].statements["s1"];
        assert_eq!(stmt.actions.config.policy_result, PolicyResultType::ACCEPT_ROUTE);
        assert_eq!(
            stmt.actions.bgp_actions.config.set_next_hop,
            BgpNexthop::SelfNexthop
        );
    }

    #[test]
    fn test_apply_policy_appends() {
        let mut apply = PolicyApplyConfig::default();
        apply.put(&[XPathNode::new("import-policy")], "p1").unwrap();
        apply.put(&[XPathNode::new("import-policy")], "p2").unwrap();
        apply
            .put(&[XPathNode::new("default-import-policy")], "REJECT_ROUTE")
            .unwrap();
        assert_eq!(apply.import_policies, vec!["p1", "p2"]);
        assert_eq!(apply.default_import_policy, PolicyDefaultType::REJECT_ROUTE);
    }

    #[test]
    fn test_invalid_next_hop() {
        let mut policy = RoutingPolicy::new();
        let err = policy
            .put(
                &parse_xpath(
                    "/policy-definitions/policy-definition[name='pol']/statements/statement[name='s1']/actions/bgp-actions/config/set-next-hop",
                )
                .unwrap(),
                "next",
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Bgp Nexthop. next");
    }
}
