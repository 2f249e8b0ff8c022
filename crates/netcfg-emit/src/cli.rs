//! vtysh session builder and emitter.
//!
//! A session is the ordered list of lines fed to `vtysh -c ...`. Every
//! session opens the configuration mode and closes it again; directives
//! that live inside a router, interface or address-family context are
//! wrapped in that context and its matching `exit`.
//!
//! [`CliProcessor`] walks the OSPFv2, MPLS/LDP and static-route subtrees
//! and produces one session per changed leaf. Each session remembers the
//! network instance it belongs to; sessions of any instance other than the
//! default one go to that instance's frr with `vtysh -N <name>`.

use std::net::IpAddr;

use netcfg_common::Shell;
use netcfg_model::mpls::{
    MplsGlobalConfig, MplsLdpConfig, MplsLdpHelloConfig, MplsLdpInterface,
    MplsLdpInterfaceConfig, MplsLdpIpv4Config,
};
use netcfg_model::ospfv2::{
    Ospfv2, Ospfv2Area, Ospfv2AreaConfig, Ospfv2GlobalConfig, Ospfv2Interface,
    Ospfv2InterfaceConfig, Ospfv2InterfaceTimers,
};
use netcfg_model::processor::{MplsProcessor, Ospfv2Processor, StaticRouteProcessor};
use netcfg_model::static_route::{StaticNexthop, StaticNexthopConfig, StaticRoute, StaticRouteConfig};
use netcfg_model::{ModelResult, OspfNetworkType, Processor, ProtocolKey, StaticRouteKey};

use crate::error::{EmitError, EmitResult};

pub const CMD_CONF_BEGIN: &str = "configure terminal";
pub const CMD_CONF_END: &str = "end";
pub const CMD_EXIT: &str = "exit";
pub const CMD_WRITE_FILE: &str = "write file";

/// Builds the lines of one vtysh session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VtySession {
    negate: bool,
}

impl VtySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose directive is prefixed with `no ` when `negate` is set.
    pub fn negated(negate: bool) -> Self {
        Self { negate }
    }

    fn directive(&self, args: &str) -> String {
        if self.negate {
            format!("no {}", args)
        } else {
            args.to_string()
        }
    }

    fn wrap(&self, context: &[String], args: &str) -> Vec<String> {
        let mut lines = vec![CMD_CONF_BEGIN.to_string()];
        lines.extend(context.iter().cloned());
        lines.push(self.directive(args));
        if !context.is_empty() {
            lines.push(CMD_EXIT.to_string());
        }
        lines.push(CMD_CONF_END.to_string());
        lines
    }

    /// A directive at the top of the configuration mode.
    pub fn global(&self, args: &str) -> Vec<String> {
        self.wrap(&[], args)
    }

    pub fn ospf_router(&self, args: &str) -> Vec<String> {
        self.wrap(&["router ospf".to_string()], args)
    }

    pub fn ospf_interface(&self, ifname: &str, args: &str) -> Vec<String> {
        self.wrap(&[format!("interface {}", ifname)], args)
    }

    /// `mpls ldp` is closed by `end` alone.
    pub fn mpls_ldp(&self, args: &str) -> Vec<String> {
        vec![
            CMD_CONF_BEGIN.to_string(),
            "mpls ldp".to_string(),
            self.directive(args),
            CMD_CONF_END.to_string(),
        ]
    }

    /// A directive under `mpls ldp` / `address-family ipv<N>`, optionally
    /// inside `interface <ifname>`.
    pub fn mpls_ldp_af(&self, ipv: u8, ifname: Option<&str>, args: &str) -> Vec<String> {
        let mut lines = vec![
            CMD_CONF_BEGIN.to_string(),
            "mpls ldp".to_string(),
            format!("address-family ipv{}", ipv),
        ];
        match ifname {
            Some(ifname) => {
                lines.push(format!("interface {}", ifname));
                lines.push(self.directive(args));
                lines.push(CMD_EXIT.to_string());
            }
            None => lines.push(self.directive(args)),
        }
        lines.push(CMD_EXIT.to_string());
        lines.push(CMD_CONF_END.to_string());
        lines
    }

    /// `ip <args>`, e.g. `ip route 10.0.0.0/8 192.168.0.1`.
    pub fn ip_route(&self, args: &str) -> Vec<String> {
        self.global(&format!("ip {}", args))
    }
}

/// `["-N", instance]` for a non-default instance, nothing otherwise.
pub fn vtysh_instance_args(instance: &str, default_instance: &str) -> Vec<String> {
    if instance.is_empty() || instance == default_instance {
        Vec::new()
    } else {
        vec!["-N".to_string(), instance.to_string()]
    }
}

/// `["-c", cmd, "-c", cmd, ...]`
pub fn vtysh_args<S: AsRef<str>>(cmds: &[S]) -> Vec<String> {
    cmds.iter()
        .flat_map(|cmd| ["-c".to_string(), cmd.as_ref().to_string()])
        .collect()
}

/// `vtysh -c "write file"`
pub fn vtysh_save(vtysh: &str) -> Shell {
    Shell::new(vtysh, vtysh_args(&[CMD_WRITE_FILE]))
}

fn ospf_network_name(v: OspfNetworkType) -> EmitResult<&'static str> {
    match v {
        OspfNetworkType::POINT_TO_POINT_NETWORK => Ok("point-to-point"),
        OspfNetworkType::BROADCAST_NETWORK => Ok("broadcast"),
        OspfNetworkType::NON_BROADCAST_NETWORK => Ok("non-broadcast"),
        _ => Err(EmitError::unsupported("network-type", v)),
    }
}

fn static_nexthop_arg(next_hop: &str) -> EmitResult<String> {
    if next_hop.parse::<IpAddr>().is_ok() {
        return Ok(next_hop.to_string());
    }
    match next_hop {
        "DROP" => Ok("null0".to_string()),
        _ => Err(EmitError::unsupported("next-hop", next_hop)),
    }
}

/// One vtysh session and the network instance it configures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VtyBatch {
    pub instance: String,
    pub lines: Vec<String>,
}

/// Accumulated vtysh sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliProcessor {
    batches: Vec<VtyBatch>,
}

impl CliProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, instance: &str, lines: Vec<String>) {
        tracing::debug!(instance, batch = ?lines, "vty session");
        self.batches.push(VtyBatch {
            instance: instance.to_string(),
            lines,
        });
    }

    pub fn batches(&self) -> &[VtyBatch] {
        &self.batches
    }

    /// One `vtysh [-N <instance>] -c ... -c ...` shell per session.
    pub fn shells(&self, vtysh: &str, default_instance: &str) -> Vec<Shell> {
        self.batches
            .iter()
            .map(|batch| {
                let mut args = vtysh_instance_args(&batch.instance, default_instance);
                args.extend(vtysh_args(&batch.lines));
                Shell::new(vtysh, args)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    fn ldp_hello(
        &mut self,
        instance: &str,
        ifname: Option<&str>,
        holdtime: Option<u16>,
        interval: Option<u16>,
    ) {
        let vty = VtySession::new();
        let cmds = [
            holdtime.map(|v| format!("discovery hello holdtime {}", v)),
            interval.map(|v| format!("discovery hello interval {}", v)),
        ];
        for cmd in cmds.into_iter().flatten() {
            let batch = match ifname {
                Some(ifname) => vty.mpls_ldp_af(4, Some(ifname), &cmd),
                None => vty.mpls_ldp(&cmd),
            };
            self.push(instance, batch);
        }
    }
}

impl Processor for CliProcessor {
    fn as_mpls(&mut self) -> Option<&mut dyn MplsProcessor> {
        Some(self)
    }

    fn as_static_route(&mut self) -> Option<&mut dyn StaticRouteProcessor> {
        Some(self)
    }

    fn as_ospfv2(&mut self) -> Option<&mut dyn Ospfv2Processor> {
        Some(self)
    }
}

impl Ospfv2Processor for CliProcessor {
    fn ospfv2(&mut self, _name: &str, _key: &ProtocolKey, _ospf: &Ospfv2) -> ModelResult<()> {
        Ok(())
    }

    fn ospfv2_global_config(
        &mut self,
        name: &str,
        _key: &ProtocolKey,
        config: &Ospfv2GlobalConfig,
    ) -> ModelResult<()> {
        if config.changes.is_changed("router-id") {
            let Some(router_id) = config.router_id else {
                return Err(EmitError::missing("router-id", "ospfv2/global/config").into());
            };
            self.push(name, VtySession::new().ospf_router(&format!("router-id {}", router_id)));
        }
        Ok(())
    }

    fn ospfv2_area(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _area_id: &str,
        _area: &Ospfv2Area,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn ospfv2_area_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _area_id: &str,
        _config: &Ospfv2AreaConfig,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn ospfv2_interface(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _area_id: &str,
        _ifid: &str,
        _iface: &Ospfv2Interface,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn ospfv2_interface_config(
        &mut self,
        name: &str,
        _key: &ProtocolKey,
        _area_id: &str,
        ifid: &str,
        config: &Ospfv2InterfaceConfig,
    ) -> ModelResult<()> {
        let vty = VtySession::new();
        let changes = &config.changes;

        if changes.is_changed("metric") {
            let cmd = format!("ip ospf cost {}", config.metric);
            self.push(name, vty.ospf_interface(ifid, &cmd));
        }
        if changes.is_changed("passive") {
            let cmd = format!("passive-interface {}", ifid);
            self.push(name, VtySession::negated(!config.passive).ospf_router(&cmd));
        }
        if changes.is_changed("priority") {
            let cmd = format!("ip ospf priority {}", config.priority);
            self.push(name, vty.ospf_interface(ifid, &cmd));
        }
        if changes.is_changed("network-type") {
            let network = ospf_network_name(config.network_type)?;
            let cmd = format!("ip ospf network {}", network);
            self.push(name, vty.ospf_interface(ifid, &cmd));
        }
        Ok(())
    }

    fn ospfv2_interface_timers(
        &mut self,
        name: &str,
        _key: &ProtocolKey,
        _area_id: &str,
        ifid: &str,
        timers: &Ospfv2InterfaceTimers,
    ) -> ModelResult<()> {
        let vty = VtySession::new();
        if timers.changes.is_changed("dead-interval") {
            let cmd = format!("ip ospf dead-interval {}", timers.dead_interval);
            self.push(name, vty.ospf_interface(ifid, &cmd));
        }
        if timers.changes.is_changed("hello-interval") {
            let cmd = format!("ip ospf hello-interval {}", timers.hello_interval);
            self.push(name, vty.ospf_interface(ifid, &cmd));
        }
        Ok(())
    }
}

impl MplsProcessor for CliProcessor {
    fn mpls_global_config(&mut self, _name: &str, _config: &MplsGlobalConfig) -> ModelResult<()> {
        Ok(())
    }

    fn mpls_ldp_config(&mut self, name: &str, config: &MplsLdpConfig) -> ModelResult<()> {
        if config.changes.is_changed("lsr-id") {
            let Some(lsr_id) = config.lsr_id else {
                return Err(EmitError::missing("lsr-id", "ldp/global/config").into());
            };
            self.push(name, VtySession::new().mpls_ldp(&format!("router-id {}", lsr_id)));
        }
        Ok(())
    }

    fn mpls_ldp_ipv4_config(&mut self, name: &str, config: &MplsLdpIpv4Config) -> ModelResult<()> {
        let vty = VtySession::new();
        let changes = &config.changes;

        if changes.is_changed("transport-address") {
            if let Some(addr) = config.transport_address {
                let cmd = format!("discovery transport-address {}", addr);
                self.push(name, vty.mpls_ldp_af(4, None, &cmd));
            }
        }
        if changes.is_changed("session-ka-holdtime") {
            let cmd = format!("session holdtime {}", config.session_ka_holdtime);
            self.push(name, vty.mpls_ldp_af(4, None, &cmd));
        }
        if changes.is_changed("label-policy") && config.explicit_null.changes.is_changed("enable") {
            let vty = VtySession::negated(!config.explicit_null.enable);
            self.push(name, vty.mpls_ldp_af(4, None, "label local advertise explicit-null"));
        }
        Ok(())
    }

    fn mpls_ldp_discovery_interfaces_config(
        &mut self,
        name: &str,
        config: &MplsLdpHelloConfig,
    ) -> ModelResult<()> {
        let changes = &config.changes;
        self.ldp_hello(
            name,
            None,
            changes.is_changed("hello-holdtime").then_some(config.hello_holdtime),
            changes.is_changed("hello-interval").then_some(config.hello_interval),
        );
        Ok(())
    }

    fn mpls_ldp_interface(
        &mut self,
        _name: &str,
        _ifid: &str,
        _iface: &MplsLdpInterface,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn mpls_ldp_interface_config(
        &mut self,
        name: &str,
        ifid: &str,
        config: &MplsLdpInterfaceConfig,
    ) -> ModelResult<()> {
        let changes = &config.changes;
        self.ldp_hello(
            name,
            Some(ifid),
            changes.is_changed("hello-holdtime").then_some(config.hello_holdtime),
            changes.is_changed("hello-interval").then_some(config.hello_interval),
        );
        Ok(())
    }
}

impl StaticRouteProcessor for CliProcessor {
    fn static_route(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _route_key: &StaticRouteKey,
        _route: &StaticRoute,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn static_route_config(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _route_key: &StaticRouteKey,
        _config: &StaticRouteConfig,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn static_route_nexthop(
        &mut self,
        _name: &str,
        _key: &ProtocolKey,
        _route_key: &StaticRouteKey,
        _index: &str,
        _nexthop: &StaticNexthop,
    ) -> ModelResult<()> {
        Ok(())
    }

    fn static_route_nexthop_config(
        &mut self,
        name: &str,
        _key: &ProtocolKey,
        route_key: &StaticRouteKey,
        _index: &str,
        config: &StaticNexthopConfig,
    ) -> ModelResult<()> {
        if config.changes.is_changed("next-hop") {
            let nexthop = static_nexthop_arg(&config.next_hop)?;
            let cmd = format!("route {} {}", route_key, nexthop);
            self.push(name, VtySession::new().ip_route(&cmd));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcfg_model::{parse_xpath, process_network_instances, ConfigNode, NetworkInstances};
    use pretty_assertions::assert_eq;

    fn instances(edits: &[(String, &str)]) -> NetworkInstances {
        let mut nis = NetworkInstances::new();
        for (xpath, value) in edits {
            nis.put(&parse_xpath(xpath).unwrap(), value).unwrap();
        }
        nis
    }

    fn render(edits: &[(String, &str)]) -> ModelResult<Vec<Vec<String>>> {
        let mut cli = CliProcessor::new();
        process_network_instances(&mut cli, false, &instances(edits))?;
        Ok(cli.batches().iter().map(|b| b.lines.clone()).collect())
    }

    const OSPF: &str = "/network-instance[name='mic']/protocols/protocol[identifier='OSPF'][name='ospf']/ospfv2";
    const LDP: &str = "/network-instance[name='mic']/mpls/signaling-protocols/ldp/global";

    #[test]
    fn test_session_builders() {
        let vty = VtySession::new();
        assert_eq!(vty.global("hostname r1"), vec!["configure terminal", "hostname r1", "end"]);
        assert_eq!(
            VtySession::negated(true).ospf_router("passive-interface eth1"),
            vec![
                "configure terminal",
                "router ospf",
                "no passive-interface eth1",
                "exit",
                "end"
            ]
        );
        assert_eq!(
            vty.mpls_ldp("router-id 10.0.0.1"),
            vec!["configure terminal", "mpls ldp", "router-id 10.0.0.1", "end"]
        );
        assert_eq!(
            vty.mpls_ldp_af(4, Some("eth1"), "discovery hello interval 5"),
            vec![
                "configure terminal",
                "mpls ldp",
                "address-family ipv4",
                "interface eth1",
                "discovery hello interval 5",
                "exit",
                "exit",
                "end"
            ]
        );
        assert_eq!(
            VtySession::negated(true).ip_route("route 10.0.0.0/8 null0"),
            vec!["configure terminal", "no ip route 10.0.0.0/8 null0", "end"]
        );
    }

    #[test]
    fn test_vtysh_args() {
        assert_eq!(
            vtysh_args(&["configure terminal", "end"]),
            vec!["-c", "configure terminal", "-c", "end"]
        );
        assert_eq!(vtysh_save("/usr/bin/vtysh").to_string(), "/usr/bin/vtysh -c \"write file\"");
    }

    #[test]
    fn test_ospf_interface() {
        let iface = format!("{}/areas/area[identifier='0.0.0.0']/interfaces/interface[id='eth1']", OSPF);
        let batches = render(&[
            (format!("{}/global/config/router-id", OSPF), "10.0.0.1"),
            (format!("{}/config/metric", iface), "10"),
            (format!("{}/config/passive", iface), "false"),
            (format!("{}/config/network-type", iface), "POINT_TO_POINT_NETWORK"),
            (format!("{}/timers/hello-interval", iface), "5"),
        ])
        .unwrap();

        let lines: Vec<&str> = batches.iter().map(|b| b[2].as_str()).collect();
        assert_eq!(
            lines,
            vec![
                "router-id 10.0.0.1",
                "ip ospf cost 10",
                "no passive-interface eth1",
                "ip ospf network point-to-point",
                "ip ospf hello-interval 5",
            ]
        );
        assert_eq!(
            batches[1],
            vec!["configure terminal", "interface eth1", "ip ospf cost 10", "exit", "end"]
        );
    }

    #[test]
    fn test_ospf_unsupported_network_type() {
        let iface = format!("{}/areas/area[identifier='0.0.0.0']/interfaces/interface[id='eth1']", OSPF);
        let err = render(&[(format!("{}/config/network-type", iface), "OSPF_NETWORK_TYPE")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported network-type: OSPF_NETWORK_TYPE");
    }

    #[test]
    fn test_ldp() {
        let batches = render(&[
            (format!("{}/config/lsr-id", LDP), "10.0.0.1"),
            (format!("{}/address-families/ipv4/config/session-ka-holdtime", LDP), "180"),
            (
                format!(
                    "{}/address-families/ipv4/config/label-policy/advertise/egress-explicit-null/enable",
                    LDP
                ),
                "false",
            ),
            (format!("{}/discovery/interfaces/config/hello-holdtime", LDP), "15"),
            (
                format!("{}/discovery/interfaces/interface[interface-id='eth1']/config/hello-interval", LDP),
                "5",
            ),
        ])
        .unwrap();

        assert_eq!(
            batches,
            vec![
                vec!["configure terminal", "mpls ldp", "router-id 10.0.0.1", "end"],
                vec![
                    "configure terminal",
                    "mpls ldp",
                    "address-family ipv4",
                    "session holdtime 180",
                    "exit",
                    "end"
                ],
                vec![
                    "configure terminal",
                    "mpls ldp",
                    "address-family ipv4",
                    "no label local advertise explicit-null",
                    "exit",
                    "end"
                ],
                vec!["configure terminal", "mpls ldp", "discovery hello holdtime 15", "end"],
                vec![
                    "configure terminal",
                    "mpls ldp",
                    "address-family ipv4",
                    "interface eth1",
                    "discovery hello interval 5",
                    "exit",
                    "exit",
                    "end"
                ],
            ]
        );
    }

    #[test]
    fn test_static_route() {
        let route = "/network-instance[name='mic']/protocols/protocol[identifier='STATIC'][name='static']/static-routes/static[ip='10.1.0.0'][prefix-length='16']";
        let batches = render(&[
            (format!("{}/next-hops/next-hop[index='1']/config/next-hop", route), "192.168.0.1"),
            (format!("{}/next-hops/next-hop[index='2']/config/next-hop", route), "DROP"),
        ])
        .unwrap();
        assert_eq!(
            batches,
            vec![
                vec!["configure terminal", "ip route 10.1.0.0/16 192.168.0.1", "end"],
                vec!["configure terminal", "ip route 10.1.0.0/16 null0", "end"],
            ]
        );

        let err = render(&[(format!("{}/next-hops/next-hop[index='1']/config/next-hop", route), "LOCAL_LINK")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported next-hop: LOCAL_LINK");
    }

    #[test]
    fn test_shells() {
        let mut cli = CliProcessor::new();
        cli.push("mic", VtySession::new().mpls_ldp("router-id 10.0.0.1"));
        let shells = cli.shells("/usr/bin/vtysh", "mic");
        assert_eq!(shells.len(), 1);
        assert_eq!(
            shells[0].args,
            vec!["-c", "configure terminal", "-c", "mpls ldp", "-c", "router-id 10.0.0.1", "-c", "end"]
        );
    }

    #[test]
    fn test_sessions_target_their_instance() {
        let router_id = |ni: &str| {
            format!(
                "/network-instance[name='{}']/protocols/protocol[identifier='OSPF'][name='ospf']/ospfv2/global/config/router-id",
                ni
            )
        };
        let mut cli = CliProcessor::new();
        let nis = instances(&[(router_id("mic"), "10.0.0.1"), (router_id("ric1"), "10.0.1.1")]);
        process_network_instances(&mut cli, false, &nis).unwrap();

        let instances: Vec<&str> = cli.batches().iter().map(|b| b.instance.as_str()).collect();
        assert_eq!(instances, vec!["mic", "ric1"]);

        let shells = cli.shells("/usr/bin/vtysh", "mic");
        assert_eq!(shells[0].args[..2], ["-c", "configure terminal"]);
        assert_eq!(shells[1].args[..4], ["-N", "ric1", "-c", "configure terminal"]);
        assert_eq!(
            shells[1].to_string(),
            "/usr/bin/vtysh -N ric1 -c \"configure terminal\" -c \"router ospf\" -c \"router-id 10.0.1.1\" -c exit -c end"
        );
    }

    #[test]
    fn test_vtysh_instance_args() {
        assert!(vtysh_instance_args("mic", "mic").is_empty());
        assert!(vtysh_instance_args("", "mic").is_empty());
        assert_eq!(vtysh_instance_args("ric1", "mic"), vec!["-N", "ric1"]);
    }
}
