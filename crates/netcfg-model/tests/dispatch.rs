//! Tree walk ordering, gating and capability detection.

use netcfg_model::bgp::{
    Bgp, BgpAfiSafi, BgpAfiSafiConfig, BgpGlobalConfig, BgpNeighbor, BgpNeighborConfig,
    BgpTimersConfig, BgpTransportConfig, BgpZebraConfig,
};
use netcfg_model::network_instance::{NetworkInstanceConfig, Protocol, ProtocolConfig};
use netcfg_model::ospfv2::{
    Ospfv2, Ospfv2Area, Ospfv2AreaConfig, Ospfv2GlobalConfig, Ospfv2Interface,
    Ospfv2InterfaceConfig, Ospfv2InterfaceTimers,
};
use netcfg_model::policy::PolicyApplyConfig;
use netcfg_model::processor::{
    BgpGlobalProcessor, BgpNeighborProcessor, BgpProcessor, BgpZebraProcessor,
    NetworkInstanceProcessor, Ospfv2Processor,
};
use netcfg_model::{
    parse_xpath, process_network_instances, AfiSafiType, ConfigNode, ModelError, ModelResult,
    NetworkInstance, NetworkInstances, Processor, ProtocolKey,
};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
    with_neighbors: bool,
    fail_on_zebra: bool,
}

impl Recorder {
    fn record(&mut self, call: String) -> ModelResult<()> {
        self.calls.push(call);
        Ok(())
    }
}

impl Processor for Recorder {
    fn as_bgp(&mut self) -> Option<&mut dyn BgpProcessor> {
        Some(self)
    }

    fn as_bgp_global(&mut self) -> Option<&mut dyn BgpGlobalProcessor> {
        Some(self)
    }

    fn as_bgp_zebra(&mut self) -> Option<&mut dyn BgpZebraProcessor> {
        Some(self)
    }

    fn as_bgp_neighbor(&mut self) -> Option<&mut dyn BgpNeighborProcessor> {
        if self.with_neighbors {
            Some(self)
        } else {
            None
        }
    }

    fn as_network_instance(&mut self) -> Option<&mut dyn NetworkInstanceProcessor> {
        Some(self)
    }

    fn as_ospfv2(&mut self) -> Option<&mut dyn Ospfv2Processor> {
        Some(self)
    }
}

impl NetworkInstanceProcessor for Recorder {
    fn network_instance(&mut self, name: &str, _: &NetworkInstance) -> ModelResult<()> {
        self.record(format!("ni:{}", name))
    }

    fn network_instance_config(
        &mut self,
        name: &str,
        config: &NetworkInstanceConfig,
    ) -> ModelResult<()> {
        self.record(format!("ni-config:{}:{}", name, config.instance_type))
    }

    fn network_instance_protocol(
        &mut self,
        _: &str,
        key: &ProtocolKey,
        _: &Protocol,
    ) -> ModelResult<()> {
        self.record(format!("protocol:{}", key))
    }

    fn network_instance_protocol_config(
        &mut self,
        _: &str,
        key: &ProtocolKey,
        _: &ProtocolConfig,
    ) -> ModelResult<()> {
        self.record(format!("protocol-config:{}", key))
    }
}

impl BgpProcessor for Recorder {
    fn bgp(&mut self, name: &str, _: &ProtocolKey, _: &Bgp) -> ModelResult<()> {
        self.record(format!("bgp:{}", name))
    }
}

impl BgpGlobalProcessor for Recorder {
    fn bgp_global_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        config: &BgpGlobalConfig,
    ) -> ModelResult<()> {
        self.record(format!("global:{}", config.as_number))
    }
}

impl BgpZebraProcessor for Recorder {
    fn bgp_zebra_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        config: &BgpZebraConfig,
    ) -> ModelResult<()> {
        if self.fail_on_zebra {
            return Err(ModelError::invalid_value("zebra", "refused"));
        }
        self.record(format!("zebra:{}", config.enabled))
    }
}

impl BgpNeighborProcessor for Recorder {
    fn bgp_neighbor(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        _: &BgpNeighbor,
    ) -> ModelResult<()> {
        self.record(format!("neighbor:{}", addr))
    }

    fn bgp_neighbor_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        config: &BgpNeighborConfig,
    ) -> ModelResult<()> {
        self.record(format!("neighbor-config:{}:{}", addr, config.peer_as))
    }

    fn bgp_neighbor_timers_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        config: &BgpTimersConfig,
    ) -> ModelResult<()> {
        self.record(format!("neighbor-timers:{}:{}", addr, config.hold_time))
    }

    fn bgp_neighbor_transport_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        _: &BgpTransportConfig,
    ) -> ModelResult<()> {
        self.record(format!("neighbor-transport:{}", addr))
    }

    fn bgp_neighbor_apply_policy_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        _: &PolicyApplyConfig,
    ) -> ModelResult<()> {
        self.record(format!("neighbor-apply-policy:{}", addr))
    }

    fn bgp_neighbor_afi_safi(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        _: &BgpAfiSafi,
    ) -> ModelResult<()> {
        self.record(format!("afi-safi:{}:{}", addr, afi_safi))
    }

    fn bgp_neighbor_afi_safi_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        _: &BgpAfiSafiConfig,
    ) -> ModelResult<()> {
        self.record(format!("afi-safi-config:{}:{}", addr, afi_safi))
    }
}

impl Ospfv2Processor for Recorder {
    fn ospfv2(&mut self, name: &str, _: &ProtocolKey, _: &Ospfv2) -> ModelResult<()> {
        self.record(format!("ospfv2:{}", name))
    }

    fn ospfv2_global_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        _: &Ospfv2GlobalConfig,
    ) -> ModelResult<()> {
        self.record("ospfv2-global".to_string())
    }

    fn ospfv2_area(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        area_id: &str,
        _: &Ospfv2Area,
    ) -> ModelResult<()> {
        self.record(format!("area:{}", area_id))
    }

    fn ospfv2_area_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        area_id: &str,
        _: &Ospfv2AreaConfig,
    ) -> ModelResult<()> {
        self.record(format!("area-config:{}", area_id))
    }

    fn ospfv2_interface(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        _: &str,
        ifid: &str,
        _: &Ospfv2Interface,
    ) -> ModelResult<()> {
        self.record(format!("ospf-if:{}", ifid))
    }

    fn ospfv2_interface_config(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        _: &str,
        ifid: &str,
        _: &Ospfv2InterfaceConfig,
    ) -> ModelResult<()> {
        self.record(format!("ospf-if-config:{}", ifid))
    }

    fn ospfv2_interface_timers(
        &mut self,
        _: &str,
        _: &ProtocolKey,
        _: &str,
        ifid: &str,
        _: &Ospfv2InterfaceTimers,
    ) -> ModelResult<()> {
        self.record(format!("ospf-if-timers:{}", ifid))
    }
}

const NI: &str = "/network-instance[name='mic']";
const BGP: &str = "/network-instance[name='mic']/protocols/protocol[identifier='BGP'][name='bgp']";
const NEIGH: &str = "/bgp/neighbors/neighbor[neighbor-address='10.0.0.2']";

fn build(edits: &[(String, &str)]) -> NetworkInstances {
    let mut nis = NetworkInstances::new();
    for (xpath, value) in edits {
        nis.put(&parse_xpath(xpath).unwrap(), value).unwrap();
    }
    nis
}

fn bgp_edits() -> Vec<(String, &'static str)> {
    vec![
        (format!("{}/name", NI), "mic"),
        (format!("{}/config/type", NI), "DEFAULT_INSTANCE"),
        (format!("{}/identifier", BGP), "BGP"),
        (format!("{}/name", BGP), "bgp"),
        (format!("{}/bgp/global/config/as", BGP), "65001"),
        (format!("{}/bgp/zebra/config/enabled", BGP), "true"),
        (format!("{}{}/neighbor-address", BGP, NEIGH), "10.0.0.2"),
        (format!("{}{}/config/peer-as", BGP, NEIGH), "65002"),
        (format!("{}{}/timers/config/hold-time", BGP, NEIGH), "90"),
    ]
}

fn walk(recorder: &mut Recorder, reverse: bool, nis: &NetworkInstances) -> Vec<String> {
    process_network_instances(recorder, reverse, nis).unwrap();
    std::mem::take(&mut recorder.calls)
}

#[test]
fn test_walk_order() {
    let nis = build(&bgp_edits());
    let mut recorder = Recorder {
        with_neighbors: true,
        ..Default::default()
    };

    assert_eq!(
        walk(&mut recorder, false, &nis),
        vec![
            "ni:mic",
            "ni-config:mic:DEFAULT_INSTANCE",
            "protocol:BGP/bgp",
            "bgp:mic",
            "global:65001",
            "zebra:true",
            "neighbor:10.0.0.2",
            "neighbor-config:10.0.0.2:65002",
            "neighbor-timers:10.0.0.2:90",
        ]
    );
}

#[test]
fn test_reverse_walk_flips_order() {
    let nis = build(&bgp_edits());
    let mut recorder = Recorder {
        with_neighbors: true,
        ..Default::default()
    };

    let forward = walk(&mut recorder, false, &nis);
    let mut reverse = walk(&mut recorder, true, &nis);
    reverse.reverse();
    assert_eq!(reverse, forward);
}

#[test]
fn test_reverse_walk_flips_afi_safi_pair() {
    let afi = format!("{}{}/afi-safis/afi-safi[afi-safi-name='IPV4_UNICAST']", BGP, NEIGH);
    let nis = build(&[
        (format!("{}/afi-safi-name", afi), "IPV4_UNICAST"),
        (format!("{}/config/afi-safi-name", afi), "IPV4_UNICAST"),
    ]);
    let mut recorder = Recorder {
        with_neighbors: true,
        ..Default::default()
    };

    let forward = walk(&mut recorder, false, &nis);
    assert_eq!(
        forward[forward.len() - 2..],
        ["afi-safi:10.0.0.2:IPV4_UNICAST", "afi-safi-config:10.0.0.2:IPV4_UNICAST"]
    );

    let mut reverse = walk(&mut recorder, true, &nis);
    reverse.reverse();
    assert_eq!(reverse, forward);
}

#[test]
fn test_missing_group_skips_subtree() {
    let nis = build(&bgp_edits());
    let mut recorder = Recorder::default();

    let calls = walk(&mut recorder, false, &nis);
    assert!(calls.iter().all(|c| !c.starts_with("neighbor")));
    assert!(calls.contains(&"zebra:true".to_string()));
}

#[test]
fn test_unchanged_leaves_not_dispatched() {
    let nis = build(&[(format!("{}/bgp/global/config/as", BGP), "65001")]);
    let mut recorder = Recorder {
        with_neighbors: true,
        ..Default::default()
    };

    assert_eq!(
        walk(&mut recorder, false, &nis),
        vec!["bgp:mic", "global:65001"]
    );
}

#[test]
fn test_protocol_subtree_gated_by_identifier() {
    let nis = build(&[
        (format!("{}/ospfv2/global/config/router-id", BGP), "10.0.0.1"),
        (
            format!(
                "{}/protocols/protocol[identifier='OSPF'][name='ospf']/ospfv2/global/config/router-id",
                NI
            ),
            "10.0.0.1",
        ),
    ]);
    let mut recorder = Recorder::default();

    assert_eq!(
        walk(&mut recorder, false, &nis),
        vec!["ospfv2:mic", "ospfv2-global"]
    );
}

#[test]
fn test_callback_error_aborts_walk() {
    let nis = build(&bgp_edits());
    let mut recorder = Recorder {
        with_neighbors: true,
        fail_on_zebra: true,
        ..Default::default()
    };

    let err = process_network_instances(&mut recorder, false, &nis).unwrap_err();
    assert_eq!(err.to_string(), "Invalid zebra. refused");
    assert_eq!(recorder.calls.last().map(String::as_str), Some("global:65001"));
}
