//! Processor capability groups.
//!
//! A processor consumes a tree walk. Each group below covers one node
//! family; a processor implements only the groups it needs and exposes them
//! through the accessors of [`Processor`]. The drivers in the tree modules
//! skip any subtree whose group accessor returns `None`.
//!
//! Callbacks receive the node together with the keys leading to it, read
//! the node's change set and emit whatever they need into their own
//! accumulator. They never mutate the tree.

use std::net::IpAddr;

use crate::bgp::{
    Bgp, BgpAfiSafi, BgpAfiSafiConfig, BgpGlobalConfig, BgpNeighbor, BgpNeighborConfig,
    BgpTimersConfig, BgpTransportConfig, BgpZebraConfig,
};
use crate::error::ModelResult;
use crate::interfaces::{
    EthernetConfig, Interface, InterfaceConfig, IpFamily, Subinterface, SubinterfaceAddress,
    SubinterfaceAddressConfig, SubinterfaceConfig, SubinterfaceIpConfig,
};
use crate::mpls::{
    MplsGlobalConfig, MplsLdpConfig, MplsLdpHelloConfig, MplsLdpInterface,
    MplsLdpInterfaceConfig, MplsLdpIpv4Config,
};
use crate::network_instance::{
    Loopback, LoopbackAddress, LoopbackAddressConfig, LoopbackConfig, NetworkInstance,
    NetworkInstanceConfig, NetworkInstanceInterface, NetworkInstanceInterfaceConfig, Protocol,
    ProtocolConfig, ProtocolKey,
};
use crate::ospfv2::{
    Ospfv2, Ospfv2Area, Ospfv2AreaConfig, Ospfv2GlobalConfig, Ospfv2Interface,
    Ospfv2InterfaceConfig, Ospfv2InterfaceTimers,
};
use crate::policy::{
    NeighborSet, NeighborSetConfig, PolicyActionsConfig, PolicyApplyConfig,
    PolicyBgpActionsConfig, PolicyDefinition, PolicyDefinitionConfig, PolicyStatement,
    PolicyStatementConfig, Prefix, PrefixConfig, PrefixKey, PrefixSet, PrefixSetConfig, TagSet,
    TagSetConfig,
};
use crate::static_route::{
    StaticNexthop, StaticNexthopConfig, StaticRoute, StaticRouteConfig, StaticRouteKey,
};
use crate::types::AfiSafiType;

pub trait BgpProcessor {
    fn bgp(&mut self, name: &str, key: &ProtocolKey, bgp: &Bgp) -> ModelResult<()>;
}

pub trait BgpGlobalProcessor {
    fn bgp_global_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        config: &BgpGlobalConfig,
    ) -> ModelResult<()>;
}

pub trait BgpZebraProcessor {
    fn bgp_zebra_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        config: &BgpZebraConfig,
    ) -> ModelResult<()>;
}

pub trait BgpNeighborProcessor {
    fn bgp_neighbor(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        neighbor: &BgpNeighbor,
    ) -> ModelResult<()>;

    fn bgp_neighbor_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        config: &BgpNeighborConfig,
    ) -> ModelResult<()>;

    fn bgp_neighbor_timers_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        config: &BgpTimersConfig,
    ) -> ModelResult<()>;

    fn bgp_neighbor_transport_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        config: &BgpTransportConfig,
    ) -> ModelResult<()>;

    fn bgp_neighbor_apply_policy_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        config: &PolicyApplyConfig,
    ) -> ModelResult<()>;

    fn bgp_neighbor_afi_safi(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        entry: &BgpAfiSafi,
    ) -> ModelResult<()>;

    fn bgp_neighbor_afi_safi_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        addr: &str,
        afi_safi: AfiSafiType,
        config: &BgpAfiSafiConfig,
    ) -> ModelResult<()>;
}

pub trait PolicyDefinedSetsProcessor {
    fn policy_prefix_set(&mut self, name: &str, set: &PrefixSet) -> ModelResult<()>;

    fn policy_prefix_set_config(&mut self, name: &str, config: &PrefixSetConfig)
        -> ModelResult<()>;

    fn policy_prefix_set_prefix(
        &mut self,
        name: &str,
        key: &PrefixKey,
        prefix: &Prefix,
    ) -> ModelResult<()>;

    fn policy_prefix_set_prefix_config(
        &mut self,
        name: &str,
        key: &PrefixKey,
        config: &PrefixConfig,
    ) -> ModelResult<()>;

    fn policy_neighbor_set(&mut self, name: &str, set: &NeighborSet) -> ModelResult<()>;

    fn policy_neighbor_set_config(
        &mut self,
        name: &str,
        config: &NeighborSetConfig,
    ) -> ModelResult<()>;

    fn policy_tag_set(&mut self, name: &str, set: &TagSet) -> ModelResult<()>;

    fn policy_tag_set_config(&mut self, name: &str, config: &TagSetConfig) -> ModelResult<()>;
}

pub trait PolicyDefinitionProcessor {
    fn policy_definition(&mut self, name: &str, def: &PolicyDefinition) -> ModelResult<()>;

    fn policy_definition_config(
        &mut self,
        name: &str,
        config: &PolicyDefinitionConfig,
    ) -> ModelResult<()>;

    fn policy_statement(
        &mut self,
        policy: &str,
        statement: &str,
        stmt: &PolicyStatement,
    ) -> ModelResult<()>;

    fn policy_statement_config(
        &mut self,
        policy: &str,
        statement: &str,
        config: &PolicyStatementConfig,
    ) -> ModelResult<()>;

    fn policy_statement_actions_config(
        &mut self,
        policy: &str,
        statement: &str,
        config: &PolicyActionsConfig,
    ) -> ModelResult<()>;

    fn policy_bgp_actions_config(
        &mut self,
        policy: &str,
        statement: &str,
        config: &PolicyBgpActionsConfig,
    ) -> ModelResult<()>;
}

pub trait InterfaceProcessor {
    fn interface(&mut self, name: &str, iface: &Interface) -> ModelResult<()>;

    fn interface_config(&mut self, name: &str, config: &InterfaceConfig) -> ModelResult<()>;

    fn interface_ethernet_config(&mut self, name: &str, config: &EthernetConfig)
        -> ModelResult<()>;
}

pub trait SubinterfaceProcessor {
    fn subinterface(&mut self, name: &str, index: u32, subif: &Subinterface) -> ModelResult<()>;

    fn subinterface_config(
        &mut self,
        name: &str,
        index: u32,
        config: &SubinterfaceConfig,
    ) -> ModelResult<()>;

    fn subinterface_ip_config(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        config: &SubinterfaceIpConfig,
    ) -> ModelResult<()>;

    fn subinterface_ip_address(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        ip: IpAddr,
        addr: &SubinterfaceAddress,
    ) -> ModelResult<()>;

    fn subinterface_ip_address_config(
        &mut self,
        name: &str,
        index: u32,
        family: IpFamily,
        ip: IpAddr,
        config: &SubinterfaceAddressConfig,
    ) -> ModelResult<()>;
}

pub trait NetworkInstanceProcessor {
    fn network_instance(&mut self, name: &str, ni: &NetworkInstance) -> ModelResult<()>;

    fn network_instance_config(
        &mut self,
        name: &str,
        config: &NetworkInstanceConfig,
    ) -> ModelResult<()>;

    fn network_instance_protocol(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        proto: &Protocol,
    ) -> ModelResult<()>;

    fn network_instance_protocol_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        config: &ProtocolConfig,
    ) -> ModelResult<()>;
}

pub trait NetworkInstanceInterfaceProcessor {
    fn network_instance_interface(
        &mut self,
        name: &str,
        id: &str,
        iface: &NetworkInstanceInterface,
    ) -> ModelResult<()>;

    fn network_instance_interface_config(
        &mut self,
        name: &str,
        id: &str,
        config: &NetworkInstanceInterfaceConfig,
    ) -> ModelResult<()>;
}

pub trait NetworkInstanceLoopbackProcessor {
    fn network_instance_loopback(
        &mut self,
        name: &str,
        id: &str,
        loopback: &Loopback,
    ) -> ModelResult<()>;

    fn network_instance_loopback_config(
        &mut self,
        name: &str,
        id: &str,
        config: &LoopbackConfig,
    ) -> ModelResult<()>;

    fn network_instance_loopback_address(
        &mut self,
        name: &str,
        id: &str,
        index: &str,
        addr: &LoopbackAddress,
    ) -> ModelResult<()>;

    fn network_instance_loopback_address_config(
        &mut self,
        name: &str,
        id: &str,
        index: &str,
        config: &LoopbackAddressConfig,
    ) -> ModelResult<()>;
}

pub trait MplsProcessor {
    fn mpls_global_config(&mut self, name: &str, config: &MplsGlobalConfig) -> ModelResult<()>;

    fn mpls_ldp_config(&mut self, name: &str, config: &MplsLdpConfig) -> ModelResult<()>;

    fn mpls_ldp_ipv4_config(&mut self, name: &str, config: &MplsLdpIpv4Config)
        -> ModelResult<()>;

    fn mpls_ldp_discovery_interfaces_config(
        &mut self,
        name: &str,
        config: &MplsLdpHelloConfig,
    ) -> ModelResult<()>;

    fn mpls_ldp_interface(
        &mut self,
        name: &str,
        ifid: &str,
        iface: &MplsLdpInterface,
    ) -> ModelResult<()>;

    fn mpls_ldp_interface_config(
        &mut self,
        name: &str,
        ifid: &str,
        config: &MplsLdpInterfaceConfig,
    ) -> ModelResult<()>;
}

pub trait StaticRouteProcessor {
    fn static_route(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        route_key: &StaticRouteKey,
        route: &StaticRoute,
    ) -> ModelResult<()>;

    fn static_route_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        route_key: &StaticRouteKey,
        config: &StaticRouteConfig,
    ) -> ModelResult<()>;

    fn static_route_nexthop(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        route_key: &StaticRouteKey,
        index: &str,
        nexthop: &StaticNexthop,
    ) -> ModelResult<()>;

    fn static_route_nexthop_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        route_key: &StaticRouteKey,
        index: &str,
        config: &StaticNexthopConfig,
    ) -> ModelResult<()>;
}

pub trait Ospfv2Processor {
    fn ospfv2(&mut self, name: &str, key: &ProtocolKey, ospf: &Ospfv2) -> ModelResult<()>;

    fn ospfv2_global_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        config: &Ospfv2GlobalConfig,
    ) -> ModelResult<()>;

    fn ospfv2_area(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        area_id: &str,
        area: &Ospfv2Area,
    ) -> ModelResult<()>;

    fn ospfv2_area_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        area_id: &str,
        config: &Ospfv2AreaConfig,
    ) -> ModelResult<()>;

    fn ospfv2_interface(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        area_id: &str,
        ifid: &str,
        iface: &Ospfv2Interface,
    ) -> ModelResult<()>;

    fn ospfv2_interface_config(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        area_id: &str,
        ifid: &str,
        config: &Ospfv2InterfaceConfig,
    ) -> ModelResult<()>;

    fn ospfv2_interface_timers(
        &mut self,
        name: &str,
        key: &ProtocolKey,
        area_id: &str,
        ifid: &str,
        timers: &Ospfv2InterfaceTimers,
    ) -> ModelResult<()>;
}

/// Root of a tree walk: one accessor per capability group.
pub trait Processor {
    fn as_bgp(&mut self) -> Option<&mut dyn BgpProcessor> {
        None
    }

    fn as_bgp_global(&mut self) -> Option<&mut dyn BgpGlobalProcessor> {
        None
    }

    fn as_bgp_zebra(&mut self) -> Option<&mut dyn BgpZebraProcessor> {
        None
    }

    fn as_bgp_neighbor(&mut self) -> Option<&mut dyn BgpNeighborProcessor> {
        None
    }

    fn as_policy_defined_sets(&mut self) -> Option<&mut dyn PolicyDefinedSetsProcessor> {
        None
    }

    fn as_policy_definition(&mut self) -> Option<&mut dyn PolicyDefinitionProcessor> {
        None
    }

    fn as_interface(&mut self) -> Option<&mut dyn InterfaceProcessor> {
        None
    }

    fn as_subinterface(&mut self) -> Option<&mut dyn SubinterfaceProcessor> {
        None
    }

    fn as_network_instance(&mut self) -> Option<&mut dyn NetworkInstanceProcessor> {
        None
    }

    fn as_network_instance_interface(
        &mut self,
    ) -> Option<&mut dyn NetworkInstanceInterfaceProcessor> {
        None
    }

    fn as_network_instance_loopback(
        &mut self,
    ) -> Option<&mut dyn NetworkInstanceLoopbackProcessor> {
        None
    }

    fn as_mpls(&mut self) -> Option<&mut dyn MplsProcessor> {
        None
    }

    fn as_static_route(&mut self) -> Option<&mut dyn StaticRouteProcessor> {
        None
    }

    fn as_ospfv2(&mut self) -> Option<&mut dyn Ospfv2Processor> {
        None
    }
}

/// Returns `steps` in declared order, or reversed.
pub(crate) fn ordered<T, const N: usize>(mut steps: [T; N], reverse: bool) -> [T; N] {
    if reverse {
        steps.reverse();
    }
    steps
}
