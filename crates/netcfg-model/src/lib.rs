//! Change-tracked configuration trees and their dispatch protocol.
//!
//! Edits arrive as `(xpath, value)` pairs. [`parse_xpath`] splits the path
//! and the tree's [`ConfigNode::put`] assigns the leaf, creating keyed list
//! entries on first sight and marking every step on the way in the owning
//! node's [`ChangeSet`](netcfg_common::ChangeSet).
//!
//! A walk then hands the changed parts of a tree to a [`Processor`]:
//!
//! - [`process_bgp`]
//! - [`process_routing_policy`]
//! - [`process_interfaces`]
//! - [`process_network_instances`]
//!
//! # Example
//!
//! ```ignore
//! use netcfg_model::{parse_xpath, process_network_instances, ConfigNode, NetworkInstances};
//!
//! let mut nis = NetworkInstances::new();
//! let nodes = parse_xpath("/network-instance[name='mic']/config/router-id")?;
//! nis.put(&nodes, "10.0.0.1")?;
//! process_network_instances(&mut emitter, false, &nis)?;
//! ```

pub mod bgp;
pub mod error;
pub mod interfaces;
pub mod mpls;
pub mod network_instance;
pub mod node;
pub mod ospfv2;
pub mod policy;
pub mod processor;
pub mod static_route;
pub mod types;
pub mod xpath;

pub use bgp::{process_bgp, process_bgp_neighbor, Bgp};
pub use error::{ModelError, ModelResult};
pub use interfaces::{process_interfaces, Interfaces, IpFamily};
pub use network_instance::{
    process_network_instance, process_network_instances, NetworkInstance, NetworkInstances,
    ProtocolKey,
};
pub use node::{ConfigContainer, ConfigNode};
pub use policy::{process_routing_policy, RoutingPolicy};
pub use processor::Processor;
pub use static_route::StaticRouteKey;
pub use types::{
    AfiSafiType, BgpNexthop, InstallProtocolType, InterfaceType, IpPrefix, MplsNullLabelType,
    NetworkInstanceType, OspfNetworkType, PolicyDefaultType, PolicyPrefixSetMode,
    PolicyResultType,
};
pub use xpath::{parse_xpath, xpath_from_nodes, XPathNode};
