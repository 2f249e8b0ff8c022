//! Leaf value types shared by the configuration trees.
//!
//! Enumerations are numeric newtypes with associated constants so that a
//! value outside the known set can still be carried and rendered. `parse`
//! accepts the schema name with or without its `ns:` prefix.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};
use crate::xpath::split_name;

macro_rules! oc_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($konst:ident = $value:expr => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            $(pub const $konst: $name = $name($value);)+

            /// Schema name of a known value.
            pub fn name(&self) -> Option<&'static str> {
                match *self {
                    $($name::$konst => Some($text),)+
                    _ => None,
                }
            }

            pub fn parse(s: &str) -> ModelResult<Self> {
                match split_name(s.trim()).1 {
                    $($text => Ok($name::$konst),)+
                    _ => Err(ModelError::invalid_value(stringify!($name), s)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> ModelResult<Self> {
                Self::parse(s)
            }
        }
    };
}

const fn afi_safi(afi: u32, safi: u32) -> u32 {
    (afi << 16) | safi
}

oc_enum! {
    /// BGP address family, `(afi << 16) | safi`.
    AfiSafiType {
        BGP_AFI_SAFI_TYPE = 0 => "BGP_AFI_SAFI_TYPE",
        IPV4_UNICAST = afi_safi(1, 1) => "IPV4_UNICAST",
        IPV6_UNICAST = afi_safi(2, 1) => "IPV6_UNICAST",
        IPV4_LABELED_UNICAST = afi_safi(1, 4) => "IPV4_LABELED_UNICAST",
        IPV6_LABELED_UNICAST = afi_safi(2, 4) => "IPV6_LABELED_UNICAST",
        L3VPN_IPV4_UNICAST = afi_safi(1, 128) => "L3VPN_IPV4_UNICAST",
        L3VPN_IPV6_UNICAST = afi_safi(2, 128) => "L3VPN_IPV6_UNICAST",
        L3VPN_IPV4_MULTICAST = afi_safi(1, 129) => "L3VPN_IPV4_MULTICAST",
        L3VPN_IPV6_MULTICAST = afi_safi(2, 129) => "L3VPN_IPV6_MULTICAST",
        L2VPN_VPLS = afi_safi(25, 65) => "L2VPN_VPLS",
        L2VPN_EVPN = afi_safi(25, 70) => "L2VPN_EVPN",
    }
}

impl AfiSafiType {
    pub fn afi(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn safi(&self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

oc_enum! {
    /// Protocol that installed a route, also the protocol list identifier.
    InstallProtocolType {
        INSTALL_PROTOCOL_TYPE = 0 => "INSTALL_PROTOCOL_TYPE",
        BGP = 1 => "BGP",
        ISIS = 2 => "ISIS",
        OSPF = 3 => "OSPF",
        OSPF3 = 4 => "OSPF3",
        STATIC = 5 => "STATIC",
        DIRECTLY_CONNECTED = 6 => "DIRECTLY_CONNECTED",
        LOCAL_AGGREGATE = 7 => "LOCAL_AGGREGATE",
    }
}

oc_enum! {
    /// Disposition of a policy statement.
    PolicyResultType {
        POLICY_RESULT_TYPE = 0 => "POLICY_RESULT_TYPE",
        ACCEPT_ROUTE = 1 => "ACCEPT_ROUTE",
        REJECT_ROUTE = 2 => "REJECT_ROUTE",
    }
}

oc_enum! {
    /// Default disposition when no policy matches.
    PolicyDefaultType {
        POLICY_DEFAULT_TYPE = 0 => "POLICY_DEFAULT_TYPE",
        ACCEPT_ROUTE = 1 => "ACCEPT_ROUTE",
        REJECT_ROUTE = 2 => "REJECT_ROUTE",
    }
}

oc_enum! {
    PolicyPrefixSetMode {
        POLICY_PREFIXSET_MODE = 0 => "POLICY_PREFIXSET_MODE",
        IPV4 = 1 => "IPV4",
        IPV6 = 2 => "IPV6",
        MIXED = 3 => "MIXED",
    }
}

oc_enum! {
    NetworkInstanceType {
        NETWORK_INSTANCE_TYPE = 0 => "NETWORK_INSTANCE_TYPE",
        DEFAULT_INSTANCE = 1 => "DEFAULT_INSTANCE",
        L3VRF = 2 => "L3VRF",
        L2VSI = 3 => "L2VSI",
        L2P2P = 4 => "L2P2P",
        L2L3 = 5 => "L2L3",
    }
}

oc_enum! {
    OspfNetworkType {
        OSPF_NETWORK_TYPE = 0 => "OSPF_NETWORK_TYPE",
        POINT_TO_POINT_NETWORK = 1 => "POINT_TO_POINT_NETWORK",
        BROADCAST_NETWORK = 2 => "BROADCAST_NETWORK",
        NON_BROADCAST_NETWORK = 3 => "NON_BROADCAST_NETWORK",
    }
}

oc_enum! {
    /// Label advertised for the null route.
    MplsNullLabelType {
        NULL_LABEL_TYPE = 0 => "NULL_LABEL_TYPE",
        EXPLICIT = 1 => "EXPLICIT",
        IMPLICIT = 2 => "IMPLICIT",
    }
}

oc_enum! {
    /// IANA interface type.
    InterfaceType {
        OTHER = 1 => "other",
        REGULAR1822 = 2 => "regular1822",
        HDH1822 = 3 => "hdh1822",
        DDN_X25 = 4 => "ddnX25",
        RFC877_X25 = 5 => "rfc877x25",
        ETHERNET_CSMACD = 6 => "ethernetCsmacd",
    }
}

/// Module prefix of the interface type identities.
pub const IANA_IF_TYPE_MODULE: &str = "iana-if-type";

impl InterfaceType {
    /// Qualified identity, e.g. `iana-if-type:ethernetCsmacd`.
    pub fn identity(&self) -> String {
        format!("{}:{}", IANA_IF_TYPE_MODULE, self)
    }
}

/// Next hop set by a BGP policy action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BgpNexthop {
    #[default]
    Unspecified,
    /// The local address of the session.
    SelfNexthop,
    Address(IpAddr),
}

impl BgpNexthop {
    pub fn parse(s: &str) -> ModelResult<Self> {
        let s = s.trim();
        if s == "SELF" {
            return Ok(Self::SelfNexthop);
        }
        s.parse::<IpAddr>()
            .map(Self::Address)
            .map_err(|_| ModelError::invalid_value("Bgp Nexthop", s))
    }
}

impl fmt::Display for BgpNexthop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BgpNexthop::Unspecified => f.write_str("BGP_NEXTHOP_TYPE"),
            BgpNexthop::SelfNexthop => f.write_str("SELF"),
            BgpNexthop::Address(ip) => write!(f, "{}", ip),
        }
    }
}

/// IP prefix in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpPrefix {
    pub addr: IpAddr,
    pub len: u8,
}

impl IpPrefix {
    pub fn parse(s: &str) -> ModelResult<Self> {
        let invalid = || ModelError::invalid_value("IP prefix", s);
        let (addr, len) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let len: u8 = len.parse().map_err(|_| invalid())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if len > max {
            return Err(invalid());
        }
        Ok(Self { addr, len })
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

/// Parses a boolean leaf.
pub fn parse_bool(field: &str, value: &str) -> ModelResult<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" | "t" | "T" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "f" | "F" | "0" => Ok(false),
        _ => Err(ModelError::invalid_value(field, value)),
    }
}

/// Parses an unsigned integer leaf. Accepts decimal and `0x`, `0o`, `0b`
/// prefixed literals; values outside the target type are rejected.
pub fn parse_uint<T: TryFrom<u64>>(field: &str, value: &str) -> ModelResult<T> {
    let s = value.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        u64::from_str_radix(oct, 8)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2)
    } else {
        s.parse::<u64>()
    };

    parsed
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| ModelError::invalid_value(field, value))
}

/// Parses an IPv4 or IPv6 address leaf.
pub fn parse_ip(field: &str, value: &str) -> ModelResult<IpAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| ModelError::invalid_value(field, value))
}

/// Rejects an empty string leaf.
pub fn parse_non_empty(field: &str, value: &str) -> ModelResult<String> {
    if value.is_empty() {
        return Err(ModelError::invalid_value(field, format!("'{}'", value)));
    }
    Ok(value.to_string())
}
