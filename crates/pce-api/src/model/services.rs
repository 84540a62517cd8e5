use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, policy_object};
use crate::error::Error;

pub const PROTO_ICMP: u8 = 1;
pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;
pub const PROTO_ICMPV6: u8 = 58;

/// IANA protocol number for a protocol name (`tcp`, `UDP`, ...).
pub fn protocol_number(name: &str) -> Result<u8, Error> {
    match name.to_ascii_lowercase().as_str() {
        "icmp" => Ok(PROTO_ICMP),
        "tcp" => Ok(PROTO_TCP),
        "udp" => Ok(PROTO_UDP),
        "icmpv6" | "ipv6-icmp" => Ok(PROTO_ICMPV6),
        other => other.parse::<u8>().map_err(|_| Error::Validation {
            field: "proto".into(),
            reason: format!("unknown protocol '{name}'"),
        }),
    }
}

/// Port/protocol (or process) definition inside a service or rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServicePort {
    pub fn new(port: u16, proto: u8) -> Self {
        Self {
            port: Some(port),
            proto: Some(proto),
            ..Self::default()
        }
    }

    pub fn tcp(port: u16) -> Self {
        Self::new(port, PROTO_TCP)
    }

    pub fn udp(port: u16) -> Self {
        Self::new(port, PROTO_UDP)
    }

    pub fn with_range_to(mut self, to_port: u16) -> Self {
        self.to_port = Some(to_port);
        self
    }
}

/// Address a virtual service answers on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ports: Option<Vec<ServicePort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_services: Option<Vec<ServicePort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(Service => Services);
