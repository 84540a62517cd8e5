use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, policy_object};
use crate::error::Error;

/// Name of the built-in IP list covering all of IPv4 and IPv6.
pub const ANY_IP_LIST_NAME: &str = "Any (0.0.0.0/0 and ::/0)";

/// A single address, CIDR block or `from_ip`..`to_ip` range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<bool>,
}

impl IpRange {
    /// Build a validated range.
    ///
    /// A CIDR `from_ip` cannot be combined with `to_ip`, `to_ip` must be a
    /// plain address of the same family, and the range must not run
    /// backwards.
    pub fn new(from_ip: &str, to_ip: Option<&str>) -> Result<Self, Error> {
        let invalid = |reason: String| Error::Validation {
            field: "ip_range".into(),
            reason,
        };

        let (from_addr, from_prefix) = split_cidr(from_ip).map_err(&invalid)?;

        if let Some(to_ip) = to_ip {
            if from_prefix.is_some() {
                return Err(invalid(format!(
                    "'{from_ip}' is a CIDR block and cannot take a to_ip"
                )));
            }
            if to_ip.contains('/') {
                return Err(invalid(format!("to_ip '{to_ip}' cannot be a CIDR block")));
            }
            let to_addr: IpAddr = to_ip
                .parse()
                .map_err(|_| invalid(format!("'{to_ip}' is not an IP address")))?;
            let ordered = match (from_addr, to_addr) {
                (IpAddr::V4(a), IpAddr::V4(b)) => a <= b,
                (IpAddr::V6(a), IpAddr::V6(b)) => a <= b,
                _ => {
                    return Err(invalid(format!(
                        "'{from_ip}' and '{to_ip}' are different address families"
                    )));
                }
            };
            if !ordered {
                return Err(invalid(format!(
                    "to_ip '{to_ip}' is lower than from_ip '{from_ip}'"
                )));
            }
            return Ok(Self {
                from_ip: Some(from_ip.to_owned()),
                to_ip: Some(to_ip.to_owned()),
                ..Self::default()
            });
        }

        Ok(Self {
            from_ip: Some(from_ip.to_owned()),
            ..Self::default()
        })
    }

    pub fn excluded(mut self) -> Self {
        self.exclusion = Some(true);
        self
    }
}

fn split_cidr(raw: &str) -> Result<(IpAddr, Option<u8>), String> {
    let (addr, prefix) = match raw.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (raw, None),
    };
    let addr: IpAddr = addr
        .parse()
        .map_err(|_| format!("'{raw}' is not an IP address or CIDR block"))?;
    let prefix = prefix
        .map(|p| {
            let max = if addr.is_ipv4() { 32 } else { 128 };
            p.parse::<u8>()
                .ok()
                .filter(|bits| *bits <= max)
                .ok_or_else(|| format!("'{raw}' has an invalid prefix length"))
        })
        .transpose()?;
    Ok((addr, prefix))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fqdn {
    pub fqdn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpList {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_ranges: Option<Vec<IpRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdns: Option<Vec<Fqdn>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(IpList => IpLists);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_address_cidr_and_range() {
        assert!(IpRange::new("10.0.0.1", None).is_ok());
        assert!(IpRange::new("10.0.0.0/8", None).is_ok());
        assert!(IpRange::new("2001:db8::/32", None).is_ok());
        let range = IpRange::new("192.168.1.10", Some("192.168.1.20")).unwrap();
        assert_eq!(range.to_ip.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn cidr_from_ip_cannot_take_to_ip() {
        assert!(IpRange::new("10.0.0.0/24", Some("10.0.0.9")).is_err());
    }

    #[test]
    fn to_ip_cannot_be_cidr() {
        assert!(IpRange::new("10.0.0.1", Some("10.0.0.0/24")).is_err());
    }

    #[test]
    fn backwards_range_is_rejected() {
        let err = IpRange::new("10.0.0.9", Some("10.0.0.1")).unwrap_err();
        assert!(err.to_string().contains("lower than"));
    }

    #[test]
    fn mixed_families_are_rejected() {
        assert!(IpRange::new("10.0.0.1", Some("::1")).is_err());
    }

    #[test]
    fn bad_prefix_is_rejected() {
        assert!(IpRange::new("10.0.0.0/33", None).is_err());
        assert!(IpRange::new("not-an-ip", None).is_err());
    }
}
