// ── Explorer traffic queries ──

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::ObjectRef;
use super::enums::{FlowDirection, PolicyDecision, TrafficState, Transmission};
use super::ip_lists::IpList;
use super::labels::Label;
use super::services::ServicePort;
use super::virtual_services::VirtualService;
use super::workloads::Workload;
use crate::error::Error;
use crate::href::{Href, Reference};

pub const DEFAULT_TRAFFIC_MAX_RESULTS: u32 = 100_000;

/// One source or destination criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_list: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
}

impl TrafficFilter {
    /// Classify a filter string: an href (label, workload or IP list),
    /// a transmission type, an IP address, or an FQDN.
    ///
    /// FQDN and transmission filters are only valid as exclusions.
    pub fn parse(raw: &str, include: bool) -> Result<Self, Error> {
        let invalid = |reason: String| Error::Validation {
            field: "traffic_filter".into(),
            reason,
        };

        if raw.starts_with('/') {
            let href = Href::parse(raw)?;
            let reference = Some(Reference::new(href.clone()));
            return match href.collection() {
                "labels" => Ok(Self {
                    label: reference,
                    ..Self::default()
                }),
                "workloads" => Ok(Self {
                    workload: reference,
                    ..Self::default()
                }),
                "ip_lists" => Ok(Self {
                    ip_list: reference,
                    ..Self::default()
                }),
                other => Err(invalid(format!("{other} cannot be used as a traffic filter"))),
            };
        }

        if let Ok(transmission) = raw.parse::<Transmission>() {
            if include {
                return Err(invalid("transmission filters can only be excluded".into()));
            }
            return Ok(Self {
                transmission: Some(transmission),
                ..Self::default()
            });
        }

        if raw.parse::<IpAddr>().is_ok() {
            return Ok(Self {
                ip_address: Some(raw.to_owned()),
                ..Self::default()
            });
        }

        if is_fqdn(raw) {
            if include {
                return Err(invalid("FQDN filters can only be excluded".into()));
            }
            return Ok(Self {
                fqdn: Some(raw.to_owned()),
                ..Self::default()
            });
        }

        Err(invalid(format!("'{raw}' is not a valid traffic filter")))
    }
}

fn is_fqdn(raw: &str) -> bool {
    if !(4..=253).contains(&raw.len()) {
        return false;
    }
    let labels: Vec<&str> = raw.split('.').collect();
    let Some((tld, hosts)) = labels.split_last() else {
        return false;
    };
    let tld_ok = (2..=63).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic());
    let hosts_ok = !hosts.is_empty()
        && hosts.iter().all(|label| {
            (1..=63).contains(&label.len())
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    tld_ok && hosts_ok
}

/// Include/exclude criteria for sources or destinations.
///
/// `include` is a disjunction of conjunctions: any inner list may match,
/// and every filter in it must.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficFilterBlock {
    #[serde(default)]
    pub include: Vec<Vec<TrafficFilter>>,
    #[serde(default)]
    pub exclude: Vec<TrafficFilter>,
}

impl TrafficFilterBlock {
    /// Each include string becomes its own single-filter conjunction.
    pub fn from_strs(include: &[&str], exclude: &[&str]) -> Result<Self, Error> {
        Ok(Self {
            include: include
                .iter()
                .map(|raw| TrafficFilter::parse(raw, true).map(|f| vec![f]))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|raw| TrafficFilter::parse(raw, false))
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceFilterBlock {
    #[serde(default)]
    pub include: Vec<ServicePort>,
    #[serde(default)]
    pub exclude: Vec<ServicePort>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOp {
    #[default]
    And,
    Or,
}

/// Explorer query body for `traffic_flows/async_queries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub sources: TrafficFilterBlock,
    #[serde(default)]
    pub destinations: TrafficFilterBlock,
    #[serde(default)]
    pub services: ServiceFilterBlock,
    #[serde(default)]
    pub policy_decisions: Vec<PolicyDecision>,
    pub exclude_workloads_from_ip_list_query: bool,
    pub sources_destinations_query_op: QueryOp,
    pub max_results: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
}

impl TrafficQuery {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<Self, Error> {
        if end_date < start_date {
            return Err(Error::Validation {
                field: "end_date".into(),
                reason: "end date is before start date".into(),
            });
        }
        Ok(Self {
            start_date,
            end_date,
            sources: TrafficFilterBlock::default(),
            destinations: TrafficFilterBlock::default(),
            services: ServiceFilterBlock::default(),
            policy_decisions: Vec::new(),
            exclude_workloads_from_ip_list_query: true,
            sources_destinations_query_op: QueryOp::And,
            max_results: DEFAULT_TRAFFIC_MAX_RESULTS,
            query_name: None,
        })
    }

    pub fn with_sources(mut self, sources: TrafficFilterBlock) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_destinations(mut self, destinations: TrafficFilterBlock) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn with_services(mut self, services: ServiceFilterBlock) -> Self {
        self.services = services;
        self
    }

    pub fn with_policy_decisions(mut self, decisions: Vec<PolicyDecision>) -> Self {
        self.policy_decisions = decisions;
        self
    }
}

/// One end of a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<ObjectRef<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<ObjectRef<Workload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_lists: Option<Vec<ObjectRef<IpList>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_service: Option<ObjectRef<VirtualService>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRange {
    pub first_detected: DateTime<Utc>,
    pub last_detected: DateTime<Utc>,
}

/// An aggregated flow returned by a traffic query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficFlow {
    pub src: TrafficNode,
    pub dst: TrafficNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServicePort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_connections: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TrafficState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_range: Option<TimestampRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_bi: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_bo: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_decision: Option<PolicyDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_direction: Option<FlowDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn filters_are_classified() {
        let label = TrafficFilter::parse("/orgs/1/labels/4", true).unwrap();
        assert!(label.label.is_some());
        let ip = TrafficFilter::parse("10.1.2.3", true).unwrap();
        assert_eq!(ip.ip_address.as_deref(), Some("10.1.2.3"));
        let fqdn = TrafficFilter::parse("db.internal.example", false).unwrap();
        assert_eq!(fqdn.fqdn.as_deref(), Some("db.internal.example"));
        let tx = TrafficFilter::parse("broadcast", false).unwrap();
        assert_eq!(tx.transmission, Some(Transmission::Broadcast));
    }

    #[test]
    fn fqdn_and_transmission_cannot_be_included() {
        assert!(TrafficFilter::parse("db.internal.example", true).is_err());
        assert!(TrafficFilter::parse("multicast", true).is_err());
        assert!(TrafficFilter::parse("not a filter", false).is_err());
    }

    #[test]
    fn query_serializes_with_defaults() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let query = TrafficQuery::new(start, end)
            .unwrap()
            .with_sources(TrafficFilterBlock::from_strs(&["/orgs/1/labels/4"], &[]).unwrap())
            .with_policy_decisions(vec![PolicyDecision::PotentiallyBlocked]);
        let body = serde_json::to_value(&query).unwrap();
        assert_eq!(body["sources"]["include"], json!([[{"label": {"href": "/orgs/1/labels/4"}}]]));
        assert_eq!(body["policy_decisions"], json!(["potentially_blocked"]));
        assert_eq!(body["sources_destinations_query_op"], json!("and"));
        assert_eq!(body["max_results"], json!(100_000));
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(TrafficQuery::new(start, end).is_err());
    }

    #[test]
    fn flow_decodes_state_with_space() {
        let flow: TrafficFlow = serde_json::from_value(json!({
            "src": {"ip": "10.0.0.1"},
            "dst": {"ip": "10.0.0.2", "workload": {"href": "/orgs/1/workloads/ab12"}},
            "service": {"port": 443, "proto": 6},
            "num_connections": 12,
            "state": "timed out",
            "policy_decision": "allowed",
            "flow_direction": "outbound"
        }))
        .unwrap();
        assert_eq!(flow.state, Some(TrafficState::TimedOut));
        assert!(matches!(flow.dst.workload, Some(ObjectRef::Href(_))));
    }
}
