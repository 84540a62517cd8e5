use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, ObjectRef, policy_object};
use super::containers::ContainerCluster;
use super::enums::{EnforcementMode, LinkState, Mode, VisibilityLevel};
use super::labels::Label;
use super::rules::IngressService;
use crate::href::Reference;

/// A network interface reported for (or assigned to) a workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_state: Option<LinkState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gateway_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_detection_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Managed (VEN-paired) or unmanaged host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinguished_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<Interface>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_interface_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectRef<Label>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_mode: Option<EnforcementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_level: Option<VisibilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectively_enforced_services: Option<Vec<IngressService>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers_inherit_host_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_connection_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_enforcement_boundaries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ven: Option<ObjectRef<Ven>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_cluster: Option<ObjectRef<ContainerCluster>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workload {
    /// An unmanaged workload with a single interface.
    pub fn unmanaged(name: impl Into<String>, interface: Interface) -> Self {
        let name = name.into();
        Self {
            hostname: Some(name.clone()),
            meta: ObjectMeta::named(name),
            interfaces: Some(vec![interface]),
            ..Self::default()
        }
    }

    pub fn is_managed(&self) -> bool {
        self.ven.is_some()
    }
}

policy_object!(Workload => Workloads);

/// Virtual Enforcement Node: the agent installed on a managed workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ven {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectRef<Label>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads: Option<Vec<Reference>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(Ven => Vens);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workload_decodes_nested_refs_and_enums() {
        let raw = json!({
            "href": "/orgs/1/workloads/7a3c9e4b-5f61-4d2b-8c1a-2e3f4a5b6c7d",
            "name": "web-01",
            "hostname": "web-01.lab",
            "enforcement_mode": "visibility_only",
            "visibility_level": "flow_summary",
            "online": true,
            "interfaces": [
                {"name": "eth0", "address": "10.0.0.5", "cidr_block": 24, "link_state": "up"}
            ],
            "labels": [
                {"href": "/orgs/1/labels/1"},
                {"href": "/orgs/1/labels/2", "key": "env", "value": "prod"}
            ],
            "ven": {"href": "/orgs/1/vens/a1b2c3"},
            "agent": {"status": {"uptime_seconds": 100}}
        });
        let workload: Workload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(workload.enforcement_mode, Some(EnforcementMode::VisibilityOnly));
        let labels = workload.labels.as_ref().unwrap();
        assert!(matches!(labels[0], ObjectRef::Href(_)));
        assert!(matches!(labels[1], ObjectRef::Object(_)));
        assert!(workload.is_managed());
        assert!(workload.extra.contains_key("agent"));
        assert_eq!(serde_json::to_value(&workload).unwrap(), raw);
    }

    #[test]
    fn invalid_link_state_fails() {
        let raw = json!({"name": "eth0", "link_state": "flapping"});
        assert!(serde_json::from_value::<Interface>(raw).is_err());
    }
}
