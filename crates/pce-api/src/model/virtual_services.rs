use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ApiObject, ObjectMeta, ObjectRef, missing_href, policy_object};
use super::enums::ApplyTo;
use super::labels::Label;
use super::services::{ServiceAddress, ServicePort};
use super::workloads::Workload;
use crate::error::Error;
use crate::href::{AsReference, Href, Reference};
use crate::kinds::ObjectKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualService {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<ApplyTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pce_fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_addresses: Option<Vec<ServiceAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ports: Option<Vec<ServicePort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_overrides: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectRef<Label>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(VirtualService => VirtualServices);

/// Remaps a bound port on one workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_to_port: Option<u16>,
}

/// Binds a virtual service to a workload.
///
/// Bindings have no name or timestamps, so they do not flatten `ObjectMeta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Href>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_service: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<ObjectRef<Workload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_overrides: Option<Vec<PortOverride>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceBinding {
    pub fn new(virtual_service: Reference, workload: Reference) -> Self {
        Self {
            virtual_service: Some(virtual_service),
            workload: Some(ObjectRef::Href(workload)),
            ..Self::default()
        }
    }
}

impl ApiObject for ServiceBinding {
    fn href(&self) -> Option<&Href> {
        self.href.as_ref()
    }
}

impl super::common::PolicyObject for ServiceBinding {
    const KIND: ObjectKind = ObjectKind::ServiceBindings;
}

impl AsReference for ServiceBinding {
    fn to_reference(&self) -> Result<Reference, Error> {
        missing_href(self.href.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_to_is_strict() {
        let bad = json!({"name": "vs", "apply_to": "everywhere"});
        assert!(serde_json::from_value::<VirtualService>(bad).is_err());

        let good = json!({"name": "vs", "apply_to": "host_only"});
        let vs: VirtualService = serde_json::from_value(good).unwrap();
        assert_eq!(vs.apply_to, Some(ApplyTo::HostOnly));
    }

    #[test]
    fn binding_body_uses_href_stubs() {
        let binding = ServiceBinding::new(
            Reference::parse("/orgs/1/sec_policy/active/virtual_services/9177c75f").unwrap(),
            Reference::parse("/orgs/1/workloads/0f8a2c1e").unwrap(),
        );
        assert_eq!(
            serde_json::to_value(&binding).unwrap(),
            json!({
                "virtual_service": {"href": "/orgs/1/sec_policy/active/virtual_services/9177c75f"},
                "workload": {"href": "/orgs/1/workloads/0f8a2c1e"}
            })
        );
    }
}
