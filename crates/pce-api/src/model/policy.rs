// ── Provisioning ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, policy_object};
use super::labels::Scope;
use crate::error::Error;
use crate::href::{AsReference, Reference};

/// Org-wide firewall settings. A single object per policy copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirewallSettings {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_dhcp_client: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dropped_multicast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dropped_broadcast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_traceroute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_ipv6: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_detection_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ike_authentication_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_policy_scopes: Option<Vec<Scope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers_inherit_host_policy_scopes: Option<Vec<Scope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_connection_reject_scopes: Option<Vec<Scope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loopback_interfaces_in_policy_scopes: Option<Vec<Scope>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(FirewallSettings => FirewallSettings);

/// Draft objects to provision, grouped by collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyChangeset {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_groups: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_sets: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_lists: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_services: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub firewall_settings: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enforcement_boundaries: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure_connect_gateways: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_servers: Vec<Reference>,
}

impl PolicyChangeset {
    /// Group hrefs by collection, converting each to its draft copy.
    ///
    /// A rule provisions its owning rule set. Hrefs outside `sec_policy`
    /// cannot be provisioned and fail with `Error::InvalidHref`.
    pub fn build<R: AsReference>(hrefs: &[R]) -> Result<Self, Error> {
        let mut changeset = Self::default();
        for item in hrefs {
            changeset.add(&item.to_reference()?)?;
        }
        Ok(changeset)
    }

    pub fn add(&mut self, reference: &Reference) -> Result<(), Error> {
        let mut href = reference.href.to_draft();
        if href.policy_state().is_none() {
            return Err(Error::InvalidHref {
                href: href.to_string(),
                reason: "only sec_policy objects can be provisioned".into(),
            });
        }
        if href.collection() == "sec_rules" {
            if let Some(parent) = href.parent() {
                href = parent;
            }
        }

        let bucket = match href.collection() {
            "label_groups" => &mut self.label_groups,
            "services" => &mut self.services,
            "rule_sets" => &mut self.rule_sets,
            "ip_lists" => &mut self.ip_lists,
            "virtual_services" => &mut self.virtual_services,
            "firewall_settings" => &mut self.firewall_settings,
            "enforcement_boundaries" => &mut self.enforcement_boundaries,
            "secure_connect_gateways" => &mut self.secure_connect_gateways,
            "virtual_servers" => &mut self.virtual_servers,
            other => {
                return Err(Error::InvalidHref {
                    href: href.to_string(),
                    reason: format!("{other} objects cannot be provisioned"),
                });
            }
        };
        let reference = Reference::new(href);
        if !bucket.contains(&reference) {
            bucket.push(reference);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        [
            &self.label_groups,
            &self.services,
            &self.rule_sets,
            &self.ip_lists,
            &self.virtual_services,
            &self.firewall_settings,
            &self.enforcement_boundaries,
            &self.secure_connect_gateways,
            &self.virtual_servers,
        ]
        .iter()
        .map(|bucket| bucket.len())
        .sum()
    }
}

/// Body of `POST /orgs/{n}/sec_policy`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProvisionRequest<'a> {
    pub update_description: &'a str,
    pub change_subset: &'a PolicyChangeset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyObjectCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_groups: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_sets: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_lists: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_services: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_settings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_boundaries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_connect_gateways: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_servers: Option<u64>,
}

/// A provisioned policy version. Immutable once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyVersion {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads_affected: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_counts: Option<PolicyObjectCounts>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn changeset_groups_by_collection() {
        let changeset = PolicyChangeset::build(&[
            "/orgs/1/sec_policy/draft/ip_lists/5",
            "/orgs/1/sec_policy/draft/services/7",
            "/orgs/1/sec_policy/draft/ip_lists/6",
        ])
        .unwrap();
        assert_eq!(changeset.len(), 3);
        assert_eq!(
            serde_json::to_value(&changeset).unwrap(),
            json!({
                "services": [{"href": "/orgs/1/sec_policy/draft/services/7"}],
                "ip_lists": [
                    {"href": "/orgs/1/sec_policy/draft/ip_lists/5"},
                    {"href": "/orgs/1/sec_policy/draft/ip_lists/6"}
                ]
            })
        );
    }

    #[test]
    fn rules_provision_their_rule_set_once() {
        let changeset = PolicyChangeset::build(&[
            "/orgs/1/sec_policy/draft/rule_sets/19/sec_rules/1",
            "/orgs/1/sec_policy/draft/rule_sets/19/sec_rules/2",
        ])
        .unwrap();
        assert_eq!(changeset.rule_sets.len(), 1);
        assert_eq!(
            changeset.rule_sets[0].href.as_str(),
            "/orgs/1/sec_policy/draft/rule_sets/19"
        );
    }

    #[test]
    fn active_hrefs_are_provisioned_as_draft() {
        let changeset =
            PolicyChangeset::build(&["/orgs/1/sec_policy/active/label_groups/ab12"]).unwrap();
        assert_eq!(
            changeset.label_groups[0].href.as_str(),
            "/orgs/1/sec_policy/draft/label_groups/ab12"
        );
    }

    #[test]
    fn unversioned_hrefs_are_rejected() {
        let err = PolicyChangeset::build(&["/orgs/1/labels/3"]).unwrap_err();
        assert!(matches!(err, Error::InvalidHref { .. }));
    }
}
