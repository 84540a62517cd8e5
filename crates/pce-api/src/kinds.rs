// ── Object-kind registry ──
//
// Explicit table from object kind to endpoint metadata. Path construction
// for every CRUD call goes through `ObjectKind::collection_path`.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::href::{Href, PolicyState};

/// Endpoint metadata for one object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Collection path segment, e.g. `sec_rules`.
    pub collection: &'static str,
    /// Lives under `/sec_policy/{draft|active}/`.
    pub sec_policy: bool,
    /// Lives at the API root without the `/orgs/{n}` prefix.
    pub global: bool,
    /// Kind whose objects own this collection.
    pub parent: Option<ObjectKind>,
    /// Accepts `bulk_create` / `bulk_update` / `bulk_delete`.
    pub bulk: bool,
    /// Create takes and answers with an array of objects, even for one.
    pub array_create: bool,
}

impl EndpointConfig {
    const fn org(collection: &'static str) -> Self {
        Self {
            collection,
            sec_policy: false,
            global: false,
            parent: None,
            bulk: false,
            array_create: false,
        }
    }

    const fn versioned(collection: &'static str) -> Self {
        Self {
            sec_policy: true,
            ..Self::org(collection)
        }
    }

    const fn bulk(self) -> Self {
        Self { bulk: true, ..self }
    }

    const fn array_create(self) -> Self {
        Self {
            array_create: true,
            ..self
        }
    }

    const fn under(self, parent: ObjectKind) -> Self {
        Self {
            parent: Some(parent),
            ..self
        }
    }

    const fn global(self) -> Self {
        Self {
            global: true,
            ..self
        }
    }
}

/// Every object kind the client knows how to address.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectKind {
    Labels,
    LabelGroups,
    IpLists,
    Services,
    VirtualServices,
    ServiceBindings,
    RuleSets,
    Rules,
    EnforcementBoundaries,
    FirewallSettings,
    Workloads,
    Vens,
    PairingProfiles,
    ContainerClusters,
    ContainerWorkloadProfiles,
    SecurityPrincipals,
    Events,
    Users,
}

impl ObjectKind {
    pub const fn endpoint(self) -> EndpointConfig {
        match self {
            Self::Labels => EndpointConfig::org("labels"),
            Self::LabelGroups => EndpointConfig::versioned("label_groups"),
            Self::IpLists => EndpointConfig::versioned("ip_lists"),
            Self::Services => EndpointConfig::versioned("services"),
            Self::VirtualServices => EndpointConfig::versioned("virtual_services").bulk(),
            Self::ServiceBindings => EndpointConfig::org("service_bindings").array_create(),
            Self::RuleSets => EndpointConfig::versioned("rule_sets"),
            Self::Rules => EndpointConfig::org("sec_rules").under(Self::RuleSets),
            Self::EnforcementBoundaries => EndpointConfig::versioned("enforcement_boundaries"),
            Self::FirewallSettings => EndpointConfig::versioned("firewall_settings"),
            Self::Workloads => EndpointConfig::org("workloads").bulk(),
            Self::Vens => EndpointConfig::org("vens"),
            Self::PairingProfiles => EndpointConfig::org("pairing_profiles"),
            Self::ContainerClusters => EndpointConfig::org("container_clusters"),
            Self::ContainerWorkloadProfiles => {
                EndpointConfig::org("container_workload_profiles").under(Self::ContainerClusters)
            }
            Self::SecurityPrincipals => EndpointConfig::org("security_principals"),
            Self::Events => EndpointConfig::org("events"),
            Self::Users => EndpointConfig::org("users").global(),
        }
    }

    /// Whether objects of this kind have draft and active copies.
    ///
    /// Nested kinds inherit versioning from their parent.
    pub const fn is_versioned(self) -> bool {
        let endpoint = self.endpoint();
        match endpoint.parent {
            Some(parent) => parent.endpoint().sec_policy,
            None => endpoint.sec_policy,
        }
    }

    /// Find the kind whose collection matches the last segment of `href`.
    pub fn from_href(href: &Href) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|kind| kind.endpoint().collection == href.collection())
    }

    /// Collection path relative to the API base, e.g.
    /// `/orgs/1/sec_policy/draft/ip_lists`.
    ///
    /// Nested kinds require `parent`; its policy state is replaced by `state`
    /// so that writes always land in the draft copy.
    pub fn collection_path(
        self,
        org_id: u32,
        state: PolicyState,
        parent: Option<&Href>,
    ) -> Result<String, Error> {
        let endpoint = self.endpoint();

        if let Some(parent_kind) = endpoint.parent {
            let parent = parent.ok_or_else(|| Error::Validation {
                field: "parent".into(),
                reason: format!("{self} objects live under a {parent_kind} href"),
            })?;
            if parent.collection() != parent_kind.endpoint().collection {
                return Err(Error::Validation {
                    field: "parent".into(),
                    reason: format!("expected a {parent_kind} href, got {parent}"),
                });
            }
            let parent = parent.with_state(state);
            return Ok(format!("{parent}/{}", endpoint.collection));
        }

        Ok(if endpoint.global {
            format!("/{}", endpoint.collection)
        } else if endpoint.sec_policy {
            format!("/orgs/{org_id}/sec_policy/{state}/{}", endpoint.collection)
        } else {
            format!("/orgs/{org_id}/{}", endpoint.collection)
        })
    }
}
