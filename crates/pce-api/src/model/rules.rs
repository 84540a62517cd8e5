// ── Rule sets, rules and enforcement boundaries ──

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::common::{ApiObject, ObjectMeta, ObjectRef, policy_object};
use super::labels::Scope;
use super::services::{Service, ServicePort};
use crate::error::Error;
use crate::href::{Href, Reference};

/// Actor value meaning "all managed workloads".
pub const ALL_MANAGED_WORKLOADS: &str = "ams";

/// A provider or consumer in a rule.
///
/// Exactly one field is set on objects the PCE returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_group: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_service: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_server: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_list: Option<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    pub fn all_managed() -> Self {
        Self {
            actors: Some(ALL_MANAGED_WORKLOADS.to_owned()),
            ..Self::default()
        }
    }

    /// Build an actor from an object href, or `ams` for all managed workloads.
    pub fn from_href(raw: &str) -> Result<Self, Error> {
        if raw.trim().eq_ignore_ascii_case(ALL_MANAGED_WORKLOADS) {
            return Ok(Self::all_managed());
        }
        let href = Href::parse(raw)?;
        let reference = Some(Reference::new(href.clone()));
        let mut actor = Self::default();
        match href.collection() {
            "labels" => actor.label = reference,
            "label_groups" => actor.label_group = reference,
            "workloads" => actor.workload = reference,
            "virtual_services" => actor.virtual_service = reference,
            "virtual_servers" => actor.virtual_server = reference,
            "ip_lists" => actor.ip_list = reference,
            other => {
                return Err(Error::InvalidHref {
                    href: raw.to_owned(),
                    reason: format!("{other} cannot be a rule actor"),
                });
            }
        }
        Ok(actor)
    }

    /// Href of the referenced object; `None` for `ams`.
    pub fn href(&self) -> Option<&Href> {
        [
            &self.label,
            &self.label_group,
            &self.workload,
            &self.virtual_service,
            &self.virtual_server,
            &self.ip_list,
        ]
        .into_iter()
        .find_map(|r| r.as_ref().map(|r| &r.href))
    }
}

/// An entry in a rule's `ingress_services`: a service object (by href)
/// or an inline port/protocol definition.
#[derive(Debug, Clone, PartialEq)]
pub enum IngressService {
    Service(ObjectRef<Service>),
    Port(ServicePort),
}

impl IngressService {
    pub fn from_href(raw: &str) -> Result<Self, Error> {
        Ok(Self::Service(ObjectRef::Href(Reference::parse(raw)?)))
    }

    pub fn href(&self) -> Option<&Href> {
        match self {
            Self::Service(service) => service.href(),
            Self::Port(_) => None,
        }
    }
}

impl From<ServicePort> for IngressService {
    fn from(port: ServicePort) -> Self {
        Self::Port(port)
    }
}

impl Serialize for IngressService {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Service(service) => service.serialize(serializer),
            Self::Port(port) => port.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for IngressService {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let has_href = value.get("href").is_some();
        if has_href {
            ObjectRef::<Service>::deserialize(value)
                .map(Self::Service)
                .map_err(serde::de::Error::custom)
        } else {
            ServicePort::deserialize(value)
                .map(Self::Port)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// How label actors expand: to `workloads`, `virtual_services`, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelResolution {
    pub providers: Vec<String>,
    pub consumers: Vec<String>,
}

impl Default for LabelResolution {
    fn default() -> Self {
        Self {
            providers: vec!["workloads".to_owned()],
            consumers: vec!["workloads".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<Actor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumers: Option<Vec<Actor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_services: Option<Vec<IngressService>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_labels_as: Option<LabelResolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sec_connect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stateless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consuming_security_principals: Option<Vec<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unscoped_consumers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    /// Build an enabled rule from actor hrefs (or `ams`) and ingress services.
    ///
    /// Label actors resolve to workloads unless
    /// `with_label_resolution` says otherwise.
    pub fn build(
        providers: &[&str],
        consumers: &[&str],
        ingress_services: Vec<IngressService>,
    ) -> Result<Self, Error> {
        let providers = providers
            .iter()
            .map(|href| Actor::from_href(href))
            .collect::<Result<Vec<_>, _>>()?;
        let consumers = consumers
            .iter()
            .map(|href| Actor::from_href(href))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            enabled: Some(true),
            providers: Some(providers),
            consumers: Some(consumers),
            ingress_services: Some(ingress_services),
            resolve_labels_as: Some(LabelResolution::default()),
            ..Self::default()
        })
    }

    pub fn with_label_resolution(mut self, providers: &[&str], consumers: &[&str]) -> Self {
        self.resolve_labels_as = Some(LabelResolution {
            providers: providers.iter().map(|s| (*s).to_owned()).collect(),
            consumers: consumers.iter().map(|s| (*s).to_owned()).collect(),
        });
        self
    }
}

policy_object!(Rule => Rules);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<Scope>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_tables_rules: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RuleSet {
    /// An enabled rule set with the given scopes.
    pub fn new(name: impl Into<String>, scopes: Vec<Scope>) -> Self {
        Self {
            meta: ObjectMeta::named(name),
            enabled: Some(true),
            scopes: Some(scopes),
            ..Self::default()
        }
    }

    /// The embedded rule with the given href.
    pub fn rule(&self, href: &Href) -> Option<&Rule> {
        self.rules
            .as_deref()?
            .iter()
            .find(|rule| rule.href() == Some(href))
    }
}

policy_object!(RuleSet => RuleSets);

/// Deny boundary between providers and consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnforcementBoundary {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<Actor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumers: Option<Vec<Actor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_services: Option<Vec<IngressService>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(EnforcementBoundary => EnforcementBoundaries);
