use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, policy_object};
use super::enums::{EnforcementMode, VisibilityLevel};
use crate::href::Reference;

/// A Kubernetes or OpenShift cluster paired through a Kubelink agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerCluster {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_cluster_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelink_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(ContainerCluster => ContainerClusters);

/// A label assignment inside a container workload profile.
///
/// Either a single fixed `assignment` or a list of `restriction`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLabel {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Vec<Reference>>,
}

/// Policy defaults for pods in one namespace of a container cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerWorkloadProfile {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_mode: Option<EnforcementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_level: Option<VisibilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ProfileLabel>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(ContainerWorkloadProfile => ContainerWorkloadProfiles);
