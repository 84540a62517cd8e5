use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, ObjectRef, policy_object};

/// Where a label is referenced. Returned when `usage=true` is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_policy_scopes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containers_inherit_host_policy_scopes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_connection_reject_scope: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_boundary: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `key=value` label such as `role=web`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<LabelUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

policy_object!(Label => Labels);

/// Named set of labels (and nested groups) sharing one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelGroup {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectRef<Label>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_groups: Option<Vec<ObjectRef<LabelGroup>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<LabelUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

policy_object!(LabelGroup => LabelGroups);

/// One entry of a scope: either a label or a label group.
///
/// Encoded as `{"label": {...}}` or `{"label_group": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLabel {
    Label(ObjectRef<Label>),
    LabelGroup(ObjectRef<LabelGroup>),
}

/// A scope is a conjunction of labels; a rule set holds a list of scopes.
pub type Scope = Vec<ScopeLabel>;
