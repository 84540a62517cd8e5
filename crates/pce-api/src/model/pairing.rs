use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ObjectMeta, ObjectRef, policy_object};
use super::enums::{EnforcementMode, Mode, VisibilityLevel};
use super::labels::Label;

/// Template applied to VENs that pair with keys generated from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingProfile {
    #[serde(flatten)]
    pub meta: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_software_release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_mode: Option<EnforcementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_mode_lock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_level: Option<VisibilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_level_lock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_lock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_uses_per_key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_lifespan: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectRef<Label>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_use_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pairing_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_traffic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_traffic_lock: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PairingProfile {
    /// An enabled profile with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ObjectMeta::named(name),
            enabled: Some(true),
            ..Self::default()
        }
    }
}

policy_object!(PairingProfile => PairingProfiles);

/// Response of `POST {pairing_profile}/pairing_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingKey {
    pub activation_code: String,
}
