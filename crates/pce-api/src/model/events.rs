use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{ApiObject, PolicyObject, missing_href};
use super::enums::{EventSeverity, EventStatus};
use crate::error::Error;
use crate::href::{AsReference, Href, Reference};
use crate::kinds::ObjectKind;

/// Audit event. Read-only through the API.
///
/// Events carry no name or modification metadata; `created_by` names the
/// agent, user, container cluster or system that raised the event and is
/// kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Href>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pce_fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<EventSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_changes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiObject for Event {
    fn href(&self) -> Option<&Href> {
        self.href.as_ref()
    }
}

impl PolicyObject for Event {
    const KIND: ObjectKind = ObjectKind::Events;
}

impl AsReference for Event {
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
    fn event_decodes_severity_and_keeps_payloads() {
        let event: Event = serde_json::from_value(json!({
            "href": "/orgs/1/events/4d1b2f3e-6a7c-4b8d-9e0f-1a2b3c4d5e6f",
            "event_type": "user.sign_in",
            "timestamp": "2024-05-01T12:00:00Z",
            "severity": "info",
            "status": "success",
            "created_by": {"user": {"href": "/users/1", "username": "admin"}},
            "action": {"api_method": "POST", "http_status_code": 200}
        }))
        .unwrap();
        assert_eq!(event.severity, Some(EventSeverity::Info));
        assert_eq!(event.created_by.unwrap()["user"]["username"], "admin");
    }

    #[test]
    fn unknown_severity_fails() {
        let raw = json!({"severity": "catastrophic"});
        assert!(serde_json::from_value::<Event>(raw).is_err());
    }
}
