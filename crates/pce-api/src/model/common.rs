// ── Shared model building blocks ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::href::{AsReference, Href, Reference};
use crate::kinds::ObjectKind;

/// Any JSON object the client can send to or receive from the PCE.
pub trait ApiObject: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync {
    /// Server-assigned href; `None` until the object has been created.
    fn href(&self) -> Option<&Href>;
}

/// A typed object bound to a fixed endpoint.
pub trait PolicyObject: ApiObject {
    const KIND: ObjectKind;
}

/// Fields every named, modifiable PCE object carries.
///
/// Flattened into each model ahead of its `extra` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Href>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_data_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_data_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps: Option<Vec<String>>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Keys the PCE manages itself and rejects in request bodies.
pub(crate) const SERVER_MANAGED_KEYS: &[&str] = &[
    "href",
    "created_at",
    "updated_at",
    "deleted_at",
    "created_by",
    "updated_by",
    "deleted_by",
    "update_type",
    "caps",
];

/// Serialize `body` and drop server-managed top-level keys.
pub(crate) fn writable_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, Error> {
    let mut value = serde_json::to_value(body).map_err(|e| Error::Validation {
        field: "body".into(),
        reason: e.to_string(),
    })?;
    if let Value::Object(map) = &mut value {
        for key in SERVER_MANAGED_KEYS {
            map.remove(*key);
        }
    }
    Ok(value)
}

// ── ObjectRef ───────────────────────────────────────────────────────

/// An embedded object that the PCE may return either as a bare
/// `{"href": ...}` stub or as the full object.
///
/// Which one is decided once, at decode time.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRef<T> {
    Href(Reference),
    Object(Box<T>),
}

impl<T: ApiObject> ObjectRef<T> {
    pub fn href(&self) -> Option<&Href> {
        match self {
            Self::Href(reference) => Some(&reference.href),
            Self::Object(object) => object.href(),
        }
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Href(_) => None,
            Self::Object(object) => Some(object),
        }
    }
}

impl<T> From<Reference> for ObjectRef<T> {
    fn from(reference: Reference) -> Self {
        Self::Href(reference)
    }
}

impl<T: ApiObject> AsReference for ObjectRef<T> {
    fn to_reference(&self) -> Result<Reference, Error> {
        match self {
            Self::Href(reference) => Ok(reference.clone()),
            Self::Object(object) => missing_href(object.href()),
        }
    }
}

impl<T: Serialize> Serialize for ObjectRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Href(reference) => reference.serialize(serializer),
            Self::Object(object) => object.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ObjectRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let is_stub = value
            .as_object()
            .is_some_and(|map| map.len() == 1 && map.contains_key("href"));
        if is_stub {
            Reference::deserialize(value)
                .map(Self::Href)
                .map_err(serde::de::Error::custom)
        } else {
            T::deserialize(value)
                .map(|object| Self::Object(Box::new(object)))
                .map_err(serde::de::Error::custom)
        }
    }
}

// ── GenericObject ───────────────────────────────────────────────────

/// Untyped object for kinds addressed dynamically (`PceClient::objects_of`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Href>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl GenericObject {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

impl ApiObject for GenericObject {
    fn href(&self) -> Option<&Href> {
        self.href.as_ref()
    }
}

impl AsReference for GenericObject {
    fn to_reference(&self) -> Result<Reference, Error> {
        missing_href(self.href.as_ref())
    }
}

pub(crate) fn missing_href(href: Option<&Href>) -> Result<Reference, Error> {
    href.cloned().map(Reference::new).ok_or_else(|| Error::Validation {
        field: "href".into(),
        reason: "object has not been created on the PCE yet".into(),
    })
}

/// Implements `ApiObject`, `PolicyObject` and `AsReference` for a model
/// that flattens `ObjectMeta` into a field named `meta`.
macro_rules! policy_object {
    ($ty:ty => $kind:ident) => {
        impl $crate::model::ApiObject for $ty {
            fn href(&self) -> Option<&$crate::href::Href> {
                self.meta.href.as_ref()
            }
        }

        impl $crate::model::PolicyObject for $ty {
            const KIND: $crate::kinds::ObjectKind = $crate::kinds::ObjectKind::$kind;
        }

        impl $crate::href::AsReference for $ty {
            fn to_reference(&self) -> Result<$crate::href::Reference, $crate::error::Error> {
                $crate::model::common::missing_href(self.meta.href.as_ref())
            }
        }
    };
}

pub(crate) use policy_object;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Label;
    use serde_json::json;

    #[test]
    fn href_only_mapping_decodes_as_stub() {
        let decoded: ObjectRef<Label> =
            serde_json::from_value(json!({"href": "/orgs/1/labels/3"})).unwrap();
        assert!(matches!(decoded, ObjectRef::Href(_)));
        assert_eq!(decoded.href().unwrap().as_str(), "/orgs/1/labels/3");
    }

    #[test]
    fn full_mapping_decodes_as_object() {
        let decoded: ObjectRef<Label> = serde_json::from_value(json!({
            "href": "/orgs/1/labels/3",
            "key": "role",
            "value": "web"
        }))
        .unwrap();
        let label = decoded.as_object().unwrap();
        assert_eq!(label.value.as_deref(), Some("web"));
    }

    #[test]
    fn writable_json_strips_server_fields() {
        let body = json!({
            "href": "/orgs/1/labels/3",
            "created_at": "2024-01-01T00:00:00Z",
            "value": "db"
        });
        assert_eq!(writable_json(&body).unwrap(), json!({"value": "db"}));
    }

    #[test]
    fn generic_object_keeps_every_field() {
        let raw = json!({"href": "/orgs/1/vens/abc", "name": "ven-1", "status": "active"});
        let object: GenericObject = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(object.name(), Some("ven-1"));
        assert_eq!(serde_json::to_value(&object).unwrap(), raw);
    }
}
