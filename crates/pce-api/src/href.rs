// ── Hrefs and references ──
//
// Every PCE object is identified by an href path such as
// `/orgs/1/sec_policy/draft/rule_sets/19/sec_rules/4`. Hrefs are validated
// structurally on parse; whether the target exists is only known to the PCE.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;

/// Which policy copy of a versioned object an href addresses.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyState {
    /// Mutable working copy. All writes go here.
    #[default]
    Draft,
    /// Last provisioned, read-only snapshot.
    Active,
}

// ── ObjectId ────────────────────────────────────────────────────────

/// The trailing id segment of an href.
///
/// The PCE mixes numeric ids (labels, rule sets), UUIDs (workloads,
/// virtual services) and free-form strings (vulnerability ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Uuid(Uuid),
    Numeric(u64),
    Other(String),
}

impl ObjectId {
    fn classify(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<u64>() {
            Self::Numeric(n)
        } else if let Ok(uuid) = Uuid::parse_str(raw) {
            Self::Uuid(uuid)
        } else {
            Self::Other(raw.to_owned())
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

// ── Href ────────────────────────────────────────────────────────────

/// A parsed, structurally valid object href.
///
/// Shape: optional `/orgs/{n}`, optional `sec_policy/{draft|active}`,
/// then one or more `{collection}/{id}` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Href {
    raw: String,
    org_id: Option<u32>,
    state: Option<PolicyState>,
    // (collection, id) pairs, outermost first; never empty.
    pairs: Vec<(String, String)>,
}

impl Href {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidHref {
            href: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = raw.trim();
        let Some(path) = trimmed.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        let mut segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty path segment"));
        }

        let mut org_id = None;
        if segments.first() == Some(&"orgs") {
            let id = segments
                .get(1)
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(|| invalid("org id must be numeric"))?;
            org_id = Some(id);
            segments.drain(..2);
        }

        let mut state = None;
        if segments.first() == Some(&"sec_policy") {
            if let Some(parsed) = segments.get(1).and_then(|s| s.parse::<PolicyState>().ok()) {
                state = Some(parsed);
                segments.drain(..2);
            }
        }

        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(invalid("expected {collection}/{id} pairs"));
        }

        let mut pairs = Vec::with_capacity(segments.len() / 2);
        for pair in segments.chunks(2) {
            let [collection, id] = pair else {
                return Err(invalid("expected {collection}/{id} pairs"));
            };
            if !collection
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '_')
            {
                return Err(invalid("collection names are letters and underscores"));
            }
            if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(invalid("ids are letters, digits and hyphens"));
            }
            pairs.push(((*collection).to_owned(), (*id).to_owned()));
        }

        Ok(Self {
            raw: trimmed.trim_end_matches('/').to_owned(),
            org_id,
            state,
            pairs,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn org_id(&self) -> Option<u32> {
        self.org_id
    }

    /// `Some` only for hrefs under `sec_policy/{draft|active}`.
    pub fn policy_state(&self) -> Option<PolicyState> {
        self.state
    }

    /// Collection of the addressed object (the last pair).
    pub fn collection(&self) -> &str {
        self.pairs.last().map_or("", |(c, _)| c.as_str())
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::classify(self.id_str())
    }

    pub fn id_str(&self) -> &str {
        self.pairs.last().map_or("", |(_, id)| id.as_str())
    }

    /// Href of the enclosing object, e.g. the rule set owning a rule.
    pub fn parent(&self) -> Option<Self> {
        if self.pairs.len() < 2 {
            return None;
        }
        let mut pairs = self.pairs.clone();
        pairs.pop();
        Some(self.rebuild(self.state, pairs))
    }

    pub fn to_draft(&self) -> Self {
        self.with_state(PolicyState::Draft)
    }

    pub fn to_active(&self) -> Self {
        self.with_state(PolicyState::Active)
    }

    /// Same object in the given policy copy. Unversioned hrefs are returned unchanged.
    pub fn with_state(&self, state: PolicyState) -> Self {
        match self.state {
            Some(current) if current != state => self.rebuild(Some(state), self.pairs.clone()),
            _ => self.clone(),
        }
    }

    fn rebuild(&self, state: Option<PolicyState>, pairs: Vec<(String, String)>) -> Self {
        let mut raw = String::new();
        if let Some(org) = self.org_id {
            raw.push_str(&format!("/orgs/{org}"));
        }
        if let Some(state) = state {
            raw.push_str(&format!("/sec_policy/{state}"));
        }
        for (collection, id) in &pairs {
            raw.push_str(&format!("/{collection}/{id}"));
        }
        Self {
            raw,
            org_id: self.org_id,
            state,
            pairs,
        }
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Href {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for Href {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Href {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Reference ───────────────────────────────────────────────────────

/// A bare `{"href": "..."}` pointer to another object.
///
/// Two references are equal when their hrefs are equal, whatever form
/// they were built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub href: Href,
}

impl Reference {
    pub fn new(href: Href) -> Self {
        Self { href }
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        Href::parse(raw).map(Self::new)
    }
}

impl From<Href> for Reference {
    fn from(href: Href) -> Self {
        Self { href }
    }
}

/// Anything that can name a PCE object: an href string, a JSON mapping
/// with an `href` key, a `Reference`, or a typed object.
pub trait AsReference {
    fn to_reference(&self) -> Result<Reference, Error>;
}

impl AsReference for str {
    fn to_reference(&self) -> Result<Reference, Error> {
        Reference::parse(self)
    }
}

impl AsReference for String {
    fn to_reference(&self) -> Result<Reference, Error> {
        Reference::parse(self)
    }
}

impl AsReference for Href {
    fn to_reference(&self) -> Result<Reference, Error> {
        Ok(Reference::new(self.clone()))
    }
}

impl AsReference for Reference {
    fn to_reference(&self) -> Result<Reference, Error> {
        Ok(self.clone())
    }
}

impl AsReference for serde_json::Map<String, Value> {
    fn to_reference(&self) -> Result<Reference, Error> {
        match self.get("href") {
            Some(Value::String(href)) => Reference::parse(href),
            _ => Err(Error::Validation {
                field: "href".into(),
                reason: "mapping has no string 'href' key".into(),
            }),
        }
    }
}

impl AsReference for Value {
    fn to_reference(&self) -> Result<Reference, Error> {
        match self {
            Self::String(href) => Reference::parse(href),
            Self::Object(map) => map.to_reference(),
            _ => Err(Error::Validation {
                field: "href".into(),
                reason: "expected an href string or an object with an 'href' key".into(),
            }),
        }
    }
}

impl<T: AsReference + ?Sized> AsReference for &T {
    fn to_reference(&self) -> Result<Reference, Error> {
        (**self).to_reference()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_versioned_nested_href() {
        let href = Href::parse("/orgs/1/sec_policy/draft/rule_sets/19/sec_rules/4").unwrap();
        assert_eq!(href.org_id(), Some(1));
        assert_eq!(href.policy_state(), Some(PolicyState::Draft));
        assert_eq!(href.collection(), "sec_rules");
        assert_eq!(href.id(), ObjectId::Numeric(4));
        assert_eq!(
            href.parent().unwrap().as_str(),
            "/orgs/1/sec_policy/draft/rule_sets/19"
        );
    }

    #[test]
    fn parses_global_and_uuid_hrefs() {
        let user = Href::parse("/users/12").unwrap();
        assert_eq!(user.org_id(), None);
        assert_eq!(user.collection(), "users");

        let wl = Href::parse("/orgs/3/workloads/a9b4f1e2-4c6d-4f5e-9a7b-1c2d3e4f5a6b").unwrap();
        assert!(matches!(wl.id(), ObjectId::Uuid(_)));
        assert_eq!(wl.policy_state(), None);
    }

    #[test]
    fn policy_version_href_is_a_plain_pair() {
        let href = Href::parse("/orgs/1/sec_policy/110").unwrap();
        assert_eq!(href.policy_state(), None);
        assert_eq!(href.collection(), "sec_policy");
        assert_eq!(href.id(), ObjectId::Numeric(110));
    }

    #[test]
    fn rejects_malformed_hrefs() {
        for bad in [
            "orgs/1/labels/1",
            "/orgs/x/labels/1",
            "/orgs/1/labels",
            "/orgs/1//labels/1",
            "/orgs/1/label-groups/1",
            "/orgs/1/labels/a b",
            "/orgs/1/labels/7.json",
        ] {
            assert!(
                matches!(Href::parse(bad), Err(Error::InvalidHref { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn draft_active_conversion_only_touches_versioned_hrefs() {
        let active = Href::parse("/orgs/1/sec_policy/active/ip_lists/5").unwrap();
        assert_eq!(active.to_draft().as_str(), "/orgs/1/sec_policy/draft/ip_lists/5");
        assert_eq!(active.to_draft().to_active(), active);

        let label = Href::parse("/orgs/1/labels/5").unwrap();
        assert_eq!(label.to_draft(), label);
    }

    #[test]
    fn reference_forms_agree() {
        let raw = "/orgs/1/labels/7";
        let from_str = raw.to_reference().unwrap();
        let from_json = json!({"href": raw, "key": "role"}).to_reference().unwrap();
        let from_href = Href::parse(raw).unwrap().to_reference().unwrap();
        assert_eq!(from_str, from_json);
        assert_eq!(from_json, from_href);
    }

    #[test]
    fn mapping_without_href_is_rejected() {
        let err = json!({"name": "orphan"}).to_reference().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn reference_serializes_as_href_mapping() {
        let reference = Reference::parse("/orgs/1/labels/7").unwrap();
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({"href": "/orgs/1/labels/7"})
        );
    }
}
