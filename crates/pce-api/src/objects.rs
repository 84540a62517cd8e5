// ── Generic object CRUD ──
//
// One `ObjectApi` per object kind. Reads may target either policy copy;
// writes always go to draft.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::PceClient;
use crate::error::{ApiErrorDetail, Error};
use crate::href::{AsReference, Href, PolicyState};
use crate::jobs::PollOptions;
use crate::kinds::ObjectKind;
use crate::model::ApiObject;
use crate::model::common::writable_json;

/// Most items the PCE accepts in one bulk request.
pub const BULK_MAX_ITEMS: usize = 1000;

/// Chunk size for [`PceClient::update_workload_enforcement_modes`].
pub const WORKLOAD_BULK_UPDATE_MAX: usize = BULK_MAX_ITEMS;

const CREATED_STATUS: &str = "created";
const SUCCESS_STATUSES: &[&str] = &["created", "updated", "deleted", "ok", "success"];

// ── Query ────────────────────────────────────────────────────────────

/// Filters and options for collection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Extra query-string parameters, passed through as-is.
    pub params: Vec<(String, String)>,
    /// Policy copy to read. Defaults to draft.
    pub state: Option<PolicyState>,
    /// Owning object for nested kinds (rules under a rule set).
    pub parent: Option<Href>,
    pub max_results: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn state(mut self, state: PolicyState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn active(self) -> Self {
        self.state(PolicyState::Active)
    }

    #[must_use]
    pub fn parent(mut self, parent: Href) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.clone();
        if let Some(max) = self.max_results {
            pairs.push(("max_results".into(), max.to_string()));
        }
        pairs
    }

    fn read_state(&self) -> PolicyState {
        self.state
            .or_else(|| self.parent.as_ref().and_then(Href::policy_state))
            .unwrap_or_default()
    }
}

// ── Bulk outcomes ────────────────────────────────────────────────────

/// Per-item result of a bulk request, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Succeeded {
        href: Href,
        status: Option<String>,
    },
    Failed {
        href: Option<String>,
        status: Option<String>,
        errors: Vec<ApiErrorDetail>,
    },
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Succeeded { href, .. } => Some(href.as_str()),
            Self::Failed { href, .. } => href.as_deref(),
        }
    }

    /// Classify one entry of a bulk response.
    ///
    /// An entry succeeds when it names a valid href, carries no errors and
    /// its status (if any) is a success status.
    pub(crate) fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Failed {
                href: None,
                status: None,
                errors: vec![ApiErrorDetail {
                    token: None,
                    message: Some(value.to_string()),
                }],
            };
        };

        let raw_href = take_string(&mut map, "href");
        let status = take_string(&mut map, "status");
        let mut errors: Vec<ApiErrorDetail> = map
            .remove("errors")
            .and_then(|e| serde_json::from_value(e).ok())
            .unwrap_or_default();
        let token = take_string(&mut map, "token");
        let message = take_string(&mut map, "message");
        if token.is_some() || message.is_some() {
            errors.push(ApiErrorDetail { token, message });
        }

        let status_ok = status
            .as_deref()
            .is_none_or(|s| SUCCESS_STATUSES.contains(&s));
        match raw_href.as_deref().map(Href::parse) {
            Some(Ok(href)) if errors.is_empty() && status_ok => Self::Succeeded { href, status },
            _ => Self::Failed {
                href: raw_href,
                status,
                errors,
            },
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

// ── ObjectApi ────────────────────────────────────────────────────────

/// CRUD operations for one object kind, decoding into `T`.
#[derive(Debug, Clone, Copy)]
pub struct ObjectApi<'a, T> {
    client: &'a PceClient,
    kind: ObjectKind,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: ApiObject> ObjectApi<'a, T> {
    pub(crate) fn new(client: &'a PceClient, kind: ObjectKind) -> Self {
        Self {
            client,
            kind,
            _marker: PhantomData,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn collection_path(&self, state: PolicyState, parent: Option<&Href>) -> Result<String, Error> {
        self.kind
            .collection_path(self.client.org_id(), state, parent)
    }

    /// Href for a write: versioned objects are redirected to draft.
    fn write_href(&self, target: &(impl AsReference + ?Sized)) -> Result<Href, Error> {
        let href = self.check_kind(target.to_reference()?.href)?;
        Ok(if href.policy_state().is_some() {
            href.to_draft()
        } else {
            href
        })
    }

    fn check_kind(&self, href: Href) -> Result<Href, Error> {
        let expected = self.kind.endpoint().collection;
        if href.collection() == expected {
            Ok(href)
        } else {
            Err(Error::Validation {
                field: "href".into(),
                reason: format!("{href} is not a {} href", self.kind),
            })
        }
    }

    fn ensure_bulk(&self, size: usize) -> Result<(), Error> {
        if !self.kind.endpoint().bulk {
            return Err(Error::UnsupportedOperation(format!(
                "{} does not support bulk operations",
                self.kind
            )));
        }
        if size > BULK_MAX_ITEMS {
            return Err(Error::BatchTooLarge {
                size,
                max: BULK_MAX_ITEMS,
            });
        }
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// One page of the collection, as many items as the PCE returns by default
    /// (or `query.max_results`).
    pub async fn get(&self, query: &Query) -> Result<Vec<T>, Error> {
        let path = self.collection_path(query.read_state(), query.parent.as_ref())?;
        Ok(self.client.get_page(&path, &query.pairs()).await?.items)
    }

    /// Every matching object.
    ///
    /// When the PCE reports more objects in `X-Total-Count` than it returned,
    /// the request is repeated with `max_results` raised to the total until the
    /// count is reached or stops growing. Without the header, the first page
    /// is the result.
    pub async fn get_all(&self, query: &Query) -> Result<Vec<T>, Error> {
        let path = self.collection_path(query.read_state(), query.parent.as_ref())?;
        let first = self.client.get_page::<T>(&path, &query.pairs()).await?;
        let mut items = first.items;
        if query.max_results.is_some() {
            return Ok(items);
        }
        let Some(mut total) = first.total else {
            return Ok(items);
        };

        while items.len() < total {
            debug!(
                kind = %self.kind,
                received = items.len(),
                total,
                "collection truncated, re-requesting with max_results"
            );
            let mut pairs = query.pairs();
            pairs.push(("max_results".into(), total.to_string()));
            let page = self.client.get_page::<T>(&path, &pairs).await?;
            if page.items.len() <= items.len() {
                break;
            }
            items = page.items;
            total = page.total.unwrap_or(total);
        }
        Ok(items)
    }

    /// Every matching object, fetched through a server-side async job.
    ///
    /// Suited to collections too large for a synchronous read.
    pub async fn get_async(&self, query: &Query, options: &PollOptions) -> Result<Vec<T>, Error> {
        let path = self.collection_path(query.read_state(), query.parent.as_ref())?;
        let mut job = self.client.submit_async(&path, &query.pairs()).await?;
        let result = self.client.wait_for_job(&mut job, options).await?;
        self.client.get_path(&result, &[]).await
    }

    /// Fetch one object by href (or anything that resolves to one).
    pub async fn get_by_reference(&self, target: &(impl AsReference + ?Sized)) -> Result<T, Error> {
        let href = self.check_kind(target.to_reference()?.href)?;
        self.client.get_path(href.as_str(), &[]).await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Create a top-level object.
    pub async fn create(&self, object: &T) -> Result<T, Error> {
        let path = self.collection_path(PolicyState::Draft, None)?;
        self.post_new(&path, object).await
    }

    /// Create an object nested under `parent` (e.g. a rule in a rule set).
    pub async fn create_in(
        &self,
        parent: &(impl AsReference + ?Sized),
        object: &T,
    ) -> Result<T, Error> {
        let parent = parent.to_reference()?.href;
        let path = self.collection_path(PolicyState::Draft, Some(&parent))?;
        self.post_new(&path, object).await
    }

    async fn post_new(&self, path: &str, object: &T) -> Result<T, Error> {
        let body = writable_json(object)?;
        if !self.kind.endpoint().array_create {
            return self.client.post_path(path, &body).await;
        }

        // Answered with `[{"href": ..., "status": "created"}]`, not the object.
        let (http_status, outcomes): (u16, Vec<Value>) = self
            .client
            .post_path_status(path, &Value::Array(vec![body.clone()]))
            .await?;
        match outcomes.into_iter().next().map(BulkOutcome::from_value) {
            Some(BulkOutcome::Succeeded {
                href,
                status: Some(status),
            }) if status == CREATED_STATUS => {
                debug!("created {href}");
                let mut created = body;
                if let Value::Object(map) = &mut created {
                    map.insert("href".into(), Value::String(href.to_string()));
                }
                let raw = created.to_string();
                serde_json::from_value(created).map_err(|e| Error::deserialization(&e, raw))
            }
            outcome => Err(self.create_rejected(http_status, outcome)),
        }
    }

    fn create_rejected(&self, http_status: u16, outcome: Option<BulkOutcome>) -> Error {
        let (status, details) = match outcome {
            Some(BulkOutcome::Failed { status, errors, .. }) => (status, errors),
            Some(BulkOutcome::Succeeded { status, .. }) => (status, Vec::new()),
            None => (None, Vec::new()),
        };
        let mut message = format!(
            "{} create answered with status '{}'",
            self.kind,
            status.as_deref().unwrap_or("none")
        );
        if !details.is_empty() {
            let joined = details
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            message.push_str(&format!(": {joined}"));
        }
        Error::Api {
            status: http_status,
            message,
            details,
        }
    }

    /// Update `target` with the fields set in `body`.
    ///
    /// `body` may be a partial object; unset fields are left unchanged on the
    /// server.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        target: &(impl AsReference + ?Sized),
        body: &B,
    ) -> Result<(), Error> {
        let href = self.write_href(target)?;
        self.client.put_path(href.as_str(), &writable_json(body)?).await
    }

    pub async fn delete(&self, target: &(impl AsReference + ?Sized)) -> Result<(), Error> {
        let href = self.write_href(target)?;
        self.client.delete_path(href.as_str()).await
    }

    // ── Bulk ─────────────────────────────────────────────────────────

    async fn bulk(&self, action: &str, body: Vec<Value>) -> Result<Vec<BulkOutcome>, Error> {
        self.ensure_bulk(body.len())?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let path = format!(
            "{}/bulk_{action}",
            self.collection_path(PolicyState::Draft, None)?
        );
        let outcomes: Vec<Value> = self
            .client
            .put_path_json(&path, &Value::Array(body))
            .await?;
        Ok(outcomes.into_iter().map(BulkOutcome::from_value).collect())
    }

    pub async fn bulk_create(&self, objects: &[T]) -> Result<Vec<BulkOutcome>, Error> {
        self.ensure_bulk(objects.len())?;
        let body = objects
            .iter()
            .map(writable_json)
            .collect::<Result<Vec<_>, _>>()?;
        self.bulk("create", body).await
    }

    /// Each item must carry the `href` of the object it updates.
    pub async fn bulk_update<B: Serialize>(&self, objects: &[B]) -> Result<Vec<BulkOutcome>, Error> {
        self.ensure_bulk(objects.len())?;
        let mut body = Vec::with_capacity(objects.len());
        for object in objects {
            let raw = serde_json::to_value(object).map_err(|e| Error::Validation {
                field: "body".into(),
                reason: e.to_string(),
            })?;
            let href = raw.to_reference()?.href;
            let href = self.write_href(&href)?;
            let mut item = writable_json(&raw)?;
            if let Value::Object(map) = &mut item {
                map.insert("href".into(), Value::String(href.to_string()));
            }
            body.push(item);
        }
        self.bulk("update", body).await
    }

    pub async fn bulk_delete<R: AsReference>(&self, targets: &[R]) -> Result<Vec<BulkOutcome>, Error> {
        self.ensure_bulk(targets.len())?;
        let body = targets
            .iter()
            .map(|t| {
                let href = self.write_href(t)?;
                Ok(serde_json::json!({ "href": href.as_str() }))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        self.bulk("delete", body).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_append_max_results() {
        let query = Query::new().param("name", "web").max_results(50);
        assert_eq!(
            query.pairs(),
            vec![
                ("name".to_owned(), "web".to_owned()),
                ("max_results".to_owned(), "50".to_owned())
            ]
        );
    }

    #[test]
    fn nested_reads_follow_parent_state() {
        let parent = Href::parse("/orgs/1/sec_policy/active/rule_sets/4").unwrap();
        assert_eq!(Query::new().parent(parent).read_state(), PolicyState::Active);
        assert_eq!(Query::new().read_state(), PolicyState::Draft);
    }

    #[test]
    fn bulk_outcomes_classify_entries() {
        let ok = BulkOutcome::from_value(json!({"href": "/orgs/1/workloads/ab", "status": "updated"}));
        assert!(ok.is_success());

        let bare = BulkOutcome::from_value(json!({"href": "/orgs/1/service_bindings/cd"}));
        assert!(bare.is_success());

        let failed = BulkOutcome::from_value(json!({
            "href": "/orgs/1/workloads/ef",
            "status": "validation_failure",
            "errors": [{"token": "invalid_label", "message": "bad label"}]
        }));
        assert!(!failed.is_success());
        assert_eq!(failed.href(), Some("/orgs/1/workloads/ef"));

        let token_only = BulkOutcome::from_value(json!({"token": "not_found", "message": "gone"}));
        match token_only {
            BulkOutcome::Failed { href, errors, .. } => {
                assert_eq!(href, None);
                assert_eq!(errors[0].token.as_deref(), Some("not_found"));
            }
            BulkOutcome::Succeeded { .. } => panic!("expected failure"),
        }
    }
}
