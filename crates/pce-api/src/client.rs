// Async HTTP client for the PCE REST API.
//
// Base path: {scheme}://{host}:{port}/api/{version}
// Auth: HTTP Basic (API key id + secret, or username + password)

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::config::PceConfig;
use crate::error::{ApiErrorDetail, Error, is_retryable_status};
use crate::href::AsReference;
use crate::jobs::{AsyncJob, PollOptions};
use crate::kinds::ObjectKind;
use crate::model::{
    ANY_IP_LIST_NAME, ContainerCluster, ContainerWorkloadProfile, EnforcementBoundary,
    EnforcementMode, Event, FirewallSettings, GenericObject, IpList, Label, LabelGroup,
    PairingKey, PairingProfile, PolicyChangeset, PolicyObject, PolicyVersion, ProvisionRequest,
    Rule, RuleSet, SecurityPrincipal, Service, ServiceBinding, TrafficFlow, TrafficQuery, User,
    Ven, VirtualService, Workload,
};
use crate::objects::{BulkOutcome, ObjectApi, Query, WORKLOAD_BULK_UPDATE_MAX};
use crate::transport::RetryPolicy;

const TOTAL_COUNT_HEADER: &str = "x-total-count";

fn prefer_async() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("prefer"),
        HeaderValue::from_static("respond-async"),
    )
}

// ── Error response shapes ────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<ErrorEntry> for ApiErrorDetail {
    fn from(entry: ErrorEntry) -> Self {
        Self {
            token: entry.token,
            message: entry.message.or(entry.error),
        }
    }
}

/// One decoded JSON response plus the collection total, when reported.
pub(crate) struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<usize>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client bound to one PCE organization.
///
/// Read-only after construction; share it freely across tasks.
#[derive(Debug, Clone)]
pub struct PceClient {
    http: reqwest::Client,
    base_url: Url,
    org_id: u32,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl PceClient {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn new(config: &PceConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self {
            http,
            base_url: config.base_url()?,
            org_id: config.org_id,
            credentials: config.credentials.clone(),
            retry: config.transport.retry,
        })
    }

    /// Wrap an existing `reqwest::Client`. `base_url` must already end in
    /// `/api/{version}`.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        org_id: u32,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            org_id,
            credentials,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn org_id(&self) -> u32 {
        self.org_id
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Resolve an href-style path (e.g. `/orgs/1/labels`) against the base URL.
    /// Absolute URLs pass through untouched.
    fn url(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Send a request, retrying transient failures per the retry policy.
    ///
    /// POST is never retried; the PCE may have acted on the first attempt.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        if query.is_empty() {
            debug!("{method} {url}");
        } else {
            debug!("{method} {url} params={query:?}");
        }

        let mut request = self.http.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        for (name, value) in headers {
            request = request.header(name.clone(), value.clone());
        }
        let request = self.credentials.apply(request);

        let retryable = method != Method::POST;
        let mut attempt: u32 = 0;
        loop {
            let Some(current) = request.try_clone() else {
                return Self::check_status(request.send().await?).await;
            };
            let can_retry = retryable && attempt < self.retry.max_retries;
            match current.send().await {
                Ok(resp) if can_retry && is_retryable_status(resp.status().as_u16()) => {
                    warn!(status = %resp.status(), attempt = attempt + 1, "transient PCE response, retrying");
                }
                Ok(resp) => return Self::check_status(resp).await,
                Err(e) if can_retry && (e.is_timeout() || e.is_connect()) => {
                    warn!(error = %e, attempt = attempt + 1, "transport error, retrying");
                }
                Err(e) => return Err(e.into()),
            }
            attempt += 1;
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
        }
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        Err(Self::parse_error(status, resp).await)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let details: Vec<ApiErrorDetail> = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|e| serde_json::from_value::<ErrorEntry>(e).ok())
                .map(ApiErrorDetail::from)
                .collect(),
            Ok(obj @ Value::Object(_)) => serde_json::from_value::<ErrorEntry>(obj)
                .map(|e| vec![ApiErrorDetail::from(e)])
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let details: Vec<ApiErrorDetail> = details
            .into_iter()
            .filter(|d| d.token.is_some() || d.message.is_some())
            .collect();

        let message = if !details.is_empty() {
            details
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        } else if !raw.trim().is_empty() {
            raw.trim().to_owned()
        } else {
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), str::to_owned)
        };

        if status == StatusCode::UNAUTHORIZED {
            return Error::Authentication { message };
        }
        Error::Api {
            status: status.as_u16(),
            message,
            details,
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get_path<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, query, None, &[]).await?;
        Self::decode(resp).await
    }

    /// GET a collection and read `X-Total-Count`.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Page<T>, Error> {
        let resp = self.send(Method::GET, path, query, None, &[]).await?;
        let total = resp
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok());
        let items = Self::decode(resp).await?;
        Ok(Page { items, total })
    }

    pub(crate) async fn post_path<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, Error> {
        let resp = self.send(Method::POST, path, &[], Some(body), &[]).await?;
        Self::decode(resp).await
    }

    /// POST and keep the HTTP status next to the decoded body.
    pub(crate) async fn post_path_status<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<(u16, T), Error> {
        let resp = self.send(Method::POST, path, &[], Some(body), &[]).await?;
        let status = resp.status().as_u16();
        Ok((status, Self::decode(resp).await?))
    }

    pub(crate) async fn put_path(&self, path: &str, body: &Value) -> Result<(), Error> {
        self.send(Method::PUT, path, &[], Some(body), &[]).await?;
        Ok(())
    }

    pub(crate) async fn put_path_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, Error> {
        let resp = self.send(Method::PUT, path, &[], Some(body), &[]).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn delete_path(&self, path: &str) -> Result<(), Error> {
        self.send(Method::DELETE, path, &[], None, &[]).await?;
        Ok(())
    }

    /// GET with `Prefer: respond-async` and capture the job handle.
    pub(crate) async fn submit_async(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<AsyncJob, Error> {
        let resp = self
            .send(Method::GET, path, query, None, &[prefer_async()])
            .await?;
        let headers = resp.headers();
        let location = headers
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::MissingHeader("Location"))?;
        let retry_after = headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        debug!("async job submitted at {location}");
        Ok(AsyncJob::new(location, retry_after))
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Health ───────────────────────────────────────────────────────

    /// `GET /health`. Any failure, including transport errors, is `false`.
    pub async fn check_connection(&self) -> bool {
        match self.send(Method::GET, "/health", &[], None, &[]).await {
            Ok(_) => true,
            Err(e) => {
                debug!("health check failed: {e}");
                false
            }
        }
    }

    // ── Object APIs ──────────────────────────────────────────────────

    /// CRUD operations for a typed object kind.
    pub fn objects<T: PolicyObject>(&self) -> ObjectApi<'_, T> {
        ObjectApi::new(self, T::KIND)
    }

    /// CRUD operations for a kind chosen at runtime, as untyped objects.
    pub fn objects_of(&self, kind: ObjectKind) -> ObjectApi<'_, GenericObject> {
        ObjectApi::new(self, kind)
    }

    pub fn labels(&self) -> ObjectApi<'_, Label> {
        self.objects()
    }

    pub fn label_groups(&self) -> ObjectApi<'_, LabelGroup> {
        self.objects()
    }

    pub fn ip_lists(&self) -> ObjectApi<'_, IpList> {
        self.objects()
    }

    pub fn services(&self) -> ObjectApi<'_, Service> {
        self.objects()
    }

    pub fn virtual_services(&self) -> ObjectApi<'_, VirtualService> {
        self.objects()
    }

    pub fn service_bindings(&self) -> ObjectApi<'_, ServiceBinding> {
        self.objects()
    }

    pub fn rule_sets(&self) -> ObjectApi<'_, RuleSet> {
        self.objects()
    }

    pub fn rules(&self) -> ObjectApi<'_, Rule> {
        self.objects()
    }

    pub fn enforcement_boundaries(&self) -> ObjectApi<'_, EnforcementBoundary> {
        self.objects()
    }

    pub fn firewall_settings(&self) -> ObjectApi<'_, FirewallSettings> {
        self.objects()
    }

    pub fn workloads(&self) -> ObjectApi<'_, Workload> {
        self.objects()
    }

    pub fn vens(&self) -> ObjectApi<'_, Ven> {
        self.objects()
    }

    pub fn pairing_profiles(&self) -> ObjectApi<'_, PairingProfile> {
        self.objects()
    }

    pub fn container_clusters(&self) -> ObjectApi<'_, ContainerCluster> {
        self.objects()
    }

    pub fn container_workload_profiles(&self) -> ObjectApi<'_, ContainerWorkloadProfile> {
        self.objects()
    }

    pub fn security_principals(&self) -> ObjectApi<'_, SecurityPrincipal> {
        self.objects()
    }

    pub fn events(&self) -> ObjectApi<'_, Event> {
        self.objects()
    }

    pub fn users(&self) -> ObjectApi<'_, User> {
        self.objects()
    }

    // ── Policy provisioning ──────────────────────────────────────────

    /// Provision the given draft objects, creating a new policy version.
    pub async fn provision_policy_changes<R: AsReference>(
        &self,
        description: &str,
        hrefs: &[R],
    ) -> Result<PolicyVersion, Error> {
        let changeset = PolicyChangeset::build(hrefs)?;
        if changeset.is_empty() {
            return Err(Error::Validation {
                field: "hrefs".into(),
                reason: "nothing to provision".into(),
            });
        }
        let body = serde_json::to_value(ProvisionRequest {
            update_description: description,
            change_subset: &changeset,
        })
        .map_err(|e| Error::Validation {
            field: "changeset".into(),
            reason: e.to_string(),
        })?;
        self.post_path(&format!("/orgs/{}/sec_policy", self.org_id), &body)
            .await
    }

    /// The built-in "Any (0.0.0.0/0 and ::/0)" IP list, active copy.
    pub async fn default_ip_list(&self) -> Result<IpList, Error> {
        let query = Query::new()
            .active()
            .param("name", ANY_IP_LIST_NAME);
        self.ip_lists()
            .get(&query)
            .await?
            .into_iter()
            .find(|list| list.meta.name.as_deref() == Some(ANY_IP_LIST_NAME))
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("IP list '{ANY_IP_LIST_NAME}' not found"),
                details: Vec::new(),
            })
    }

    // ── Pairing ──────────────────────────────────────────────────────

    /// Generate a one-time pairing key (activation code) from a profile.
    pub async fn generate_pairing_key<R: AsReference + ?Sized>(
        &self,
        profile: &R,
    ) -> Result<String, Error> {
        let reference = profile.to_reference()?;
        let path = format!("{}/pairing_key", reference.href);
        let key: PairingKey = self.post_path(&path, &Value::Object(serde_json::Map::new())).await?;
        Ok(key.activation_code)
    }

    // ── Service bindings ─────────────────────────────────────────────

    /// Bind virtual services to workloads in one request.
    ///
    /// Outcomes are returned in input order.
    pub async fn create_service_bindings(
        &self,
        bindings: &[ServiceBinding],
    ) -> Result<Vec<BulkOutcome>, Error> {
        let body = bindings
            .iter()
            .map(crate::model::common::writable_json)
            .collect::<Result<Vec<_>, _>>()?;
        let path = ObjectKind::ServiceBindings.collection_path(
            self.org_id,
            crate::href::PolicyState::Draft,
            None,
        )?;
        let outcomes: Vec<Value> = self.post_path(&path, &Value::Array(body)).await?;
        Ok(outcomes.into_iter().map(BulkOutcome::from_value).collect())
    }

    // ── Workload enforcement ─────────────────────────────────────────

    /// Move workloads to `mode`, any number at a time.
    ///
    /// Sent as `bulk_update` requests of at most
    /// [`WORKLOAD_BULK_UPDATE_MAX`] workloads each. Outcomes from every chunk
    /// are returned in input order; a failed request stops the run.
    pub async fn update_workload_enforcement_modes<R: AsReference>(
        &self,
        mode: EnforcementMode,
        workloads: &[R],
    ) -> Result<Vec<BulkOutcome>, Error> {
        let updates = workloads
            .iter()
            .map(|w| {
                let href = w.to_reference()?.href;
                Ok(serde_json::json!({
                    "href": href.as_str(),
                    "enforcement_mode": mode.as_ref(),
                }))
            })
            .collect::<Result<Vec<Value>, Error>>()?;

        let api = self.workloads();
        let mut outcomes = Vec::with_capacity(updates.len());
        for chunk in updates.chunks(WORKLOAD_BULK_UPDATE_MAX) {
            debug!(count = chunk.len(), %mode, "updating workload enforcement modes");
            outcomes.extend(api.bulk_update(chunk).await?);
        }
        Ok(outcomes)
    }

    // ── Explorer ─────────────────────────────────────────────────────

    /// Run an async Explorer traffic query and download its flows.
    pub async fn traffic_flows_async(
        &self,
        query_name: &str,
        query: &TrafficQuery,
        options: &PollOptions,
    ) -> Result<Vec<TrafficFlow>, Error> {
        let mut query = query.clone();
        query.query_name = Some(query_name.to_owned());
        let body = serde_json::to_value(&query).map_err(|e| Error::Validation {
            field: "traffic_query".into(),
            reason: e.to_string(),
        })?;

        let path = format!("/orgs/{}/traffic_flows/async_queries", self.org_id);
        let resp = self
            .send(Method::POST, &path, &[], Some(&body), &[prefer_async()])
            .await?;
        let submitted: Value = Self::decode(resp).await?;
        let location = submitted
            .get("href")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Deserialization {
                message: "async query response has no href".into(),
                body: submitted.to_string(),
            })?;

        let mut job = AsyncJob::new(location, None);
        let result = self.wait_for_job(&mut job, options).await?;
        self.get_path(&result, &[]).await
    }
}
