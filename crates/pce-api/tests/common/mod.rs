#![allow(clippy::unwrap_used, dead_code)]
// Shared helpers for pce-api integration tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

use pce_api::{Credentials, Href, PceClient, PceConfig, RetryPolicy, TransportConfig};

pub const API_PREFIX: &str = "/api/v2";

/// Client pointed at `server`, org 1, with retries disabled.
pub fn client_for(server: &MockServer) -> PceClient {
    client_with_retry(server, RetryPolicy::none())
}

pub fn client_with_retry(server: &MockServer, retry: RetryPolicy) -> PceClient {
    let transport = TransportConfig {
        retry,
        ..TransportConfig::default()
    };
    let config = PceConfig::new(server.uri(), Credentials::api_key("api_test", "secret"))
        .with_port(server.address().port())
        .with_transport(transport);
    PceClient::new(&config).unwrap()
}

pub async fn setup() -> (MockServer, PceClient) {
    let server = MockServer::start().await;
    let client = client_for(&server);
    (server, client)
}

/// Full request path for an href-style path.
pub fn api(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

// ── Stateful PCE ────────────────────────────────────────────────────

/// Collections whose objects get UUID ids; everything else is numeric.
const UUID_COLLECTIONS: &[&str] = &[
    "workloads",
    "vens",
    "virtual_services",
    "label_groups",
    "container_clusters",
    "container_workload_profiles",
    "events",
];

/// An in-memory PCE that honours GET/POST/PUT/DELETE on any collection.
///
/// GET on an object href that is not stored is a 404; any other unknown
/// path is listed as a collection.
/// Objects are keyed by href. PUT merges top-level fields into the stored
/// object, like the real PCE does for partial updates.
#[derive(Clone, Default)]
pub struct MockPce {
    objects: Arc<Mutex<BTreeMap<String, Value>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockPce {
    pub fn new() -> Self {
        Self {
            objects: Arc::default(),
            next_id: Arc::new(Mutex::new(500)),
        }
    }

    pub fn insert(&self, href: &str, mut object: Value) {
        object["href"] = Value::String(href.to_owned());
        self.objects.lock().unwrap().insert(href.to_owned(), object);
    }

    pub fn get(&self, href: &str) -> Option<Value> {
        self.objects.lock().unwrap().get(href).cloned()
    }

    fn new_id(&self, collection: &str) -> String {
        if UUID_COLLECTIONS.contains(&collection) {
            uuid::Uuid::new_v4().to_string()
        } else {
            let mut next = self.next_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id.to_string()
        }
    }

    fn list(&self, collection: &str) -> Vec<Value> {
        let prefix = format!("{collection}/");
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(href, _)| {
                href.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|(_, object)| object.clone())
            .collect()
    }
}

fn not_found(path: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!([{
        "token": "not_found",
        "message": format!("{path} not found")
    }]))
}

impl Respond for MockPce {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request
            .url
            .path()
            .strip_prefix(API_PREFIX)
            .unwrap_or(request.url.path())
            .to_owned();
        let known = self.get(&path);

        match (request.method.as_str(), known) {
            ("GET", Some(object)) => ResponseTemplate::new(200).set_body_json(object),
            ("GET", None) if Href::parse(&path).is_ok() => not_found(&path),
            ("GET", None) => {
                let items = self.list(&path);
                ResponseTemplate::new(200)
                    .insert_header("X-Total-Count", items.len().to_string().as_str())
                    .set_body_json(Value::Array(items))
            }
            ("POST", None) => {
                let mut body: Value = serde_json::from_slice(&request.body).unwrap();
                let collection = path.rsplit('/').next().unwrap_or_default().to_owned();
                let href = format!("{path}/{}", self.new_id(&collection));
                body["href"] = Value::String(href.clone());
                self.insert(&href, body.clone());
                ResponseTemplate::new(201).set_body_json(body)
            }
            ("PUT", Some(mut object)) => {
                let body: Map<String, Value> = serde_json::from_slice(&request.body).unwrap();
                if let Value::Object(stored) = &mut object {
                    stored.extend(body);
                }
                self.objects.lock().unwrap().insert(path, object);
                ResponseTemplate::new(204)
            }
            ("DELETE", Some(_)) => {
                self.objects.lock().unwrap().remove(&path);
                ResponseTemplate::new(204)
            }
            _ => not_found(&path),
        }
    }
}
