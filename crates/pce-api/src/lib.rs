// pce-api: Async Rust client for the Illumio PCE REST API
//
// `PceClient` owns the HTTP session; `ObjectApi` provides per-kind CRUD;
// `model` holds the typed objects and `href` the identifiers that tie
// them together.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod href;
pub mod jobs;
pub mod kinds;
pub mod model;
pub mod objects;
pub mod transport;

pub use auth::Credentials;
pub use client::PceClient;
pub use config::{DEFAULT_API_VERSION, DEFAULT_ORG_ID, DEFAULT_PORT, PceConfig};
pub use error::{ApiErrorDetail, Error};
pub use href::{AsReference, Href, ObjectId, PolicyState, Reference};
pub use jobs::{AsyncJob, JobReport, JobState, PollOptions};
pub use kinds::{EndpointConfig, ObjectKind};
pub use objects::{BULK_MAX_ITEMS, BulkOutcome, ObjectApi, Query, WORKLOAD_BULK_UPDATE_MAX};
pub use transport::{ProxyConfig, RetryPolicy, TlsMode, TransportConfig};
