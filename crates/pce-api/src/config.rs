// ── Runtime connection configuration ──
//
// Describes how to reach one PCE organization. Carries credential data and
// transport tuning but never touches disk; `pce-config` builds it from
// profiles and hands it in.

use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_ORG_ID: u32 = 1;

/// Configuration for connecting to a single PCE organization.
#[derive(Debug, Clone)]
pub struct PceConfig {
    /// PCE host, optionally with `http://`/`https://` and a trailing path.
    pub host: String,
    pub port: u16,
    pub api_version: String,
    pub org_id: u32,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

impl PceConfig {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            api_version: DEFAULT_API_VERSION.into(),
            org_id: DEFAULT_ORG_ID,
            credentials,
            transport: TransportConfig::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_org_id(mut self, org_id: u32) -> Self {
        self.org_id = org_id;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// `{scheme}://{host}:{port}/api/{version}`
    pub fn base_url(&self) -> Result<Url, Error> {
        base_url(&self.host, self.port, &self.api_version)
    }
}

/// Normalize a user-supplied host into the API base URL.
///
/// Keeps an explicit `http`/`https` scheme, falls back to `https` for
/// anything else, and drops any path the caller included.
pub fn base_url(host: &str, port: u16, api_version: &str) -> Result<Url, Error> {
    let raw = host.trim();
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme @ ("http" | "https"), rest)) => (scheme, rest),
        Some((_, rest)) => ("https", rest),
        None => ("https", raw),
    };
    let authority = rest.split('/').next().unwrap_or_default();
    let hostname = authority.split(':').next().unwrap_or_default();
    if hostname.is_empty() {
        return Err(Error::Validation {
            field: "host".into(),
            reason: format!("no hostname in '{host}'"),
        });
    }

    Ok(Url::parse(&format!(
        "{scheme}://{hostname}:{port}/api/{api_version}"
    ))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url_for(host: &str) -> String {
        base_url(host, 443, "v2").unwrap().to_string()
    }

    #[test]
    fn keeps_explicit_http_scheme() {
        assert_eq!(url_for("http://my.pce.com"), "http://my.pce.com:443/api/v2");
    }

    #[test]
    fn unknown_scheme_becomes_https() {
        assert_eq!(url_for("ftp://my.pce.com"), "https://my.pce.com/api/v2");
    }

    #[test]
    fn scheme_prefix_in_hostname_is_not_a_scheme() {
        assert_eq!(
            url_for("httpslab.pce.com"),
            "https://httpslab.pce.com/api/v2"
        );
    }

    #[test]
    fn trailing_path_is_dropped() {
        assert_eq!(url_for("my.pce.com/api/v2"), "https://my.pce.com/api/v2");
    }

    #[test]
    fn config_port_overrides_host_port() {
        let config = PceConfig::new("pce.lab:9443", Credentials::api_key("k", "s")).with_port(8443);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://pce.lab:8443/api/v2"
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(base_url("https://", 443, "v2").is_err());
    }
}
