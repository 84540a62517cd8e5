use thiserror::Error;

/// A single entry from a PCE error body.
///
/// The PCE reports failures as `[{"token": "...", "message": "..."}]`;
/// bulk endpoints embed the same shape in each per-item outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl std::fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.token, &self.message) {
            (Some(token), Some(message)) => write!(f, "{token}: {message}"),
            (Some(token), None) => write!(f, "{token}"),
            (None, Some(message)) => write!(f, "{message}"),
            (None, None) => write!(f, "unknown error"),
        }
    }
}

/// Top-level error type for the `pce-api` crate.
///
/// Two families: client-side errors raised before (or instead of) a request,
/// and API errors carrying the HTTP status of a non-2xx PCE response.
/// `pce` (the CLI) maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Client-side ─────────────────────────────────────────────────
    /// An href did not match the `/orgs/{n}/…/{collection}/{id}` shape.
    #[error("Invalid href '{href}': {reason}")]
    InvalidHref { href: String, reason: String },

    /// An argument or object field failed structural validation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A bulk request exceeded the per-request item cap.
    #[error("Bulk request of {size} items exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Operation not offered by the endpoint for this object kind.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS, proxy or client-builder setup error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// The PCE rejected the credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Any other non-2xx response from the PCE.
    #[error("PCE API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Vec<ApiErrorDetail>,
    },

    /// A required response header was absent.
    #[error("Response is missing the {0} header")]
    MissingHeader(&'static str),

    // ── Async jobs ──────────────────────────────────────────────────
    /// The async job reached the `failed` state.
    #[error("Async job failed: {message}")]
    AsyncJobFailed { message: String },

    /// The caller-configured poll cap was reached before the job finished.
    #[error("Async job still pending after {attempts} polls")]
    PollAttemptsExhausted { attempts: u32 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for errors produced by a non-2xx PCE response.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Authentication { .. })
    }

    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the referenced object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

/// Statuses the transport retries: throttling plus gateway/server failures.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reports_status() {
        let err = Error::Api {
            status: 404,
            message: "not found".into(),
            details: Vec::new(),
        };
        assert!(err.is_api_error());
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn client_errors_have_no_status() {
        let err = Error::BatchTooLarge { size: 1001, max: 1000 };
        assert!(!err.is_api_error());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "unavailable".into(),
            details: Vec::new(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn detail_display_joins_token_and_message() {
        let detail = ApiErrorDetail {
            token: Some("input_validation_error".into()),
            message: Some("Name must be unique".into()),
        };
        assert_eq!(detail.to_string(), "input_validation_error: Name must be unique");
    }
}
