//! CLI error types with miette diagnostics.
//!
//! Maps `pce_api::Error` and `pce_config::ConfigError` into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use pce_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to PCE at {url}")]
    #[diagnostic(
        code(pce::connection_failed),
        help(
            "Check the PCE hostname and port, and any proxy settings.\n\
             Try: pce health -v"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(pce::tls_error),
        help(
            "Set ca_cert in your profile to trust a private CA,\n\
             or use --insecure (-k) for lab PCEs with self-signed certificates."
        )
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(pce::timeout),
        help("Increase the timeout with --timeout, or use --async for large collections.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(pce::auth_failed),
        help(
            "Verify the API key id and secret for profile '{profile}'.\n\
             Store a new secret with: pce config set-secret --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(pce::no_credentials),
        help(
            "Set api_key_id and api_secret_env in the profile,\n\
             or pass --api-key-id with PCE_API_SECRET in the environment."
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(pce::forbidden),
        help("The API key's role does not allow this operation in this org.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(
        code(pce::not_found),
        help("Check the href; list candidates with: pce get <kind>")
    )]
    NotFound { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("PCE returned HTTP {status}: {message}")]
    #[diagnostic(code(pce::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected PCE response: {message}")]
    #[diagnostic(code(pce::unexpected_response))]
    UnexpectedResponse { message: String },

    #[error("Async job failed: {message}")]
    #[diagnostic(code(pce::job_failed))]
    JobFailed { message: String },

    #[error("{operation}")]
    #[diagnostic(
        code(pce::unsupported),
        help("Run `pce kinds` to see which kinds accept bulk operations.")
    )]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pce::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(pce::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No PCE configured")]
    #[diagnostic(
        code(pce::no_config),
        help(
            "Add a profile to {path}\n\
             or pass --host and --api-key-id (with PCE_API_SECRET set)."
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(pce::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(pce::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── pce_api::Error → CliError ────────────────────────────────────────

impl From<pce_api::Error> for CliError {
    fn from(err: pce_api::Error) -> Self {
        use pce_api::Error as E;

        match err {
            E::Transport(e) if e.is_timeout() => Self::Timeout,
            E::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            E::Tls(message) => Self::TlsError { message },
            E::Authentication { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            E::Api {
                status: 403,
                message,
                ..
            } => Self::PermissionDenied { message },
            E::Api {
                status: 404,
                message,
                ..
            } => Self::NotFound { message },
            E::Api {
                status, message, ..
            } => Self::ApiError { status, message },
            E::InvalidHref { href, reason } => Self::Validation {
                field: "href".into(),
                reason: format!("{href}: {reason}"),
            },
            E::Validation { field, reason } => Self::Validation { field, reason },
            err @ E::BatchTooLarge { .. } => Self::Validation {
                field: "batch".into(),
                reason: err.to_string(),
            },
            E::UnsupportedOperation(operation) => Self::Unsupported { operation },
            E::AsyncJobFailed { message } => Self::JobFailed { message },
            err @ E::PollAttemptsExhausted { .. } => Self::JobFailed {
                message: err.to_string(),
            },
            err @ (E::InvalidUrl(_) | E::MissingHeader(_) | E::Deserialization { .. }) => {
                Self::UnexpectedResponse {
                    message: err.to_string(),
                }
            }
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile(name) => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        let not_found: CliError = pce_api::Error::Api {
            status: 404,
            message: "gone".into(),
            details: Vec::new(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let auth: CliError = pce_api::Error::Authentication {
            message: "bad key".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let batch: CliError = pce_api::Error::BatchTooLarge {
            size: 1001,
            max: 1000,
        }
        .into();
        assert_eq!(batch.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn missing_profile_is_a_usage_error() {
        let err: CliError = ConfigError::UnknownProfile("lab".into()).into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
