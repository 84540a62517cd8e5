//! Shared configuration for PCE tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `pce_api::PceConfig`. The CLI layers its flag
//! overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pce_api::{
    Credentials, DEFAULT_API_VERSION, DEFAULT_ORG_ID, DEFAULT_PORT, PceConfig, ProxyConfig,
    RetryPolicy, TlsMode, TransportConfig,
};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "pce";

/// Prefix for environment overrides, e.g. `PCE_DEFAULT_PROFILE`.
pub const ENV_PREFIX: &str = "PCE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named PCE profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name.to_owned(), p))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

/// A named PCE profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// PCE hostname, optionally with scheme (e.g. "pce.example.com").
    pub host: String,

    pub port: Option<u16>,
    pub org_id: Option<u32>,
    pub api_version: Option<String>,

    /// API key id (`api_...`). Selects API-key auth when set.
    pub api_key_id: Option<String>,

    /// API secret (plaintext; prefer keyring or env var).
    pub api_secret: Option<String>,

    /// Environment variable holding the API secret.
    pub api_secret_env: Option<String>,

    /// Username for login auth.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,
    pub timeout: Option<u64>,
    pub max_retries: Option<u32>,

    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "pce", "pce").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pce");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, overlaid with `PCE_*` environment variables.
///
/// Nested keys use a double underscore: `PCE_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, item: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{item}"),
    )?)
}

fn keyring_lookup(profile_name: &str, item: &str) -> Option<SecretString> {
    keyring_entry(profile_name, item)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

/// Store a secret in the OS keyring under `{profile}/{item}`.
pub fn store_secret(profile_name: &str, item: &str, secret: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, item)?.set_password(secret.expose_secret())?;
    Ok(())
}

/// API secret: named env var, then keyring, then plaintext.
pub fn resolve_api_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(secret) = keyring_lookup(profile_name, "api-secret") {
        return Ok(secret);
    }

    if let Some(ref secret) = profile.api_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Login password: `PCE_PASSWORD`, then keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Ok(pw) = std::env::var("PCE_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = keyring_lookup(profile_name, "password") {
        return Ok(pw);
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// API-key credentials when `api_key_id` is set, else username/password.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    if let Some(ref key_id) = profile.api_key_id {
        let secret = resolve_api_secret(profile, profile_name)?;
        return Ok(Credentials::ApiKey {
            key_id: key_id.clone(),
            secret,
        });
    }
    if let Some(ref username) = profile.username {
        let password = resolve_password(profile, profile_name)?;
        return Ok(Credentials::User {
            username: username.clone(),
            password,
        });
    }
    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Transport settings from a profile, falling back to `defaults`.
pub fn transport_for(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        proxy: ProxyConfig {
            http: profile.http_proxy.clone(),
            https: profile.https_proxy.clone(),
        },
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        retry: RetryPolicy {
            max_retries: profile.max_retries.unwrap_or(defaults.max_retries),
            ..RetryPolicy::default()
        },
    }
}

/// Build a `PceConfig` from a profile, resolving its credentials.
pub fn to_pce_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PceConfig, ConfigError> {
    check_host(profile, profile_name)?;
    let credentials = resolve_credentials(profile, profile_name)?;
    build_pce_config(profile, profile_name, defaults, credentials)
}

/// Build a `PceConfig` from a profile with credentials supplied by the caller.
pub fn build_pce_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    credentials: Credentials,
) -> Result<PceConfig, ConfigError> {
    check_host(profile, profile_name)?;
    let mut config = PceConfig::new(profile.host.trim(), credentials)
        .with_port(profile.port.unwrap_or(DEFAULT_PORT))
        .with_org_id(profile.org_id.unwrap_or(DEFAULT_ORG_ID))
        .with_transport(transport_for(profile, defaults));
    config.api_version = profile
        .api_version
        .clone()
        .unwrap_or_else(|| DEFAULT_API_VERSION.into());
    Ok(config)
}

fn check_host(profile: &Profile, profile_name: &str) -> Result<(), ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }
    Ok(())
}
