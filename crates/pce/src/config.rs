//! CLI configuration: thin wrapper around `pce_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --api-key-id, etc.) on top of the selected profile.

use pce_api::{Credentials, PceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use pce_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Apply flag overrides to a profile (flag > env > profile).
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if global.org.is_some() {
        profile.org_id = global.org;
    }
    if global.api_key_id.is_some() {
        profile.api_key_id.clone_from(&global.api_key_id);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
}

/// Build the `PceConfig` for this invocation.
///
/// Returns the profile name alongside, for error messages.
pub fn build_pce_config(global: &GlobalOpts) -> Result<(String, PceConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None if global.host.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };
    apply_overrides(&mut profile, global);

    let credentials = match (&profile.api_key_id, &global.api_secret) {
        (Some(key_id), Some(secret)) => Credentials::api_key(key_id.clone(), secret.clone()),
        _ => pce_config::resolve_credentials(&profile, &profile_name)?,
    };
    let config = pce_config::build_pce_config(&profile, &profile_name, &cfg.defaults, credentials)?;
    Ok((profile_name, config))
}
