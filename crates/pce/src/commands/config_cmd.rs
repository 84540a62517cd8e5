//! Config subcommand handlers.

use std::io::BufRead;

use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretItem};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_secret.is_some() {
            profile.api_secret = Some(REDACTED.into());
        }
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

fn read_secret_line() -> Result<SecretString, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "no secret on stdin".into(),
        });
    }
    Ok(SecretString::from(secret.to_owned()))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, |c| {
                c.profiles.keys().cloned().collect::<Vec<_>>().join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured in {}", config::config_path().display());
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.host);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::success(&format!("Default profile set to '{name}'"), color)
                );
            }
            Ok(())
        }

        ConfigCommand::SetSecret { item } => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let key = match item {
                SecretItem::ApiSecret => "api-secret",
                SecretItem::Password => "password",
            };
            let secret = read_secret_line()?;
            pce_config::store_secret(&profile_name, key, &secret)?;
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::success(
                        &format!("Stored {key} for profile '{profile_name}' in the system keyring"),
                        color
                    )
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    #[test]
    fn show_masks_plaintext_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                host: "pce.lab".into(),
                api_key_id: Some("api_1".into()),
                api_secret: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                host: "pce.prod".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["lab"].api_secret.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["lab"].api_key_id.as_deref(), Some("api_1"));
        assert!(shown.profiles["prod"].password.is_none());
    }
}
