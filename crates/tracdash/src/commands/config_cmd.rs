//! Config subcommand handlers.

use dialoguer::{Input, Select};

use tracdash_core::InferenceMode;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, AuthMode, Config, Profile, SecretKind};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
        if profile.token.is_some() {
            profile.token = Some("********".into());
        }
    }
    cfg
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    if let Some(pref) = key.strip_prefix("pref.") {
        profile.preferences.insert(pref.to_owned(), value);
        return Ok(());
    }
    match key {
        "url" => {
            tracdash_config::parse_url(&value)?;
            profile.url = value;
        }
        "email" => profile.email = Some(value),
        "auth_mode" | "auth-mode" => {
            profile.auth_mode = match value.as_str() {
                "password" => AuthMode::Password,
                "token" => AuthMode::Token,
                _ => return Err(invalid("auth_mode", "must be 'password' or 'token'")),
            };
        }
        "password_env" | "password-env" => profile.password_env = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "insecure" => {
            profile.insecure = Some(
                value
                    .parse()
                    .map_err(|_| invalid("insecure", "must be 'true' or 'false'"))?,
            );
        }
        "timeout" => {
            profile.timeout = Some(
                value
                    .parse()
                    .map_err(|_| invalid("timeout", "must be a number (seconds)"))?,
            );
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "inference" => {
            profile.inference = value
                .parse::<InferenceMode>()
                .map_err(|_| invalid("inference", "must be 'marker' or 'structured'"))?;
        }
        other => {
            return Err(invalid(
                other,
                format!(
                    "unknown config key '{other}'. Valid keys: url, email, auth_mode, \
                     password_env, token_env, insecure, timeout, ca_cert, inference, pref.<name>"
                ),
            ));
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("tracdash configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Server URL")
                .default("http://localhost:8082".into())
                .interact_text()
                .map_err(prompt_err)?;
            tracdash_config::parse_url(&url)?;

            let auth_choices = &["Email and password", "API token"];
            let auth_mode = match Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => AuthMode::Password,
                _ => AuthMode::Token,
            };

            let email = if auth_mode == AuthMode::Password {
                let email: String = Input::new()
                    .with_prompt("Email")
                    .interact_text()
                    .map_err(prompt_err)?;
                Some(email)
            } else {
                None
            };

            let label = match auth_mode {
                AuthMode::Password => "Password: ",
                AuthMode::Token => "API token: ",
            };
            let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(invalid("secret", "value cannot be empty"));
            }

            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let in_keyring = Select::new()
                .with_prompt("Where to store it?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
                == 0;

            let mut profile = Profile {
                auth_mode,
                email,
                ..Profile::new(url)
            };
            if in_keyring {
                config::store_secret(&profile_name, SecretKind::for_mode(auth_mode), &secret)?;
                eprintln!("   Secret stored in system keyring");
            } else {
                match auth_mode {
                    AuthMode::Password => profile.password = Some(secret),
                    AuthMode::Token => profile.token = Some(secret),
                }
            }

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: tracdash devices list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |c| c.profile_names(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            eprintln!("Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: tracdash config init");
            } else {
                let mut names: Vec<&String> = cfg.profiles.keys().collect();
                names.sort_unstable();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.profile(&name)?;
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg.profile(&profile_name)?;

            let kind = SecretKind::for_mode(prof.auth_mode);
            let label = match kind {
                SecretKind::Password => "Password: ",
                SecretKind::Token => "API token: ",
            };
            let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(invalid("secret", "value cannot be empty"));
            }

            config::store_secret(&profile_name, kind, &secret)?;
            eprintln!("Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_keys_update_profile() {
        let mut profile = Profile::default();
        set_profile_key(&mut profile, "url", "https://track.example.com".into()).unwrap();
        set_profile_key(&mut profile, "auth-mode", "token".into()).unwrap();
        set_profile_key(&mut profile, "inference", "structured".into()).unwrap();
        set_profile_key(&mut profile, "pref.speedUnit", "kmh".into()).unwrap();

        assert_eq!(profile.url, "https://track.example.com");
        assert_eq!(profile.auth_mode, AuthMode::Token);
        assert_eq!(profile.inference, InferenceMode::Structured);
        assert_eq!(profile.preferences.get("speedUnit").map(String::as_str), Some("kmh"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut profile = Profile::default();
        assert!(set_profile_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut profile, "url", "ftp://x".into()).is_err());
        assert!(set_profile_key(&mut profile, "colour", "red".into()).is_err());
    }

    #[test]
    fn show_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                token: Some("abc".into()),
                ..Profile::new("http://localhost:8082")
            },
        );
        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["home"].token.as_deref(), Some("********"));
    }
}
