//! CLI configuration: a thin wrapper around `tracdash_config` that layers
//! `GlobalOpts` flag overrides (--url, --token, --email, ...) on top of
//! the active profile.

use std::time::Duration;

use secrecy::SecretString;

use tracdash_core::{AuthCredentials, ConnectionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tracdash_config::{
    AuthMode, Config, Profile, SecretKind, config_path, load_config_or_default, save_config,
    store_secret,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the connection for this invocation.
///
/// A matching profile supplies defaults that flags override. Without a
/// profile, `--url` plus `--token` (or `--email` and `TRACDASH_PASSWORD`)
/// must describe the connection on their own.
pub fn build_connection(global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: cfg.profile_names(),
        });
    }

    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let profile = Profile::new(url_str);
    resolve_profile(&profile, &profile_name, &cfg, global)
}

/// Translate a `Profile` + global flags into a `ConnectionConfig`.
///
/// Flag values take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    let url = tracdash_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    let auth = if let Some(ref token) = global.token {
        AuthCredentials::Token(SecretString::from(token.clone()))
    } else if let Some(ref email) = global.email {
        let overridden = Profile {
            email: Some(email.clone()),
            auth_mode: AuthMode::Password,
            ..profile.clone()
        };
        tracdash_config::resolve_auth(&overridden, profile_name)?
    } else {
        tracdash_config::resolve_auth(profile, profile_name)?
    };

    let tls = tracdash_config::tls_for(profile, global.insecure || cfg.defaults.insecure);
    if tls == TlsVerification::DangerAcceptInvalid {
        tracing::warn!("TLS certificate verification disabled");
    }

    // The flag defaults to 30; a profile timeout only applies when the
    // flag was left at that default.
    let timeout_secs = match (global.timeout, profile.timeout) {
        (30, Some(t)) => t,
        (flag, _) => flag,
    };

    let mut config = ConnectionConfig::new(url, auth);
    config.tls = tls;
    config.timeout = Duration::from_secs(timeout_secs);
    config.inference = profile.inference;
    config.preferences.clone_from(&profile.preferences);
    Ok(config)
}
