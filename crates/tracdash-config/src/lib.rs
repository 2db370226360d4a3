//! Shared configuration for the tracdash CLI and TUI.
//!
//! TOML profiles, credential resolution (env, keyring, plaintext) and
//! translation to [`tracdash_core::ConnectionConfig`]. The CLI layers
//! its flag overrides on top; the TUI uses profiles as they are.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tracdash_core::{AuthCredentials, ConnectionConfig, InferenceMode, TlsVerification};

/// Keyring service name for stored passwords and tokens.
pub const KEYRING_SERVICE: &str = "tracdash";

/// Environment variable consulted for the account password.
pub const PASSWORD_ENV: &str = "TRACDASH_PASSWORD";

/// Environment variable consulted for the API token.
pub const TOKEN_ENV: &str = "TRACDASH_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

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
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, listing the known names on failure.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Sorted, comma-separated profile names, or `(none)`.
    pub fn profile_names(&self) -> String {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        if names.is_empty() {
            return "(none)".into();
        }
        names.sort_unstable();
        names.join(", ")
    }

    /// The profile named by `requested`, else the configured default.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
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

/// How a profile signs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Email + password cookie session.
    #[default]
    Password,
    /// Bearer API token.
    Token,
}

/// A named server profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g. "https://track.example.com").
    pub url: String,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Account email for password auth.
    pub email: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// API token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the token.
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    /// How capability state is read from status bodies.
    #[serde(default)]
    pub inference: InferenceMode,

    /// Local preference overrides (`distanceUnit = "mi"`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<String, String>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Which secret a keyring entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Password,
    Token,
}

impl SecretKind {
    pub fn for_mode(mode: AuthMode) -> Self {
        match mode {
            AuthMode::Password => Self::Password,
            AuthMode::Token => Self::Token,
        }
    }

    fn keyring_user(self, profile_name: &str) -> String {
        match self {
            Self::Password => format!("{profile_name}/password"),
            Self::Token => format!("{profile_name}/token"),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tracdash", "tracdash").map_or_else(
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
    p.push("tracdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under
/// `TRACDASH_`-prefixed env vars (`TRACDASH_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRACDASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Store a password or token for `profile_name` in the system keyring.
pub fn store_secret(profile_name: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name))?;
    entry.set_password(secret)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, kind: SecretKind) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name)).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// First hit of: named env var, global env var, keyring, plaintext.
fn resolve_secret(
    profile_name: &str,
    kind: SecretKind,
    env_name: Option<&str>,
    global_env: &str,
    plaintext: Option<&String>,
) -> Option<SecretString> {
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        debug!(profile = profile_name, "secret from profile env var");
        return Some(SecretString::from(val));
    }
    if let Ok(val) = std::env::var(global_env) {
        debug!(profile = profile_name, env = global_env, "secret from env");
        return Some(SecretString::from(val));
    }
    if let Some(secret) = keyring_secret(profile_name, kind) {
        debug!(profile = profile_name, "secret from keyring");
        return Some(secret);
    }
    plaintext.map(|val| SecretString::from(val.clone()))
}

/// Resolve the API token for a token profile.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile_name,
        SecretKind::Token,
        profile.token_env.as_deref(),
        TOKEN_ENV,
        profile.token.as_ref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve email + password for a password profile.
pub fn resolve_password_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("TRACDASH_EMAIL").ok())
        .ok_or_else(no_credentials)?;
    let password = resolve_secret(
        profile_name,
        SecretKind::Password,
        profile.password_env.as_deref(),
        PASSWORD_ENV,
        profile.password.as_ref(),
    )
    .ok_or_else(no_credentials)?;
    Ok((email, password))
}

/// Resolve `AuthCredentials` from a profile's `auth_mode`.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode {
        AuthMode::Password => {
            let (email, password) = resolve_password_credentials(profile, profile_name)?;
            Ok(AuthCredentials::Password { email, password })
        }
        AuthMode::Token => resolve_token(profile, profile_name).map(AuthCredentials::Token),
    }
}

/// Parse a profile URL, requiring an http(s) scheme.
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// TLS mode for a profile: `insecure` wins over a custom CA.
pub fn tls_for(profile: &Profile, insecure_override: bool) -> TlsVerification {
    if insecure_override || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ConnectionConfig` from a profile, with no flag overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let auth = resolve_auth(profile, profile_name)?;

    let mut config = ConnectionConfig::new(url, auth);
    config.tls = tls_for(profile, defaults.insecure);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.inference = profile.inference;
    config.preferences.clone_from(&profile.preferences);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "fleet"

[defaults]
timeout = 45

[profiles.fleet]
url = "https://track.example.com"
auth_mode = "token"
token = "plain-token"
inference = "structured"

[profiles.fleet.preferences]
distanceUnit = "mi"

[profiles.home]
url = "http://10.0.0.5:8082"
email = "me@example.com"
password = "hunter2"
insecure = true
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_over_defaults() {
        let cfg = sample();
        assert_eq!(cfg.default_profile.as_deref(), Some("fleet"));
        assert_eq!(cfg.defaults.timeout, 45);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.profile_names(), "fleet, home");

        let fleet = cfg.profile("fleet").unwrap();
        assert_eq!(fleet.auth_mode, AuthMode::Token);
        assert_eq!(fleet.inference, InferenceMode::Structured);
        assert_eq!(fleet.preferences.get("distanceUnit").map(String::as_str), Some("mi"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.active_profile_name(None), "default");
        assert_eq!(cfg.active_profile_name(Some("x")), "x");
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = sample();
        match cfg.profile("nope") {
            Err(ConfigError::ProfileNotFound { available, .. }) => {
                assert_eq!(available, "fleet, home");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = sample();
        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn token_profile_builds_connection() {
        let cfg = sample();
        let profile = cfg.profile("fleet").unwrap();
        let conn =
            profile_to_connection_config(profile, "tracdash-test-fleet", &cfg.defaults).unwrap();

        assert_eq!(conn.url.as_str(), "https://track.example.com/");
        assert_eq!(conn.timeout, Duration::from_secs(45));
        assert_eq!(conn.tls, TlsVerification::SystemDefaults);
        assert_eq!(conn.inference, InferenceMode::Structured);
        assert!(matches!(conn.auth, AuthCredentials::Token(_)));
    }

    #[test]
    fn password_profile_is_insecure() {
        let cfg = sample();
        let profile = cfg.profile("home").unwrap();
        let conn =
            profile_to_connection_config(profile, "tracdash-test-home", &cfg.defaults).unwrap();

        assert_eq!(conn.tls, TlsVerification::DangerAcceptInvalid);
        match conn.auth {
            AuthCredentials::Password { email, password } => {
                assert_eq!(email, "me@example.com");
                assert!(!password.expose_secret().is_empty());
            }
            AuthCredentials::Token(_) => panic!("expected password auth"),
        }
    }

    #[test]
    fn custom_ca_used_when_not_insecure() {
        let profile = Profile {
            ca_cert: Some("/etc/ssl/track.pem".into()),
            ..Profile::new("https://track.example.com")
        };
        assert_eq!(
            tls_for(&profile, false),
            TlsVerification::CustomCa("/etc/ssl/track.pem".into())
        );
        assert_eq!(tls_for(&profile, true), TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(parse_url("ftp://track.example.com").is_err());
        assert!(parse_url("not a url").is_err());
        assert!(parse_url("http://localhost:8082").is_ok());
    }
}
