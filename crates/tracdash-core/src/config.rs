// ── Runtime connection configuration ──
//
// These types describe how to reach a tracking server and how the
// dashboard should behave once connected. They carry credential data
// and tuning but never touch disk: the CLI/TUI builds a
// `ConnectionConfig` from its profile and hands it in.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// How to authenticate with the server.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Cookie session opened with email + password.
    Password {
        email: String,
        password: SecretString,
    },
    /// Bearer API token.
    Token(SecretString),
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// How capability state is read out of the status and command bodies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InferenceMode {
    /// Substring match on the raw bodies (`"liveModetime":null`,
    /// `"type":"lightOn"`, `"type":"buzzerOn"`).
    #[default]
    Marker,
    /// Parse the bodies and inspect `attributes.liveModetime` and each
    /// command's `type`.
    Structured,
}

/// Configuration for one server connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server base URL (e.g. `https://track.example.com`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub inference: InferenceMode,
    /// Local preference overrides, consulted before user and server
    /// attributes.
    pub preferences: BTreeMap<String, String>,
}

impl ConnectionConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            inference: InferenceMode::default(),
            preferences: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inference_mode_parses_lowercase() {
        assert_eq!(
            "structured".parse::<InferenceMode>().unwrap(),
            InferenceMode::Structured
        );
        assert_eq!(InferenceMode::default().to_string(), "marker");
    }
}
