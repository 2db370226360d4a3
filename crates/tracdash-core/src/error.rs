// ── Core error types ──
//
// User-facing errors from tracdash-core. Consumers never see raw
// reqwest errors or JSON parse failures; the `From<tracdash_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::model::GeofenceId;
use crate::status::Capability;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Unexpected response from server: {message}")]
    UnexpectedResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Cannot get {capability} status: {reason}")]
    StatusUnavailable {
        capability: Capability,
        reason: String,
    },

    /// A multi-step write stopped halfway. The geofence exists on the
    /// server but is not linked to the device.
    #[error("Geofence {geofence_id} was created but could not be linked: {message}")]
    PartialFailure {
        geofence_id: GeofenceId,
        message: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// HTTP status behind this error, when it came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::AuthenticationFailed { .. } => Some(401),
            Self::PermissionDenied { .. } => Some(403),
            Self::NotFound { .. } | Self::DeviceNotFound { .. } => Some(404),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tracdash_api::Error> for CoreError {
    fn from(err: tracdash_api::Error) -> Self {
        match err {
            tracdash_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            tracdash_api::Error::Forbidden { message } => CoreError::PermissionDenied { message },
            tracdash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tracdash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tracdash_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tracdash_api::Error::Http { status: 404, message } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            tracdash_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            tracdash_api::Error::Deserialization { message, .. } => {
                CoreError::UnexpectedResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_statuses_map_to_domain_variants() {
        let err: CoreError = tracdash_api::Error::Http {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));

        let err: CoreError = tracdash_api::Error::Forbidden {
            message: "Manager access required".into(),
        }
        .into();
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn partial_failure_names_geofence() {
        let err = CoreError::PartialFailure {
            geofence_id: GeofenceId(77),
            message: "HTTP 500".into(),
        };
        assert!(err.to_string().contains("Geofence 77"));
    }
}
