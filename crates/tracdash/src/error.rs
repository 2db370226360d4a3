//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tracdash_config::ConfigError;
use tracdash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}: {reason}")]
    #[diagnostic(
        code(tracdash::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(tracdash::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tracdash::auth_failed),
        help(
            "Verify the email and password or the API token.\n\
             Store a new secret with: tracdash config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tracdash::no_credentials),
        help(
            "Configure credentials with: tracdash config init\n\
             Or set TRACDASH_TOKEN, or TRACDASH_EMAIL and TRACDASH_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(code(tracdash::permission_denied))]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(tracdash::not_found),
        help("Run: tracdash {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server error: {message}")]
    #[diagnostic(code(tracdash::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Geofence {geofence_id} was created but not linked to the device")]
    #[diagnostic(
        code(tracdash::partial_failure),
        help("Link it from the geofence settings page or delete it: {reason}")
    )]
    PartialFailure { geofence_id: i64, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tracdash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tracdash::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tracdash config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(tracdash::no_config),
        help(
            "Create a profile with: tracdash config init\n\
             Or pass --url. Config file expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tracdash::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' was not confirmed")]
    #[diagnostic(
        code(tracdash::not_confirmed),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NotConfirmed { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::NotConfirmed { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::ApiError { status: Some(401), .. } => exit_code::AUTH,
            Self::ApiError { status: Some(403), .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::DeviceNotFound { identifier } => Self::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: "devices list".into(),
                resource_type: entity_type,
                identifier,
            },
            CoreError::PermissionDenied { message } => Self::PermissionDenied { message },
            CoreError::PartialFailure {
                geofence_id,
                message,
            } => Self::PartialFailure {
                geofence_id: geofence_id.0,
                reason: message,
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { message, status } => Self::ApiError { message, status },
            err @ (CoreError::UnexpectedResponse { .. } | CoreError::StatusUnavailable { .. }) => {
                Self::ApiError {
                    message: err.to_string(),
                    status: None,
                }
            }
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracdash_core::GeofenceId;

    #[test]
    fn exit_codes_follow_error_kind() {
        let not_found: CliError = CoreError::DeviceNotFound {
            identifier: "Van".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let partial: CliError = CoreError::PartialFailure {
            geofence_id: GeofenceId(77),
            message: "link failed".into(),
        }
        .into();
        assert_eq!(partial.exit_code(), exit_code::PARTIAL);

        let forbidden = CliError::ApiError {
            message: "no".into(),
            status: Some(403),
        };
        assert_eq!(forbidden.exit_code(), exit_code::PERMISSION);
        assert_eq!(forbidden.to_string(), "Server error: no");
    }
}
