use secrecy::SecretString;

/// Credentials for authenticating with a tracking server.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Cookie session opened by `POST /api/session` with form-encoded
    /// `email` + `password`. The `JSESSIONID` cookie lands in the client jar.
    Password { email: String, password: SecretString },

    /// Long-lived API token sent as `Authorization: Bearer <token>`.
    /// Generated from the user settings page on the server.
    Token { token: SecretString },
}

impl Credentials {
    /// Whether this strategy needs a cookie jar on the HTTP client.
    pub fn needs_cookie_jar(&self) -> bool {
        matches!(self, Self::Password { .. })
    }
}
