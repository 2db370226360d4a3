// Session and server endpoints
//
// Password auth opens a cookie session with a form POST; token auth is
// carried by the default `Authorization` header and only needs the GET.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiServer, ApiUser};

impl ApiClient {
    /// Open a cookie session.
    ///
    /// `POST /api/session` with form fields `email` and `password`.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<ApiUser, Error> {
        debug!(email, "opening session");
        self.post_form(
            "session",
            &[("email", email), ("password", password.expose_secret())],
        )
        .await
    }

    /// The user owning the current session.
    ///
    /// `GET /api/session`
    pub async fn current_user(&self) -> Result<ApiUser, Error> {
        self.get_json("session", &[]).await
    }

    /// Close the current session.
    ///
    /// `DELETE /api/session`
    pub async fn logout(&self) -> Result<(), Error> {
        self.delete("session").await
    }

    /// Server-wide settings and attributes.
    ///
    /// `GET /api/server`
    pub async fn server(&self) -> Result<ApiServer, Error> {
        self.get_json("server", &[]).await
    }
}
