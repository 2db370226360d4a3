// REST API HTTP client
//
// Wraps `reqwest::Client` with server URL construction, status-code
// mapping and JSON decoding. Endpoint groups (devices, positions,
// commands, reports, geofences, session) are implemented as inherent
// methods in sibling modules to keep this one focused on transport.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest slice of an error body kept in error messages.
const BODY_PREVIEW: usize = 200;

/// Raw HTTP client for the tracking server's `/api` surface.
///
/// Cheap to clone (the inner `reqwest::Client` is reference counted), so
/// background tasks such as status polls take their own copy.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` using the given credentials.
    ///
    /// Password credentials get a cookie jar (the session cookie is set by
    /// [`login`](Self::login)); token credentials get a default
    /// `Authorization` header and need no login round trip.
    pub fn new(
        base_url: Url,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = match credentials {
            Credentials::Password { .. } => {
                let config = if transport.cookie_jar.is_some() {
                    transport.clone()
                } else {
                    transport.clone().with_cookie_jar()
                };
                config.build_client()?
            }
            Credentials::Token { token } => {
                let mut headers = HeaderMap::new();
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|e| Error::Authentication {
                        message: format!("invalid token header value: {e}"),
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                transport.build_client_with_headers(headers)?
            }
        };
        Ok(Self { http, base_url })
    }

    /// Wrap a pre-built `reqwest::Client` (caller manages auth).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET and decode a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        let resp = check_status(resp).await?;
        decode_json(resp).await
    }

    /// GET and return the body as text, without interpreting it.
    pub(crate) async fn get_text(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<String, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url} params={params:?} (text)");

        let resp = self.http.get(url).query(params).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.text().await?)
    }

    /// GET with extra request headers, returning the checked response so
    /// the caller can inspect headers before consuming the body.
    pub(crate) async fn get_response(
        &self,
        path: &str,
        params: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<reqwest::Response, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url} params={params:?} (raw)");

        let resp = self
            .http
            .get(url)
            .query(params)
            .headers(headers)
            .send()
            .await?;
        check_status(resp).await
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        let resp = check_status(resp).await?;
        decode_json(resp).await
    }

    /// POST a JSON body, ignoring whatever the server answers on success.
    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// POST a form-encoded body and decode a JSON response.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {url} (form)");

        let resp = self.http.post(url).form(form).send().await?;
        let resp = check_status(resp).await?;
        decode_json(resp).await
    }

    /// DELETE a resource.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// Map non-success statuses to typed errors, passing successful responses through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = preview(&body);

    Err(match status {
        reqwest::StatusCode::UNAUTHORIZED => Error::Authentication {
            message: if message.is_empty() {
                "session expired or invalid credentials".into()
            } else {
                message
            },
        },
        reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
        _ => Error::Http {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

/// First [`BODY_PREVIEW`] characters of a body, cut on a char boundary.
fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn api_url_joins_without_double_slashes() {
        let c = client("https://track.example.com/");
        assert_eq!(
            c.api_url("/devices").unwrap().as_str(),
            "https://track.example.com/api/devices"
        );
    }

    #[test]
    fn api_url_keeps_base_path_prefix() {
        let c = client("https://example.com/traccar");
        assert_eq!(
            c.api_url("reports/trips").unwrap().as_str(),
            "https://example.com/traccar/api/reports/trips"
        );
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "ü".repeat(300);
        assert_eq!(preview(&long).chars().count(), BODY_PREVIEW);
    }
}
