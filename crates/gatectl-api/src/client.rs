// Management API HTTP client
//
// Wraps `reqwest::Client` with base-URL handling and error-body decoding.
// The config document travels as a raw `serde_json::Value` so field order
// and unknown fields are untouched; `gatectl-core` owns the typed model.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in an error message.
const ERROR_PREVIEW_LEN: usize = 200;

/// Error payload shapes the gateway admin server produces: a bare JSON
/// string, or an object with `error` / `message`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Message(String),
    Object {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// Endpoint family for target CRUD. MCP-class and A2A-class targets are
/// managed under separate paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFamily {
    Mcp,
    A2a,
}

impl TargetFamily {
    fn segment(self) -> &'static str {
        match self {
            Self::Mcp => "mcp",
            Self::A2a => "a2a",
        }
    }
}

/// Raw HTTP client for the gateway management API.
///
/// Every write is a whole-resource write; there is no partial-patch
/// endpoint. Reads of `binds` / `listeners` are projections of the same
/// document the `config` endpoint returns.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the admin root (e.g. `http://localhost:15000`); a path
    /// prefix such as `/api` is kept.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers and TLS).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join relative path segments onto the base URL, percent-encoding each.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            parts.pop_if_empty();
            parts.extend(segments);
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /config`: the full configuration document.
    pub async fn get_config(&self) -> Result<Value, Error> {
        self.get(&["config"]).await
    }

    /// `POST /config`: replace the whole configuration document.
    pub async fn put_config(&self, document: &Value) -> Result<(), Error> {
        self.post_no_response(&["config"], document).await
    }

    /// `GET /binds`: read projection of the port bindings.
    pub async fn list_binds(&self) -> Result<Vec<Value>, Error> {
        self.get(&["binds"]).await
    }

    /// `GET /listeners`: read projection of every listener across binds.
    pub async fn list_listeners(&self) -> Result<Vec<Value>, Error> {
        self.get(&["listeners"]).await
    }

    /// `POST /binds/{port}/listeners`: create a listener, creating the bind
    /// if needed.
    pub async fn create_listener(&self, port: u16, listener: &Value) -> Result<(), Error> {
        let port = port.to_string();
        self.post_no_response(&["binds", &port, "listeners"], listener)
            .await
    }

    /// `POST /targets/{family}`
    pub async fn create_target(&self, family: TargetFamily, target: &Value) -> Result<(), Error> {
        self.post_no_response(&["targets", family.segment()], target)
            .await
    }

    /// `PUT /targets/{family}`
    pub async fn update_target(&self, family: TargetFamily, target: &Value) -> Result<(), Error> {
        let url = self.url(&["targets", family.segment()])?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(target).send().await?;
        Self::handle_empty(resp).await
    }

    /// `DELETE /targets/{family}/{name}`
    pub async fn delete_target(&self, family: TargetFamily, name: &str) -> Result<(), Error> {
        let url = self.url(&["targets", family.segment(), name])?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(segments)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::error_from(resp).await);
        }

        let body = resp.text().await?;
        trace!(bytes = body.len(), "response body received");
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..floor_char_boundary(&body, ERROR_PREVIEW_LEN)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(resp).await)
    }

    async fn error_from(resp: reqwest::Response) -> Error {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: format!("HTTP {status}"),
            };
        }

        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody::Message(m)) => m,
            Ok(ErrorBody::Object { error, message }) => error
                .or(message)
                .unwrap_or_else(|| status.to_string()),
            Err(_) if body.trim().is_empty() => status.to_string(),
            Err(_) => body[..floor_char_boundary(&body, ERROR_PREVIEW_LEN)].to_owned(),
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Largest index `<= max` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> GatewayClient {
        GatewayClient::with_client(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("http://localhost:15000");
        assert_eq!(c.base_url().as_str(), "http://localhost:15000/");
    }

    #[test]
    fn url_keeps_path_prefix() {
        let c = client("http://localhost:15000/api/");
        let url = c.url(&["config"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:15000/api/config");
    }

    #[test]
    fn url_encodes_target_names() {
        let c = client("http://localhost:15000");
        let url = c.url(&["targets", "mcp", "my target/1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:15000/targets/mcp/my%20target%2F1"
        );
    }

    #[test]
    fn char_boundary_never_splits_utf8() {
        let s = "aé";
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 10), s.len());
    }
}
