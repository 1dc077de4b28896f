use thiserror::Error;

/// Top-level error type for the `gatectl-api` crate.
///
/// Covers every failure mode of the management API surface: transport,
/// non-success responses, and undecodable bodies. `gatectl-core` maps these
/// into fetch/persist failures of the edit protocol.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// Bearer token rejected (HTTP 401/403) or not encodable as a header.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Management API ──────────────────────────────────────────────
    /// Non-success response from the management API.
    #[error("Management API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the gateway answered that it has no editable local
    /// config (it is driven by xDS instead).
    pub fn is_local_config_unavailable(&self) -> bool {
        match self {
            Self::Api { message, .. } => message.contains("local config not setup"),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
