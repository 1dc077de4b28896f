// ── Runtime session configuration ──
//
// These types describe *how* to reach one gateway's management API.
// They carry the token and connection tuning, but never touch disk.
// The CLI builds a `SessionConfig` from a profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use gatectl_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed admin endpoints).
    DangerAcceptInvalid,
}

/// How a session writes an edit back to the gateway.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WriteMode {
    /// Every edit replaces the whole document.
    #[default]
    Document,
    /// Listener creation and target CRUD go through their dedicated
    /// endpoints; everything else replaces the document.
    Endpoints,
}

/// Configuration for one gateway session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Management API root (e.g., `http://localhost:15000`).
    pub url: Url,
    /// Optional bearer token.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub write_mode: WriteMode,
}

impl SessionConfig {
    /// Defaults: system TLS, 30s timeout, whole-document writes.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            write_mode: WriteMode::default(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }
}
