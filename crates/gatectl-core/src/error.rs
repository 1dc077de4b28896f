// ── Core error types ──
//
// `EditError` covers everything a structural edit can reject. It never
// involves the network. `CoreError` is what the session surfaces: the
// phase that failed plus a coarse reason, so front ends can pick an exit
// code or a message without looking at HTTP details.

use thiserror::Error;

use crate::model::RouteKind;
use crate::policy::{PolicyKind, PolicyShape};

/// Rejections from the document model and the structural edit operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    // ── Validation ───────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u32 },

    #[error("Failed to serialize config: {message}")]
    Serialization { message: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("Listener '{name}' not found on port {port}")]
    ListenerNotFound { port: u16, name: String },

    #[error("Route {route} not found on listener '{listener}'")]
    RouteNotFound { listener: String, route: String },

    #[error("{what} index {index} out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Target '{name}' not found")]
    TargetNotFound { name: String },

    #[error("Target '{target}' references unknown listener '{listener}'")]
    UnknownListener { target: String, listener: String },

    // ── Conflicts ────────────────────────────────────────────────────
    #[error("Listener '{name}' already exists on port {port}")]
    DuplicateListenerName { port: u16, name: String },

    #[error("Target '{name}' already exists")]
    DuplicateTargetName { name: String },

    #[error("Listener '{listener}' only accepts {expected} routes")]
    RouteKindMismatch {
        listener: String,
        expected: RouteKind,
    },

    #[error("Backend type '{backend}' cannot be used on {route_kind} routes")]
    BackendNotApplicable {
        backend: String,
        route_kind: RouteKind,
    },

    // ── Policies ─────────────────────────────────────────────────────
    #[error("Unknown policy kind '{name}'")]
    UnknownPolicyKind { name: String },

    #[error("Policy '{kind}' cannot be attached to {route_kind} routes")]
    PolicyNotApplicable {
        kind: PolicyKind,
        route_kind: RouteKind,
    },

    #[error("Policy '{kind}' expects a JSON {expected}")]
    InvalidPolicyValue {
        kind: PolicyKind,
        expected: PolicyShape,
    },
}

impl EditError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Lookup failures mean the caller's view of the document is stale.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::ListenerNotFound { .. }
                | Self::RouteNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::TargetNotFound { .. }
        )
    }
}

/// Coarse classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailureReason {
    Connection,
    Timeout,
    Authentication,
    NotFound,
    Rejected,
    Decode,
}

impl FailureReason {
    pub fn of(err: &gatectl_api::Error) -> Self {
        match err {
            gatectl_api::Error::Transport(e) if e.is_timeout() => Self::Timeout,
            gatectl_api::Error::Transport(_)
            | gatectl_api::Error::InvalidUrl(_)
            | gatectl_api::Error::Tls(_) => Self::Connection,
            gatectl_api::Error::Authentication { .. } => Self::Authentication,
            gatectl_api::Error::Api { status: 404, .. } => Self::NotFound,
            gatectl_api::Error::Api { .. } => Self::Rejected,
            gatectl_api::Error::Deserialization { .. } => Self::Decode,
        }
    }
}

/// Unified error type for the session layer.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Protocol phases ──────────────────────────────────────────────
    #[error("Failed to fetch config ({reason}): {message}")]
    Fetch {
        reason: FailureReason,
        message: String,
    },

    #[error("Failed to persist config ({reason}): {message}")]
    Persist {
        reason: FailureReason,
        message: String,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    // ── Session state ────────────────────────────────────────────────
    #[error("Another edit is already in progress")]
    EditInProgress,

    #[error("Edit cancelled")]
    Cancelled,

    #[error("Gateway is running in xDS mode; local config is read-only")]
    ReadOnly,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Map an API error raised while writing.
    pub fn persist(err: &gatectl_api::Error) -> Self {
        Self::Persist {
            reason: FailureReason::of(err),
            message: err.to_string(),
        }
    }

    /// The transport reason behind a fetch or persist failure.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Fetch { reason, .. } | Self::Persist { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

/// Reads are the default direction: anything not explicitly a write
/// surfaces as a fetch failure.
impl From<gatectl_api::Error> for CoreError {
    fn from(err: gatectl_api::Error) -> Self {
        Self::Fetch {
            reason: FailureReason::of(&err),
            message: err.to_string(),
        }
    }
}
