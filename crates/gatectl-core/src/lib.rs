//! Config document model and edit protocol between `gatectl-api` and the CLI.
//!
//! - **[`model`]**: typed view of the gateway configuration document
//!   (binds → listeners → routes / tcpRoutes → backends / policies, plus
//!   targets). Unknown fields round-trip untouched; routes carry an
//!   in-memory [`RouteId`] that survives re-fetches.
//!
//! - **[`edit`]**: pure structural edit operations. Each takes a document
//!   and returns a new one or a typed [`EditError`]; [`Edit`] wraps one
//!   operation as a value.
//!
//! - **[`Session`]**: the read-modify-write cycle. Fetches the
//!   authoritative document, applies one [`Edit`], writes the whole
//!   document back, and re-fetches to reconcile the last-known copy and
//!   the current [`Selection`].
//!
//! - **[`policy`]**: the registry of policy kinds with their default
//!   values and HTTP/TCP applicability.
//!
//! - **[`ModeCell`]**: observable local-vs-xDS gateway mode. Edits are
//!   refused in xDS mode.

pub mod config;
pub mod edit;
pub mod editor;
pub mod error;
pub mod mode;
pub mod model;
pub mod policy;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SessionConfig, TlsVerification, WriteMode};
pub use edit::{Edit, RouteSpec, RouteUpdate};
pub use editor::JsonEditor;
pub use error::{CoreError, EditError, FailureReason};
pub use mode::{GatewayMode, ModeCell};
pub use policy::{PolicyKind, PolicyShape};
pub use session::{EditOutcome, EditPhase, ListenerRef, Selection, Session};

pub use model::{
    Backend, BackendKind, Bind, Config, Listener, LoadReport, Match, MatchInput, PathKind,
    PathMatch, PolicyBag, Protocol, PrunedReference, Route, RouteId, RouteKind, RouteLocator,
    RouteRef, Target, TargetKind, TcpRoute, build_match,
};
