// ── Config document model ──
//
// Typed view of the gateway configuration document. Everything here is
// plain data plus lookups; mutations live in `crate::edit`.

pub mod document;
pub mod matching;
pub mod route;
pub mod route_id;
pub mod target;

pub use document::{
    Bind, Config, Listener, ListenerRoutes, LoadReport, Protocol, PrunedReference, RouteLocator,
};
pub use matching::{MatchInput, PathKind, build_match};
pub use route::{
    Backend, BackendKind, KeyMatch, Match, MethodMatch, PathMatch, PolicyBag, Route, RouteEntry,
    RouteKind, TcpRoute, ValueMatch,
};
pub use route_id::{RouteId, RouteRef};
pub use target::{Target, TargetKind};
