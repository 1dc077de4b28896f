// ── Routes, matches, and backends ──
//
// HTTP `Route` and raw `TcpRoute` share backends and a policy bag but
// live in separate listener arrays. Unknown fields are kept in `extra`
// so a load/edit/save cycle never drops data the model does not know.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::route_id::RouteId;

/// Map of policy-kind name to policy value. An empty bag is never stored.
pub type PolicyBag = Map<String, Value>;

/// Which listener array a route lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum RouteKind {
    Http,
    Tcp,
}

// ── Route ───────────────────────────────────────────────────────────

/// An HTTP match-and-forward rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(skip)]
    pub id: RouteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    /// Absent means the gateway's default match (`pathPrefix "/"`); an
    /// explicit `[]` matches nothing and is kept as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<Match>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<Backend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<PolicyBag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Content equality; the in-memory id is ignored.
impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rule_name == other.rule_name
            && self.hostnames == other.hostnames
            && self.matches == other.matches
            && self.backends == other.backends
            && self.policies == other.policies
            && self.extra == other.extra
    }
}

// ── TcpRoute ────────────────────────────────────────────────────────

/// A raw TCP/TLS forwarding rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpRoute {
    #[serde(skip)]
    pub id: RouteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<Backend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<PolicyBag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for TcpRoute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rule_name == other.rule_name
            && self.hostnames == other.hostnames
            && self.backends == other.backends
            && self.policies == other.policies
            && self.extra == other.extra
    }
}

// ── Shared route access ─────────────────────────────────────────────

/// Common surface of `Route` and `TcpRoute`, used by the edit layer to
/// treat both arrays uniformly.
pub trait RouteEntry: Clone + PartialEq {
    const KIND: RouteKind;

    fn id(&self) -> RouteId;
    fn set_id(&mut self, id: RouteId);
    fn label(&self) -> Option<&str>;
    fn backends(&self) -> &[Backend];
    fn backends_mut(&mut self) -> &mut Vec<Backend>;
    fn policies(&self) -> Option<&PolicyBag>;
    fn policies_mut(&mut self) -> &mut Option<PolicyBag>;
}

macro_rules! impl_route_entry {
    ($ty:ty, $kind:expr) => {
        impl RouteEntry for $ty {
            const KIND: RouteKind = $kind;

            fn id(&self) -> RouteId {
                self.id
            }
            fn set_id(&mut self, id: RouteId) {
                self.id = id;
            }
            fn label(&self) -> Option<&str> {
                self.name.as_deref().or(self.rule_name.as_deref())
            }
            fn backends(&self) -> &[Backend] {
                &self.backends
            }
            fn backends_mut(&mut self) -> &mut Vec<Backend> {
                &mut self.backends
            }
            fn policies(&self) -> Option<&PolicyBag> {
                self.policies.as_ref()
            }
            fn policies_mut(&mut self) -> &mut Option<PolicyBag> {
                &mut self.policies
            }
        }
    };
}

impl_route_entry!(Route, RouteKind::Http);
impl_route_entry!(TcpRoute, RouteKind::Tcp);

// ── Match ───────────────────────────────────────────────────────────

/// One request predicate set. All present parts must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<KeyMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<KeyMatch>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"exact": ..}`, `{"pathPrefix": ..}` or `{"regex": [pattern, 0]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathMatch {
    Exact(String),
    PathPrefix(String),
    Regex(String, usize),
}

impl PathMatch {
    pub fn value(&self) -> &str {
        match self {
            Self::Exact(v) | Self::PathPrefix(v) | Self::Regex(v, _) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMatch {
    pub method: String,
}

/// A named header or query-parameter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMatch {
    pub name: String,
    pub value: ValueMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMatch {
    Exact(String),
    Regex(String),
}

// ── Backend ─────────────────────────────────────────────────────────

/// Backend variants, told apart by which key is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Mcp,
    Host,
    Service,
    Ai,
    Dynamic,
}

impl BackendKind {
    const ALL: [Self; 5] = [Self::Mcp, Self::Host, Self::Service, Self::Ai, Self::Dynamic];

    /// TCP routes can only forward to plain addresses.
    pub fn allowed_on(self, route_kind: RouteKind) -> bool {
        match route_kind {
            RouteKind::Http => true,
            RouteKind::Tcp => matches!(self, Self::Host | Self::Service),
        }
    }
}

/// A forwarding destination plus optional load-balancing weight.
///
/// HTTP routes flatten the destination (`{"host": .., "weight": 1}`); TCP
/// routes nest it (`{"backend": {"host": ..}, "weight": 1}`). Both shapes
/// are kept verbatim in `body`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Backend {
    /// Build a backend of a given kind from its payload.
    pub fn new(kind: BackendKind, payload: Value) -> Self {
        let mut body = Map::new();
        body.insert(kind.as_ref().to_owned(), payload);
        Self { weight: None, body }
    }

    /// Build a backend in the shape a route of `route_kind` stores it.
    pub fn for_route(route_kind: RouteKind, kind: BackendKind, payload: Value) -> Self {
        match route_kind {
            RouteKind::Http => Self::new(kind, payload),
            RouteKind::Tcp => {
                let inner = Self::new(kind, payload).body;
                let mut body = Map::new();
                body.insert("backend".to_owned(), Value::Object(inner));
                Self { weight: None, body }
            }
        }
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// The destination object, looking through the TCP `backend` wrapper.
    fn destination(&self) -> &Map<String, Value> {
        match self.body.get("backend") {
            Some(Value::Object(inner)) => inner,
            _ => &self.body,
        }
    }

    /// Which kind of destination this is, if recognizable.
    pub fn kind(&self) -> Option<BackendKind> {
        let dest = self.destination();
        BackendKind::ALL
            .into_iter()
            .find(|k| dest.contains_key(k.as_ref()))
    }

    /// Short human-readable form for tables.
    pub fn summary(&self) -> String {
        let dest = self.destination();
        let Some(kind) = self.kind() else {
            return "<unknown>".into();
        };
        let detail = match dest.get(kind.as_ref()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(o)) => match (o.get("name"), o.get("port")) {
                (Some(Value::String(n)), Some(p)) => format!("{n}:{p}"),
                (Some(Value::String(n)), None) => n.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        };
        if detail.is_empty() {
            kind.to_string()
        } else {
            format!("{kind}={detail}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_equality_ignores_id() {
        let a = Route {
            hostnames: vec!["*".into()],
            ..Route::default()
        };
        let mut b = a.clone();
        b.id = RouteId::new();
        assert_eq!(a, b);
    }

    #[test]
    fn absent_matches_are_not_written() {
        let route = Route::default();
        assert_eq!(serde_json::to_value(&route).unwrap(), json!({}));
    }

    #[test]
    fn explicit_empty_matches_survive_round_trip() {
        let raw = json!({ "name": "blackhole", "matches": [], "backends": [{ "host": "a:80" }] });
        let route: Route = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(route.matches, Some(Vec::new()));
        assert_eq!(serde_json::to_value(&route).unwrap(), raw);
    }

    #[test]
    fn path_match_wire_shapes() {
        let m = Match {
            path: Some(PathMatch::Regex("/api/.+".into(), 0)),
            ..Match::default()
        };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({ "path": { "regex": ["/api/.+", 0] } })
        );
        let back: Match = serde_json::from_value(json!({ "path": { "pathPrefix": "/" } })).unwrap();
        assert_eq!(back.path, Some(PathMatch::PathPrefix("/".into())));
    }

    #[test]
    fn backend_kind_sees_through_tcp_wrapper() {
        let http: Backend = serde_json::from_value(json!({ "host": "a:80", "weight": 2 })).unwrap();
        assert_eq!(http.kind(), Some(BackendKind::Host));
        assert_eq!(http.weight, Some(2));
        assert_eq!(http.summary(), "host=a:80");

        let tcp: Backend =
            serde_json::from_value(json!({ "backend": { "service": { "name": "db", "port": 5432 } } }))
                .unwrap();
        assert_eq!(tcp.kind(), Some(BackendKind::Service));
        assert_eq!(tcp.summary(), "service=db:5432");
    }

    #[test]
    fn tcp_only_allows_plain_addresses() {
        assert!(BackendKind::Host.allowed_on(RouteKind::Tcp));
        assert!(!BackendKind::Mcp.allowed_on(RouteKind::Tcp));
        assert!(BackendKind::Ai.allowed_on(RouteKind::Http));
    }

    #[test]
    fn for_route_nests_tcp_destinations() {
        let tcp = Backend::for_route(RouteKind::Tcp, BackendKind::Host, json!("db:5432"))
            .with_weight(1);
        assert_eq!(
            serde_json::to_value(&tcp).unwrap(),
            json!({ "weight": 1, "backend": { "host": "db:5432" } })
        );
        assert_eq!(tcp.kind(), Some(BackendKind::Host));

        let http = Backend::for_route(RouteKind::Http, BackendKind::Host, json!("a:80"));
        assert_eq!(serde_json::to_value(&http).unwrap(), json!({ "host": "a:80" }));
    }
}
