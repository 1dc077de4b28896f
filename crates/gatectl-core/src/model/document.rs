// ── Config document ──
//
// Root aggregate of one gateway configuration: port binds holding
// listeners holding routes, plus targets attached to listeners by name.
// Loading validates the tree and prunes target references to listeners
// that no longer exist; every prune is reported.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::route::{Route, RouteEntry, RouteKind, TcpRoute};
use super::route_id::RouteRef;
use super::target::Target;
use crate::error::EditError;

// ── Config ──────────────────────────────────────────────────────────

/// One complete configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub binds: Vec<Bind>,
    /// Legacy documents carry listeners at the top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<Vec<Listener>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,
    /// Fields this model does not own (`workloads`, `services`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Target references dropped while loading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub pruned: Vec<PrunedReference>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.pruned.is_empty()
    }
}

/// A target's reference to a listener that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedReference {
    pub target: String,
    pub listener: String,
}

impl fmt::Display for PrunedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target '{}' referenced missing listener '{}'",
            self.target, self.listener
        )
    }
}

impl Config {
    // ── Loading / saving ─────────────────────────────────────────────

    /// Parse raw JSON text into a validated, pruned document.
    pub fn from_json(text: &str) -> Result<(Self, LoadReport), EditError> {
        let value: Value = serde_json::from_str(text).map_err(|e| EditError::InvalidJson {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Build a validated, pruned document from an already-parsed value.
    pub fn from_value(value: Value) -> Result<(Self, LoadReport), EditError> {
        let mut config: Self =
            serde_json::from_value(value).map_err(|e| EditError::validation(e.to_string()))?;
        config.validate()?;
        let pruned = config.prune_dangling_targets();
        Ok((config, LoadReport { pruned }))
    }

    pub fn to_value(&self) -> Result<Value, EditError> {
        serde_json::to_value(self).map_err(|e| EditError::Serialization {
            message: e.to_string(),
        })
    }

    /// Two-space indented JSON, the format used for download and editing.
    pub fn to_json_pretty(&self) -> Result<String, EditError> {
        serde_json::to_string_pretty(self).map_err(|e| EditError::Serialization {
            message: e.to_string(),
        })
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Check the structural invariants every stored document must hold.
    pub fn validate(&self) -> Result<(), EditError> {
        let mut ports = HashSet::new();
        for bind in &self.binds {
            if bind.port == 0 {
                return Err(EditError::InvalidPort { port: 0 });
            }
            if !ports.insert(bind.port) {
                return Err(EditError::validation(format!(
                    "port {} is bound more than once",
                    bind.port
                )));
            }
            bind.validate()?;
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(EditError::validation("target name must not be empty"));
            }
            if !names.insert(target.name.as_str()) {
                return Err(EditError::DuplicateTargetName {
                    name: target.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Drop target references to listeners that do not exist.
    pub fn prune_dangling_targets(&mut self) -> Vec<PrunedReference> {
        let known: HashSet<String> = self.listener_names().map(str::to_owned).collect();
        let mut pruned = Vec::new();

        for target in &mut self.targets {
            let Some(listeners) = target.listeners.as_mut() else {
                continue;
            };
            listeners.retain(|name| {
                let keep = known.contains(name);
                if !keep {
                    pruned.push(PrunedReference {
                        target: target.name.clone(),
                        listener: name.clone(),
                    });
                }
                keep
            });
        }

        for p in &pruned {
            warn!(target_name = %p.target, listener = %p.listener, "pruned dangling target reference");
        }
        pruned
    }

    // ── Read projections ─────────────────────────────────────────────

    pub fn bind(&self, port: u16) -> Option<&Bind> {
        self.binds.iter().find(|b| b.port == port)
    }

    /// Every bound listener with its port.
    pub fn listeners(&self) -> impl Iterator<Item = (u16, &Listener)> {
        self.binds
            .iter()
            .flat_map(|b| b.listeners.iter().map(move |l| (b.port, l)))
    }

    /// Names of all listeners, bound and legacy top-level.
    pub fn listener_names(&self) -> impl Iterator<Item = &str> {
        self.listeners()
            .map(|(_, l)| l.name.as_str())
            .chain(self.listeners.iter().flatten().map(|l| l.name.as_str()))
    }

    pub fn has_listener_named(&self, name: &str) -> bool {
        self.listener_names().any(|n| n == name)
    }

    pub fn find_listener(&self, port: u16, name: &str) -> Result<&Listener, EditError> {
        self.bind(port)
            .and_then(|b| b.listener(name))
            .ok_or_else(|| EditError::ListenerNotFound {
                port,
                name: name.to_owned(),
            })
    }

    pub(crate) fn find_listener_mut(
        &mut self,
        port: u16,
        name: &str,
    ) -> Result<&mut Listener, EditError> {
        self.binds
            .iter_mut()
            .find(|b| b.port == port)
            .and_then(|b| b.listeners.iter_mut().find(|l| l.name == name))
            .ok_or_else(|| EditError::ListenerNotFound {
                port,
                name: name.to_owned(),
            })
    }

    pub fn find_route(&self, at: &RouteLocator) -> Result<&Route, EditError> {
        self.find_entry::<Route>(at)
    }

    pub fn find_tcp_route(&self, at: &RouteLocator) -> Result<&TcpRoute, EditError> {
        self.find_entry::<TcpRoute>(at)
    }

    pub(crate) fn find_entry<T: RouteEntry + ListenerRoutes>(
        &self,
        at: &RouteLocator,
    ) -> Result<&T, EditError> {
        let listener = self.find_listener(at.port, &at.listener)?;
        let routes = T::array(listener).map_or(&[][..], Vec::as_slice);
        let index = at.resolve(routes)?;
        routes.get(index).ok_or_else(|| at.not_found(routes.len()))
    }

    /// Whether a locator still points at a route of its kind.
    pub fn resolves(&self, at: &RouteLocator) -> bool {
        match at.kind {
            RouteKind::Http => self.find_route(at).is_ok(),
            RouteKind::Tcp => self.find_tcp_route(at).is_ok(),
        }
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    // ── Route identity ───────────────────────────────────────────────

    /// Adopt route ids from `previous` for routes whose content is
    /// unchanged, matching within the same port and listener. Each
    /// previous id is used at most once.
    pub fn carry_route_ids(&mut self, previous: &Self) {
        for bind in &mut self.binds {
            for listener in &mut bind.listeners {
                let Ok(old) = previous.find_listener(bind.port, &listener.name) else {
                    continue;
                };
                carry_ids(listener.routes.as_mut(), old.routes.as_deref());
                carry_ids(listener.tcp_routes.as_mut(), old.tcp_routes.as_deref());
            }
        }
    }
}

fn carry_ids<T: RouteEntry>(current: Option<&mut Vec<T>>, previous: Option<&[T]>) {
    let (Some(current), Some(previous)) = (current, previous) else {
        return;
    };
    let mut claimed = vec![false; previous.len()];
    for route in current.iter_mut() {
        let found = previous
            .iter()
            .enumerate()
            .find(|(i, old)| !claimed[*i] && **old == *route);
        if let Some((i, old)) = found {
            claimed[i] = true;
            route.set_id(old.id());
        }
    }
}

// ── Bind ────────────────────────────────────────────────────────────

/// A port binding owning one or more listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bind {
    pub port: u16,
    #[serde(default)]
    pub listeners: Vec<Listener>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bind {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listeners: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn listener(&self, name: &str) -> Option<&Listener> {
        self.listeners.iter().find(|l| l.name == name)
    }

    fn validate(&self) -> Result<(), EditError> {
        let mut names = HashSet::new();
        for listener in &self.listeners {
            if listener.name.trim().is_empty() {
                return Err(EditError::validation(format!(
                    "listener on port {} has an empty name",
                    self.port
                )));
            }
            if !names.insert(listener.name.as_str()) {
                return Err(EditError::DuplicateListenerName {
                    port: self.port,
                    name: listener.name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ── Listener ────────────────────────────────────────────────────────

/// Listener protocols understood by the gateway.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Protocol {
    #[default]
    Http,
    Https,
    Tls,
    Tcp,
    Hbone,
    Mcp,
    A2a,
}

impl Protocol {
    /// TCP-class listeners take `tcpRoutes`; everything else takes `routes`.
    pub fn route_kind(self) -> RouteKind {
        match self {
            Self::Tcp | Self::Tls => RouteKind::Tcp,
            _ => RouteKind::Http,
        }
    }
}

/// A named protocol endpoint under a bind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    #[serde(default)]
    pub name: String,
    /// Absent on the wire means HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_routes: Option<Vec<TcpRoute>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listener {
    pub fn new(name: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            protocol: Some(protocol),
            ..Self::default()
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol.unwrap_or_default()
    }

    pub fn is_tcp_listener(&self) -> bool {
        self.protocol().route_kind() == RouteKind::Tcp
    }

    pub fn route_kind(&self) -> RouteKind {
        self.protocol().route_kind()
    }

    pub fn route_count(&self) -> usize {
        self.routes.as_ref().map_or(0, Vec::len) + self.tcp_routes.as_ref().map_or(0, Vec::len)
    }
}

/// Maps a route type to the listener array that holds it.
pub trait ListenerRoutes: Sized {
    fn array(listener: &Listener) -> Option<&Vec<Self>>;
    fn array_mut(listener: &mut Listener) -> &mut Option<Vec<Self>>;
}

impl ListenerRoutes for Route {
    fn array(listener: &Listener) -> Option<&Vec<Self>> {
        listener.routes.as_ref()
    }
    fn array_mut(listener: &mut Listener) -> &mut Option<Vec<Self>> {
        &mut listener.routes
    }
}

impl ListenerRoutes for TcpRoute {
    fn array(listener: &Listener) -> Option<&Vec<Self>> {
        listener.tcp_routes.as_ref()
    }
    fn array_mut(listener: &mut Listener) -> &mut Option<Vec<Self>> {
        &mut listener.tcp_routes
    }
}

// ── RouteLocator ────────────────────────────────────────────────────

/// Addresses one route: bind port, listener name, array, and position
/// or id within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLocator {
    pub port: u16,
    pub listener: String,
    pub kind: RouteKind,
    pub route: RouteRef,
}

impl RouteLocator {
    pub fn http(port: u16, listener: impl Into<String>, route: RouteRef) -> Self {
        Self {
            port,
            listener: listener.into(),
            kind: RouteKind::Http,
            route,
        }
    }

    pub fn tcp(port: u16, listener: impl Into<String>, route: RouteRef) -> Self {
        Self {
            port,
            listener: listener.into(),
            kind: RouteKind::Tcp,
            route,
        }
    }

    /// Position of the addressed route in `routes`.
    pub(crate) fn resolve<T: RouteEntry>(&self, routes: &[T]) -> Result<usize, EditError> {
        match self.route {
            RouteRef::Index(i) if i < routes.len() => Ok(i),
            RouteRef::Index(_) => Err(self.not_found(routes.len())),
            RouteRef::Id(id) => routes
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| self.not_found(routes.len())),
        }
    }

    fn not_found(&self, len: usize) -> EditError {
        match self.route {
            RouteRef::Index(index) => EditError::IndexOutOfRange {
                what: "route",
                index,
                len,
            },
            RouteRef::Id(id) => EditError::RouteNotFound {
                listener: self.listener.clone(),
                route: id.to_string(),
            },
        }
    }
}

impl fmt::Display for RouteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{} route {}",
            self.port, self.listener, self.kind, self.route
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::RouteId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "binds": [{
                "port": 8080,
                "listeners": [{
                    "name": "default",
                    "protocol": "HTTP",
                    "routes": [
                        { "name": "a", "hostnames": ["*"], "backends": [{ "host": "a:80" }] },
                        { "name": "b", "matches": [{ "path": { "pathPrefix": "/b" } }] }
                    ],
                    "gatewayName": "gw"
                }]
            }],
            "targets": [
                { "name": "t1", "listeners": ["default", "ghost"], "stdio": { "cmd": "npx" } }
            ],
            "workloads": [],
            "config": { "adminAddr": "localhost:15000" }
        })
    }

    #[test]
    fn round_trip_is_byte_stable() {
        let (config, _) = Config::from_value(sample()).unwrap();
        let first = config.to_json_pretty().unwrap();
        let (again, report) = Config::from_json(&first).unwrap();
        assert!(report.is_clean());
        assert_eq!(again, config);
        assert_eq!(again.to_json_pretty().unwrap(), first);
    }

    #[test]
    fn unknown_fields_survive() {
        let (config, _) = Config::from_value(sample()).unwrap();
        let out = config.to_value().unwrap();
        assert_eq!(out["workloads"], json!([]));
        assert_eq!(out["config"]["adminAddr"], "localhost:15000");
        assert_eq!(out["binds"][0]["listeners"][0]["gatewayName"], "gw");
    }

    #[test]
    fn dangling_target_listeners_are_pruned_and_reported() {
        let (config, report) = Config::from_value(sample()).unwrap();
        assert_eq!(
            config.targets[0].listeners,
            Some(vec!["default".to_owned()])
        );
        assert_eq!(
            report.pruned,
            vec![PrunedReference {
                target: "t1".into(),
                listener: "ghost".into(),
            }]
        );
    }

    #[test]
    fn duplicate_ports_are_rejected() {
        let doc = json!({ "binds": [
            { "port": 80, "listeners": [] },
            { "port": 80, "listeners": [] }
        ]});
        assert!(matches!(
            Config::from_value(doc),
            Err(EditError::Validation { .. })
        ));
    }

    #[test]
    fn port_zero_is_rejected() {
        let doc = json!({ "binds": [{ "port": 0, "listeners": [] }] });
        assert_eq!(
            Config::from_value(doc).unwrap_err(),
            EditError::InvalidPort { port: 0 }
        );
    }

    #[test]
    fn out_of_range_port_fails_to_parse() {
        let doc = json!({ "binds": [{ "port": 70000, "listeners": [] }] });
        assert!(Config::from_value(doc).is_err());
    }

    #[test]
    fn listener_names_must_be_unique_and_non_empty() {
        let dup = json!({ "binds": [{ "port": 80, "listeners": [
            { "name": "a" }, { "name": "a" }
        ]}]});
        assert!(matches!(
            Config::from_value(dup),
            Err(EditError::DuplicateListenerName { .. })
        ));

        let empty = json!({ "binds": [{ "port": 80, "listeners": [{ "name": "" }] }] });
        assert!(Config::from_value(empty).is_err());
    }

    #[test]
    fn invalid_json_is_reported_as_such() {
        assert!(matches!(
            Config::from_json(r#"{"a":1"#),
            Err(EditError::InvalidJson { .. })
        ));
    }

    #[test]
    fn legacy_top_level_listeners_count_as_known() {
        let doc = json!({
            "listeners": [{ "name": "sse" }],
            "targets": [{ "name": "t", "listeners": ["sse"], "sse": { "host": "h", "port": 1 } }]
        });
        let (config, report) = Config::from_value(doc).unwrap();
        assert!(report.is_clean());
        assert!(config.has_listener_named("sse"));
    }

    #[test]
    fn missing_protocol_means_http() {
        let l: Listener = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert_eq!(l.protocol(), Protocol::Http);
        assert!(!l.is_tcp_listener());
        assert!(Listener::new("t", Protocol::Tls).is_tcp_listener());
    }

    #[test]
    fn locators_resolve_by_index_and_id() {
        let (config, _) = Config::from_value(sample()).unwrap();
        let second = config.find_route(&RouteLocator::http(8080, "default", RouteRef::Index(1)));
        assert_eq!(second.unwrap().name.as_deref(), Some("b"));

        let id = config.binds[0].listeners[0].routes.as_ref().unwrap()[0].id;
        let by_id = config
            .find_route(&RouteLocator::http(8080, "default", RouteRef::Id(id)))
            .unwrap();
        assert_eq!(by_id.name.as_deref(), Some("a"));

        assert!(matches!(
            config.find_route(&RouteLocator::http(8080, "default", RouteRef::Index(5))),
            Err(EditError::IndexOutOfRange { index: 5, len: 2, .. })
        ));
        assert!(matches!(
            config.find_route(&RouteLocator::http(8080, "default", RouteRef::Id(RouteId::new()))),
            Err(EditError::RouteNotFound { .. })
        ));
        assert!(matches!(
            config.find_route(&RouteLocator::http(9090, "default", RouteRef::Index(0))),
            Err(EditError::ListenerNotFound { .. })
        ));
    }

    #[test]
    fn route_ids_follow_content_not_position() {
        let (before, _) = Config::from_value(sample()).unwrap();
        let routes = before.binds[0].listeners[0].routes.as_ref().unwrap();
        let (id_a, id_b) = (routes[0].id, routes[1].id);

        // A foreign edit removed route "a"; "b" shifted to index 0.
        let mut doc = sample();
        doc["binds"][0]["listeners"][0]["routes"]
            .as_array_mut()
            .unwrap()
            .remove(0);
        let (mut after, _) = Config::from_value(doc).unwrap();
        after.carry_route_ids(&before);

        let routes = after.binds[0].listeners[0].routes.as_ref().unwrap();
        assert_eq!(routes[0].id, id_b);
        assert!(
            after
                .find_route(&RouteLocator::http(8080, "default", RouteRef::Id(id_a)))
                .is_err()
        );
    }
}
