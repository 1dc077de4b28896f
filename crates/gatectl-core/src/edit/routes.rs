// ── Route, backend, and policy edits ──
//
// HTTP routes and TCP routes live in separate listener arrays. The
// helpers here are generic over `RouteEntry` and the public functions
// dispatch on `RouteLocator::kind`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EditError;
use crate::model::{
    Backend, Config, ListenerRoutes, Match, PolicyBag, Route, RouteEntry, RouteId, RouteKind,
    RouteLocator, RouteRef, TcpRoute,
};
use crate::policy::PolicyKind;

/// A new route of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteSpec {
    Http(Route),
    Tcp(TcpRoute),
}

impl RouteSpec {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Http(_) => RouteKind::Http,
            Self::Tcp(_) => RouteKind::Tcp,
        }
    }

    pub fn id(&self) -> RouteId {
        match self {
            Self::Http(r) => r.id,
            Self::Tcp(r) => r.id,
        }
    }
}

/// Replacement fields for an existing route.
///
/// Name, hostnames, and matches are always replaced; `matches: None`
/// leaves the key absent (the gateway's default match). Backends and
/// policies are carried over from the old route unless supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteUpdate {
    pub name: Option<String>,
    pub rule_name: Option<String>,
    pub hostnames: Vec<String>,
    pub matches: Option<Vec<Match>>,
    pub backends: Option<Vec<Backend>>,
    pub policies: Option<PolicyBag>,
}

// ── Checks ──────────────────────────────────────────────────────────

fn check_backend(route_kind: RouteKind, backend: &Backend) -> Result<(), EditError> {
    let Some(kind) = backend.kind() else {
        return Err(EditError::validation(
            "backend must be one of mcp, host, service, ai, dynamic",
        ));
    };
    if !kind.allowed_on(route_kind) {
        return Err(EditError::BackendNotApplicable {
            backend: kind.to_string(),
            route_kind,
        });
    }
    Ok(())
}

fn check_policies(route_kind: RouteKind, bag: &PolicyBag) -> Result<(), EditError> {
    for (name, value) in bag {
        PolicyKind::parse(name)?.check(route_kind, value)?;
    }
    Ok(())
}

// ── Generic plumbing ────────────────────────────────────────────────

/// Clone `config`, locate the route, and run `f` on it.
fn modify_route<T, F>(config: &Config, at: &RouteLocator, f: F) -> Result<Config, EditError>
where
    T: RouteEntry + ListenerRoutes,
    F: FnOnce(&mut T) -> Result<(), EditError>,
{
    let mut next = config.clone();
    let listener = next.find_listener_mut(at.port, &at.listener)?;
    let routes = T::array_mut(listener).get_or_insert_with(Vec::new);
    let index = at.resolve(routes.as_slice())?;
    f(&mut routes[index])?;
    Ok(next)
}

fn remove_entry<T: RouteEntry + ListenerRoutes>(config: &Config, at: &RouteLocator) -> Config {
    let mut next = config.clone();
    let Ok(listener) = next.find_listener_mut(at.port, &at.listener) else {
        debug!(%at, "delete: listener absent, nothing to do");
        return next;
    };
    let Some(routes) = T::array_mut(listener).as_mut() else {
        debug!(%at, "delete: no route array, nothing to do");
        return next;
    };
    match at.resolve(routes.as_slice()) {
        Ok(index) => {
            routes.remove(index);
        }
        Err(_) => debug!(%at, "delete: route already gone"),
    }
    next
}

fn update_entry<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    update: RouteUpdate,
    assign: impl FnOnce(&mut T, Option<String>, Option<String>, Vec<String>, Option<Vec<Match>>),
) -> Result<Config, EditError> {
    let RouteUpdate {
        name,
        rule_name,
        hostnames,
        matches,
        backends,
        policies,
    } = update;

    if let Some(backends) = &backends {
        for b in backends {
            check_backend(T::KIND, b)?;
        }
    }
    if let Some(bag) = &policies {
        check_policies(T::KIND, bag)?;
    }

    modify_route::<T, _>(config, at, |route| {
        assign(route, name, rule_name, hostnames, matches);
        if let Some(backends) = backends {
            *route.backends_mut() = backends;
        }
        if let Some(bag) = policies {
            *route.policies_mut() = (!bag.is_empty()).then_some(bag);
        }
        Ok(())
    })
}

// ── Routes ──────────────────────────────────────────────────────────

/// Append a route to the listener `listener` on `port`.
///
/// TCP-class listeners (TCP, TLS) only take TCP routes; every other
/// protocol only takes HTTP routes.
pub fn add_route(
    config: &Config,
    port: u16,
    listener: &str,
    route: RouteSpec,
) -> Result<Config, EditError> {
    let mut next = config.clone();
    let target = next.find_listener_mut(port, listener)?;
    let expected = target.route_kind();
    if route.kind() != expected {
        return Err(EditError::RouteKindMismatch {
            listener: listener.to_owned(),
            expected,
        });
    }

    match route {
        RouteSpec::Http(mut route) => {
            for b in &route.backends {
                check_backend(RouteKind::Http, b)?;
            }
            if let Some(bag) = &route.policies {
                check_policies(RouteKind::Http, bag)?;
            }
            route.policies = route.policies.take().filter(|bag| !bag.is_empty());
            target.routes.get_or_insert_with(Vec::new).push(route);
        }
        RouteSpec::Tcp(mut route) => {
            for b in &route.backends {
                check_backend(RouteKind::Tcp, b)?;
            }
            if let Some(bag) = &route.policies {
                check_policies(RouteKind::Tcp, bag)?;
            }
            route.policies = route.policies.take().filter(|bag| !bag.is_empty());
            target.tcp_routes.get_or_insert_with(Vec::new).push(route);
        }
    }
    Ok(next)
}

/// Replace the fields of the route at `at`. The route keeps its id.
pub fn update_route(
    config: &Config,
    at: &RouteLocator,
    update: RouteUpdate,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => update_entry::<Route>(
            config,
            at,
            update,
            |route, name, rule_name, hostnames, matches| {
                route.name = name;
                route.rule_name = rule_name;
                route.hostnames = hostnames;
                route.matches = matches;
            },
        ),
        RouteKind::Tcp => {
            if update.matches.is_some() {
                return Err(EditError::validation("TCP routes do not take matches"));
            }
            update_entry::<TcpRoute>(
                config,
                at,
                update,
                |route, name, rule_name, hostnames, _| {
                    route.name = name;
                    route.rule_name = rule_name;
                    route.hostnames = hostnames;
                },
            )
        }
    }
}

/// [`update_route`] on a listener's `tcpRoutes`.
pub fn update_tcp_route(
    config: &Config,
    port: u16,
    listener: &str,
    route: RouteRef,
    update: RouteUpdate,
) -> Result<Config, EditError> {
    update_route(config, &RouteLocator::tcp(port, listener, route), update)
}

/// Remove the route at `at`. A missing listener, missing array, or stale
/// locator leaves the document unchanged.
pub fn delete_route(config: &Config, at: &RouteLocator) -> Config {
    match at.kind {
        RouteKind::Http => remove_entry::<Route>(config, at),
        RouteKind::Tcp => remove_entry::<TcpRoute>(config, at),
    }
}

/// [`delete_route`] on a listener's `tcpRoutes`.
pub fn delete_tcp_route(config: &Config, port: u16, listener: &str, route: RouteRef) -> Config {
    delete_route(config, &RouteLocator::tcp(port, listener, route))
}

// ── Backends ────────────────────────────────────────────────────────

fn backend_at(len: usize, index: usize) -> Result<usize, EditError> {
    if index < len {
        Ok(index)
    } else {
        Err(EditError::IndexOutOfRange {
            what: "backend",
            index,
            len,
        })
    }
}

fn add_backend_in<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    backend: Backend,
) -> Result<Config, EditError> {
    check_backend(T::KIND, &backend)?;
    modify_route::<T, _>(config, at, |route| {
        route.backends_mut().push(backend);
        Ok(())
    })
}

fn update_backend_in<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    index: usize,
    backend: Backend,
) -> Result<Config, EditError> {
    check_backend(T::KIND, &backend)?;
    modify_route::<T, _>(config, at, |route| {
        let backends = route.backends_mut();
        let index = backend_at(backends.len(), index)?;
        backends[index] = backend;
        Ok(())
    })
}

fn remove_backend_in<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    index: usize,
) -> Result<Config, EditError> {
    modify_route::<T, _>(config, at, |route| {
        let backends = route.backends_mut();
        let index = backend_at(backends.len(), index)?;
        backends.remove(index);
        Ok(())
    })
}

/// Append a backend. TCP routes accept only `host` and `service`.
pub fn add_backend(
    config: &Config,
    at: &RouteLocator,
    backend: Backend,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => add_backend_in::<Route>(config, at, backend),
        RouteKind::Tcp => add_backend_in::<TcpRoute>(config, at, backend),
    }
}

pub fn update_backend(
    config: &Config,
    at: &RouteLocator,
    index: usize,
    backend: Backend,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => update_backend_in::<Route>(config, at, index, backend),
        RouteKind::Tcp => update_backend_in::<TcpRoute>(config, at, index, backend),
    }
}

pub fn remove_backend(
    config: &Config,
    at: &RouteLocator,
    index: usize,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => remove_backend_in::<Route>(config, at, index),
        RouteKind::Tcp => remove_backend_in::<TcpRoute>(config, at, index),
    }
}

// ── Policies ────────────────────────────────────────────────────────

fn set_policy_in<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    kind: PolicyKind,
    data: Value,
) -> Result<Config, EditError> {
    kind.check(T::KIND, &data)?;
    modify_route::<T, _>(config, at, |route| {
        route
            .policies_mut()
            .get_or_insert_with(Map::new)
            .insert(kind.to_string(), data);
        Ok(())
    })
}

fn delete_policy_in<T: RouteEntry + ListenerRoutes>(
    config: &Config,
    at: &RouteLocator,
    kind: PolicyKind,
) -> Result<Config, EditError> {
    modify_route::<T, _>(config, at, |route| {
        let slot = route.policies_mut();
        if let Some(bag) = slot.as_mut() {
            bag.shift_remove(kind.as_ref());
        }
        if slot.as_ref().is_some_and(Map::is_empty) {
            *slot = None;
        }
        Ok(())
    })
}

/// Set `policies[kind] = data`, creating the bag if absent.
pub fn set_policy(
    config: &Config,
    at: &RouteLocator,
    kind: PolicyKind,
    data: Value,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => set_policy_in::<Route>(config, at, kind, data),
        RouteKind::Tcp => set_policy_in::<TcpRoute>(config, at, kind, data),
    }
}

/// Remove `kind` from the route's bag; an emptied bag is removed too.
pub fn delete_policy(
    config: &Config,
    at: &RouteLocator,
    kind: PolicyKind,
) -> Result<Config, EditError> {
    match at.kind {
        RouteKind::Http => delete_policy_in::<Route>(config, at, kind),
        RouteKind::Tcp => delete_policy_in::<TcpRoute>(config, at, kind),
    }
}
