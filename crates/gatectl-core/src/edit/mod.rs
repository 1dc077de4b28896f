// ── Structural edit operations ──
//
// Pure functions from a document to a new document. Inputs are never
// mutated, so a failed edit leaves the caller's copy intact. `Edit`
// packages one operation as a value the session can run against a
// freshly fetched document.

mod listeners;
mod routes;
mod targets;

pub use listeners::{add_listener, remove_listener, update_listener};
pub use routes::{
    RouteSpec, RouteUpdate, add_backend, add_route, delete_policy, delete_route, delete_tcp_route,
    remove_backend, set_policy, update_backend, update_route, update_tcp_route,
};
pub use targets::{add_target, delete_target, update_target};

use serde_json::Value;

use crate::error::EditError;
use crate::model::{Backend, Config, Listener, RouteLocator, Target};
use crate::policy::PolicyKind;

/// Replace the whole document with `replacement` after validating it.
///
/// Dangling target references are pruned, and route ids are carried
/// over from `current` for routes the replacement left untouched.
pub fn replace_document(current: &Config, replacement: Config) -> Result<Config, EditError> {
    replacement.validate()?;
    let mut next = replacement;
    next.prune_dangling_targets();
    next.carry_route_ids(current);
    Ok(next)
}

/// One structural edit, as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    // ── Listeners ────────────────────────────────────────────────────
    AddListener {
        port: u16,
        listener: Listener,
    },
    UpdateListener {
        port: u16,
        name: String,
        listener: Listener,
    },
    RemoveListener {
        port: u16,
        name: String,
    },

    // ── Routes ───────────────────────────────────────────────────────
    AddRoute {
        port: u16,
        listener: String,
        route: RouteSpec,
    },
    UpdateRoute {
        at: RouteLocator,
        update: RouteUpdate,
    },
    DeleteRoute {
        at: RouteLocator,
    },

    // ── Backends ─────────────────────────────────────────────────────
    AddBackend {
        at: RouteLocator,
        backend: Backend,
    },
    UpdateBackend {
        at: RouteLocator,
        index: usize,
        backend: Backend,
    },
    RemoveBackend {
        at: RouteLocator,
        index: usize,
    },

    // ── Policies ─────────────────────────────────────────────────────
    SetPolicy {
        at: RouteLocator,
        kind: PolicyKind,
        data: Value,
    },
    DeletePolicy {
        at: RouteLocator,
        kind: PolicyKind,
    },

    // ── Targets ──────────────────────────────────────────────────────
    AddTarget {
        target: Target,
    },
    UpdateTarget {
        target: Target,
    },
    DeleteTarget {
        name: String,
    },

    // ── Raw document ─────────────────────────────────────────────────
    ReplaceDocument {
        config: Box<Config>,
    },
}

impl Edit {
    /// Run this edit against `config`, producing the next document.
    pub fn apply(&self, config: &Config) -> Result<Config, EditError> {
        match self {
            Self::AddListener { port, listener } => add_listener(config, *port, listener.clone()),
            Self::UpdateListener {
                port,
                name,
                listener,
            } => update_listener(config, *port, name, listener.clone()),
            Self::RemoveListener { port, name } => remove_listener(config, *port, name),
            Self::AddRoute {
                port,
                listener,
                route,
            } => add_route(config, *port, listener, route.clone()),
            Self::UpdateRoute { at, update } => update_route(config, at, update.clone()),
            Self::DeleteRoute { at } => Ok(delete_route(config, at)),
            Self::AddBackend { at, backend } => add_backend(config, at, backend.clone()),
            Self::UpdateBackend { at, index, backend } => {
                update_backend(config, at, *index, backend.clone())
            }
            Self::RemoveBackend { at, index } => remove_backend(config, at, *index),
            Self::SetPolicy { at, kind, data } => set_policy(config, at, *kind, data.clone()),
            Self::DeletePolicy { at, kind } => delete_policy(config, at, *kind),
            Self::AddTarget { target } => add_target(config, target.clone()),
            Self::UpdateTarget { target } => update_target(config, target.clone()),
            Self::DeleteTarget { name } => delete_target(config, name),
            Self::ReplaceDocument { config: replacement } => {
                replace_document(config, replacement.as_ref().clone())
            }
        }
    }

    /// Short description for logs and confirmations.
    pub fn describe(&self) -> String {
        match self {
            Self::AddListener { port, listener } => {
                format!("add listener '{}' on port {port}", listener.name)
            }
            Self::UpdateListener { port, name, .. } => {
                format!("update listener '{name}' on port {port}")
            }
            Self::RemoveListener { port, name } => {
                format!("remove listener '{name}' from port {port}")
            }
            Self::AddRoute {
                port,
                listener,
                route,
            } => format!("add {} route to {port}:{listener}", route.kind()),
            Self::UpdateRoute { at, .. } => format!("update {at}"),
            Self::DeleteRoute { at } => format!("delete {at}"),
            Self::AddBackend { at, .. } => format!("add backend to {at}"),
            Self::UpdateBackend { at, index, .. } => format!("update backend #{index} of {at}"),
            Self::RemoveBackend { at, index } => format!("remove backend #{index} from {at}"),
            Self::SetPolicy { at, kind, .. } => format!("set {kind} policy on {at}"),
            Self::DeletePolicy { at, kind } => format!("delete {kind} policy from {at}"),
            Self::AddTarget { target } => format!("add {} target '{}'", target.kind, target.name),
            Self::UpdateTarget { target } => format!("update target '{}'", target.name),
            Self::DeleteTarget { name } => format!("delete target '{name}'"),
            Self::ReplaceDocument { .. } => "replace config document".into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Protocol, Route, RouteRef};
    use serde_json::json;

    #[test]
    fn edit_value_applies_like_the_function() {
        let config = Config::default();
        let edit = Edit::AddListener {
            port: 8080,
            listener: Listener::new("default", Protocol::Http),
        };
        assert_eq!(
            edit.apply(&config).unwrap(),
            add_listener(&config, 8080, Listener::new("default", Protocol::Http)).unwrap()
        );
        assert!(edit.describe().contains("default"));
    }

    #[test]
    fn replace_document_validates_and_keeps_ids() {
        let (current, _) = Config::from_value(json!({
            "binds": [{ "port": 80, "listeners": [{ "name": "l", "routes": [{ "name": "r" }] }] }]
        }))
        .unwrap();
        let id = current.binds[0].listeners[0].routes.as_ref().unwrap()[0].id;

        let mut replacement = current.clone();
        replacement.binds[0].listeners[0].routes.as_mut().unwrap()[0].id = Default::default();
        replacement.binds[0].listeners[0]
            .routes
            .as_mut()
            .unwrap()
            .push(Route::default());

        let next = replace_document(&current, replacement).unwrap();
        let at = RouteLocator::http(80, "l", RouteRef::Id(id));
        assert_eq!(next.find_route(&at).unwrap().name.as_deref(), Some("r"));

        let mut broken = current.clone();
        broken.binds.push(broken.binds[0].clone());
        assert!(replace_document(&current, broken).is_err());
    }
}
