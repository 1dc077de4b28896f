// ── Listener edits ──

use tracing::debug;

use crate::error::EditError;
use crate::model::{Bind, Config, Listener};

fn check_name(listener: &Listener) -> Result<(), EditError> {
    if listener.name.trim().is_empty() {
        return Err(EditError::validation("listener name must not be empty"));
    }
    Ok(())
}

/// Append `listener` to the bind on `port`, creating the bind if needed.
pub fn add_listener(config: &Config, port: u16, listener: Listener) -> Result<Config, EditError> {
    if port == 0 {
        return Err(EditError::InvalidPort { port: 0 });
    }
    check_name(&listener)?;

    let mut next = config.clone();
    if let Some(bind) = next.binds.iter_mut().find(|b| b.port == port) {
        if bind.listener(&listener.name).is_some() {
            return Err(EditError::DuplicateListenerName {
                port,
                name: listener.name,
            });
        }
        bind.listeners.push(listener);
    } else {
        debug!(port, "creating bind for new listener");
        let mut bind = Bind::new(port);
        bind.listeners.push(listener);
        next.binds.push(bind);
    }
    Ok(next)
}

/// Replace the listener `name` on `port`.
///
/// `routes` / `tcpRoutes` are carried over from the old listener unless
/// the replacement supplies them. A rename rewrites target references
/// when no other listener keeps the old name.
pub fn update_listener(
    config: &Config,
    port: u16,
    name: &str,
    mut listener: Listener,
) -> Result<Config, EditError> {
    check_name(&listener)?;

    let mut next = config.clone();
    let not_found = || EditError::ListenerNotFound {
        port,
        name: name.to_owned(),
    };
    let bind = next
        .binds
        .iter_mut()
        .find(|b| b.port == port)
        .ok_or_else(not_found)?;
    let pos = bind
        .listeners
        .iter()
        .position(|l| l.name == name)
        .ok_or_else(not_found)?;

    let renamed = listener.name != name;
    if renamed && bind.listener(&listener.name).is_some() {
        return Err(EditError::DuplicateListenerName {
            port,
            name: listener.name,
        });
    }

    let old = &bind.listeners[pos];
    if listener.routes.is_none() {
        listener.routes.clone_from(&old.routes);
    }
    if listener.tcp_routes.is_none() {
        listener.tcp_routes.clone_from(&old.tcp_routes);
    }
    let new_name = listener.name.clone();
    bind.listeners[pos] = listener;

    if renamed && !next.has_listener_named(name) {
        for target in &mut next.targets {
            for reference in target.listeners.iter_mut().flatten() {
                if *reference == name {
                    reference.clone_from(&new_name);
                }
            }
        }
    }
    Ok(next)
}

/// Remove the listener `name` from `port`. A bind left without listeners
/// is dropped, and target references to the name are pruned when no
/// other listener carries it.
pub fn remove_listener(config: &Config, port: u16, name: &str) -> Result<Config, EditError> {
    let mut next = config.clone();
    let not_found = || EditError::ListenerNotFound {
        port,
        name: name.to_owned(),
    };
    let bind_pos = next
        .binds
        .iter()
        .position(|b| b.port == port)
        .ok_or_else(not_found)?;
    let bind = &mut next.binds[bind_pos];
    let pos = bind
        .listeners
        .iter()
        .position(|l| l.name == name)
        .ok_or_else(not_found)?;

    bind.listeners.remove(pos);
    if bind.listeners.is_empty() {
        debug!(port, "dropping empty bind");
        next.binds.remove(bind_pos);
    }

    if !next.has_listener_named(name) {
        for target in &mut next.targets {
            if let Some(names) = target.listeners.as_mut() {
                names.retain(|n| n != name);
            }
        }
    }
    Ok(next)
}
