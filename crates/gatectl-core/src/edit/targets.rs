// ── Target edits ──

use crate::error::EditError;
use crate::model::{Config, Target};

fn check_target(config: &Config, target: &Target) -> Result<(), EditError> {
    if target.name.trim().is_empty() {
        return Err(EditError::validation("target name must not be empty"));
    }
    if let Some(missing) = target
        .listeners
        .iter()
        .flatten()
        .find(|name| !config.has_listener_named(name))
    {
        return Err(EditError::UnknownListener {
            target: target.name.clone(),
            listener: missing.clone(),
        });
    }
    Ok(())
}

fn position(config: &Config, name: &str) -> Result<usize, EditError> {
    config
        .targets
        .iter()
        .position(|t| t.name == name)
        .ok_or_else(|| EditError::TargetNotFound {
            name: name.to_owned(),
        })
}

pub fn add_target(config: &Config, target: Target) -> Result<Config, EditError> {
    check_target(config, &target)?;
    if config.target(&target.name).is_some() {
        return Err(EditError::DuplicateTargetName { name: target.name });
    }
    let mut next = config.clone();
    next.targets.push(target);
    Ok(next)
}

/// Replace the target with the same name. Not an upsert.
pub fn update_target(config: &Config, target: Target) -> Result<Config, EditError> {
    let index = position(config, &target.name)?;
    check_target(config, &target)?;
    let mut next = config.clone();
    next.targets[index] = target;
    Ok(next)
}

pub fn delete_target(config: &Config, name: &str) -> Result<Config, EditError> {
    let index = position(config, name)?;
    let mut next = config.clone();
    next.targets.remove(index);
    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::TargetKind;
    use serde_json::json;

    fn base() -> Config {
        let (config, _) = Config::from_value(json!({
            "binds": [{ "port": 3000, "listeners": [{ "name": "sse", "protocol": "MCP" }] }],
            "targets": [{ "name": "everything", "stdio": { "cmd": "npx" } }]
        }))
        .unwrap();
        config
    }

    #[test]
    fn add_rejects_duplicate_and_unknown_listener() {
        let config = base();
        assert!(matches!(
            add_target(&config, Target::new("everything", TargetKind::Mcp, json!({}))),
            Err(EditError::DuplicateTargetName { .. })
        ));

        let mut t = Target::new("new", TargetKind::A2a, json!({ "host": "h", "port": 1 }));
        t.listeners = Some(vec!["nope".into()]);
        assert!(matches!(
            add_target(&config, t.clone()),
            Err(EditError::UnknownListener { .. })
        ));

        t.listeners = Some(vec!["sse".into()]);
        let next = add_target(&config, t).unwrap();
        assert_eq!(next.targets.len(), 2);
    }

    #[test]
    fn update_is_not_an_upsert() {
        assert!(matches!(
            update_target(&base(), Target::new("ghost", TargetKind::Mcp, json!({}))),
            Err(EditError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn update_replaces_in_place() {
        let next = update_target(
            &base(),
            Target::new("everything", TargetKind::Sse, json!({ "host": "h", "port": 8080 })),
        )
        .unwrap();
        assert_eq!(next.targets[0].kind, TargetKind::Sse);
    }

    #[test]
    fn delete_missing_target_is_an_error() {
        let config = base();
        let next = delete_target(&config, "everything").unwrap();
        assert!(next.targets.is_empty());
        assert!(matches!(
            delete_target(&next, "everything"),
            Err(EditError::TargetNotFound { .. })
        ));
    }
}
