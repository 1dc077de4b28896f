//! Target command handlers.

use serde_json::{Map, Value};
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::{Edit, Session, Target};

use crate::cli::{GlobalOpts, TargetFields, TargetsArgs, TargetsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Listeners")]
    listeners: String,
}

impl From<&Target> for TargetRow {
    fn from(t: &Target) -> Self {
        Self {
            name: t.name.clone(),
            kind: t.kind.to_string(),
            listeners: t
                .listeners
                .as_ref()
                .map_or_else(|| "(all)".into(), |names| names.join(", ")),
        }
    }
}

fn build_target(fields: &TargetFields) -> Result<Target, CliError> {
    let spec = util::read_json_input(&fields.spec)?.unwrap_or_else(|| Value::Object(Map::new()));
    let mut target = Target::new(fields.name.clone(), fields.kind.into(), spec);
    if !fields.listeners.is_empty() {
        target.listeners = Some(fields.listeners.clone());
    }
    Ok(target)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: TargetsArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TargetsCommand::List { listener } => {
            let config = util::fetch(session, global).await?;
            let targets: Vec<Target> = config
                .targets
                .iter()
                .filter(|t| listener.as_deref().is_none_or(|l| t.attached_to(l)))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &targets,
                |r| TargetRow::from(r),
                |t| t.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TargetsCommand::Get { name } => {
            let config = util::fetch(session, global).await?;
            let target = config
                .target(&name)
                .ok_or_else(|| CliError::NotFound {
                    message: format!("target '{name}' not found"),
                    list_command: "targets list".into(),
                })?;
            let out = output::render_single(
                &global.output,
                target,
                output::render_json_pretty,
                |t| t.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TargetsCommand::Add(fields) => {
            let target = build_target(&fields)?;
            util::apply(session, Edit::AddTarget { target }, cancel, global).await?;
            Ok(())
        }

        TargetsCommand::Update(fields) => {
            let target = build_target(&fields)?;
            util::apply(session, Edit::UpdateTarget { target }, cancel, global).await?;
            Ok(())
        }

        TargetsCommand::Remove { name } => {
            if !util::confirm(&format!("Delete target '{name}'?"), global.yes)? {
                return Ok(());
            }
            util::apply(session, Edit::DeleteTarget { name }, cancel, global).await?;
            Ok(())
        }
    }
}
