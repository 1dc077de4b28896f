//! Whole-document command handlers.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use gatectl_core::{Config, Edit, JsonEditor, Session};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// One-line shape of a document.
fn summarize(config: &Config) -> String {
    let listeners = config.listeners().count();
    let routes: usize = config.listeners().map(|(_, l)| l.route_count()).sum();
    format!(
        "{} bind(s), {listeners} listener(s), {routes} route(s), {} target(s)",
        config.binds.len(),
        config.targets.len()
    )
}

fn load_file(path: &Path, global: &GlobalOpts) -> Result<Config, CliError> {
    let text = std::fs::read_to_string(path)?;
    let (config, report) = Config::from_json(&text)?;
    util::report_pruned(&report.pruned, global.quiet);
    Ok(config)
}

/// Offline validation; never contacts the gateway.
pub fn validate(path: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_file(path, global)?;
    output::note(&format!("✓ valid: {}", summarize(&config)), global.quiet);
    Ok(())
}

pub async fn handle(
    session: &Session,
    args: ConfigArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let config = util::fetch(session, global).await?;
            let out = output::render_single(
                &global.output,
                config.as_ref(),
                output::render_json_pretty,
                summarize,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Download { file } => {
            let config = util::fetch(session, global).await?;
            let text = config.to_json_pretty()?;
            match file {
                Some(path) => {
                    std::fs::write(&path, format!("{text}\n"))?;
                    output::note(
                        &format!("✓ Saved {} to {}", summarize(&config), path.display()),
                        global.quiet,
                    );
                }
                None => output::print_output(&text, global.quiet),
            }
            Ok(())
        }

        ConfigCommand::Apply { file } => {
            let config = load_file(&file, global)?;
            if !util::confirm(
                &format!("Replace the gateway config with {}?", summarize(&config)),
                global.yes,
            )? {
                return Ok(());
            }
            util::apply(
                session,
                Edit::ReplaceDocument {
                    config: Box::new(config),
                },
                cancel,
                global,
            )
            .await?;
            Ok(())
        }

        ConfigCommand::Validate { file } => validate(&file, global),

        ConfigCommand::EditCheck { file, commit } => {
            let current = util::fetch(session, global).await?;
            let mut editor = JsonEditor::new(current.as_ref().clone())?;
            editor.set_text(std::fs::read_to_string(&file)?);
            if let Some(err) = editor.error() {
                return Err(err.clone().into());
            }

            if editor.last_valid() == current.as_ref() {
                output::note("✓ valid, no changes against the live document", global.quiet);
                return Ok(());
            }
            output::note(
                &format!("✓ valid, changed: {}", summarize(editor.last_valid())),
                global.quiet,
            );

            if commit
                && util::confirm("Commit the edited document to the gateway?", global.yes)?
            {
                util::apply(session, editor.commit()?, cancel, global).await?;
            }
            Ok(())
        }
    }
}
