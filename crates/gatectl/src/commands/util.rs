//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use gatectl_core::{
    Config, Edit, EditOutcome, PrunedReference, RouteKind, RouteLocator, Session,
};

use crate::cli::{GlobalOpts, JsonInput, RouteAddr};
use crate::error::CliError;
use crate::output;

// ── Session helpers ─────────────────────────────────────────────────

/// Fetch the live document, reporting any dangling target references
/// that were dropped while loading it.
pub async fn fetch(session: &Session, global: &GlobalOpts) -> Result<Arc<Config>, CliError> {
    let (config, report) = session.refresh().await?;
    report_pruned(&report.pruned, global.quiet);
    Ok(config)
}

/// Run one edit through the session and report what happened.
pub async fn apply(
    session: &Session,
    edit: Edit,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<EditOutcome, CliError> {
    let description = edit.describe();
    let outcome = session.apply_with(edit, cancel).await?;
    report_pruned(&outcome.pruned, global.quiet);
    if !outcome.reconciled {
        output::note(
            "warning: write succeeded but the document could not be re-read",
            global.quiet,
        );
    }
    output::note(&format!("✓ {description}"), global.quiet);
    Ok(outcome)
}

pub fn report_pruned(pruned: &[PrunedReference], quiet: bool) {
    for p in pruned {
        output::note(&format!("warning: dropped {p}"), quiet);
    }
}

/// Turn route address flags into a locator.
pub fn locator(addr: &RouteAddr) -> RouteLocator {
    let kind = if addr.tcp {
        RouteKind::Tcp
    } else {
        RouteKind::Http
    };
    RouteLocator {
        port: addr.listener.port,
        listener: addr.listener.listener.clone(),
        kind,
        route: addr.route,
    }
}

// ── Interactive ─────────────────────────────────────────────────────

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

// ── JSON input ──────────────────────────────────────────────────────

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// The value of `--data` or `--from-file`, if either was given.
pub fn read_json_input(input: &JsonInput) -> Result<Option<Value>, CliError> {
    if let Some(path) = &input.from_file {
        return read_json_file(path).map(Some);
    }
    input
        .data
        .as_deref()
        .map(|raw| {
            serde_json::from_str(raw).map_err(|e| CliError::Validation {
                field: "data".into(),
                reason: format!("invalid JSON: {e}"),
            })
        })
        .transpose()
}

/// JSON if it parses, otherwise the raw text as a JSON string.
pub fn json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
