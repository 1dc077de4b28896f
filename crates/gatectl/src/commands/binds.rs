//! Bind command handlers.

use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::{Bind, Session};

use crate::cli::{BindsArgs, BindsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct BindRow {
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Listeners")]
    listeners: String,
}

impl From<&Bind> for BindRow {
    fn from(b: &Bind) -> Self {
        Self {
            port: b.port,
            listeners: b
                .listeners
                .iter()
                .map(|l| format!("{} ({})", l.name, l.protocol()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: BindsArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BindsCommand::List => {
            let binds = session.list_binds_with(cancel).await?;
            let out = output::render_list(
                &global.output,
                &binds,
                |r| BindRow::from(r),
                |b| b.port.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
