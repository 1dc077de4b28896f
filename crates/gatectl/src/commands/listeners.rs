//! Listener command handlers.

use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::{Edit, Listener, Protocol, Session};

use crate::cli::{GlobalOpts, ListenersArgs, ListenersCommand, ProtocolArg};
use crate::error::CliError;
use crate::output;

use super::util;

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Http => Self::Http,
            ProtocolArg::Https => Self::Https,
            ProtocolArg::Tls => Self::Tls,
            ProtocolArg::Tcp => Self::Tcp,
            ProtocolArg::Hbone => Self::Hbone,
            ProtocolArg::Mcp => Self::Mcp,
            ProtocolArg::A2a => Self::A2a,
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

/// A listener together with the port it is bound on.
#[derive(Serialize)]
struct BoundListener<'a> {
    port: u16,
    #[serde(flatten)]
    listener: &'a Listener,
}

#[derive(Tabled)]
struct ListenerRow {
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Routes")]
    routes: usize,
}

impl From<&BoundListener<'_>> for ListenerRow {
    fn from(b: &BoundListener<'_>) -> Self {
        Self {
            port: b.port,
            name: b.listener.name.clone(),
            protocol: b.listener.protocol().to_string(),
            hostname: b.listener.hostname.clone().unwrap_or_default(),
            routes: b.listener.route_count(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: ListenersArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ListenersCommand::List { port } => {
            let config = util::fetch(session, global).await?;
            let rows: Vec<BoundListener<'_>> = config
                .listeners()
                .filter(|(p, _)| port.is_none_or(|want| *p == want))
                .map(|(port, listener)| BoundListener { port, listener })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |r| ListenerRow::from(r),
                |b| format!("{}/{}", b.port, b.listener.name),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ListenersCommand::Add {
            port,
            name,
            protocol,
            hostname,
        } => {
            let listener = Listener {
                hostname,
                ..Listener::new(name, protocol.into())
            };
            util::apply(session, Edit::AddListener { port, listener }, cancel, global).await?;
            Ok(())
        }

        ListenersCommand::Update {
            port,
            name,
            rename,
            protocol,
            hostname,
        } => {
            // Start from the current listener so unspecified fields stay.
            let config = util::fetch(session, global).await?;
            let current = config.find_listener(port, &name)?;
            let listener = Listener {
                name: rename.unwrap_or_else(|| current.name.clone()),
                protocol: protocol.map(Protocol::from).or(current.protocol),
                hostname: hostname.or_else(|| current.hostname.clone()),
                routes: None,
                tcp_routes: None,
                extra: current.extra.clone(),
            };
            util::apply(
                session,
                Edit::UpdateListener {
                    port,
                    name,
                    listener,
                },
                cancel,
                global,
            )
            .await?;
            Ok(())
        }

        ListenersCommand::Remove { port, name } => {
            if !util::confirm(
                &format!("Remove listener '{name}' on port {port} and all of its routes?"),
                global.yes,
            )? {
                return Ok(());
            }
            util::apply(session, Edit::RemoveListener { port, name }, cancel, global).await?;
            Ok(())
        }
    }
}
