//! Policy command handlers.

use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::policy::kinds_for;
use gatectl_core::{Edit, PolicyKind, RouteKind, Session};

use crate::cli::{GlobalOpts, PoliciesArgs, PoliciesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

/// Registry entry for one policy kind.
#[derive(Serialize)]
struct KindInfo {
    kind: String,
    shape: String,
    http: bool,
    tcp: bool,
    summary: &'static str,
}

impl From<PolicyKind> for KindInfo {
    fn from(kind: PolicyKind) -> Self {
        Self {
            kind: kind.to_string(),
            shape: kind.shape().to_string(),
            http: kind.applies_to_http(),
            tcp: kind.applies_to_tcp(),
            summary: kind.summary(),
        }
    }
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "Routes")]
    routes: &'static str,
    #[tabled(rename = "Description")]
    summary: &'static str,
}

impl From<&KindInfo> for KindRow {
    fn from(k: &KindInfo) -> Self {
        Self {
            kind: k.kind.clone(),
            shape: k.shape.clone(),
            routes: match (k.http, k.tcp) {
                (true, true) => "http, tcp",
                (false, true) => "tcp",
                _ => "http",
            },
            summary: k.summary,
        }
    }
}

fn parse_kind(name: &str) -> Result<PolicyKind, CliError> {
    Ok(PolicyKind::parse(name)?)
}

/// Registry lookups; never contacts the gateway.
pub fn registry(command: PoliciesCommand, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        PoliciesCommand::Kinds { tcp } => {
            let route_kind = if tcp { RouteKind::Tcp } else { RouteKind::Http };
            let kinds: Vec<KindInfo> = kinds_for(route_kind)
                .into_iter()
                .map(KindInfo::from)
                .collect();
            let out = output::render_list(
                &global.output,
                &kinds,
                |r| KindRow::from(r),
                |k| k.kind.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Default { kind } => {
            let value = parse_kind(&kind)?.default_value();
            let out = output::render_single(
                &global.output,
                &value,
                output::render_json_pretty,
                |_| kind.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        _ => Err(CliError::Internal("policy command needs a gateway session".into())),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: PoliciesArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        command @ (PoliciesCommand::Kinds { .. } | PoliciesCommand::Default { .. }) => {
            registry(command, global)
        }

        PoliciesCommand::Show(addr) => {
            let config = util::fetch(session, global).await?;
            let at = util::locator(&addr);
            let policies = match at.kind {
                RouteKind::Http => config.find_route(&at)?.policies.clone(),
                RouteKind::Tcp => config.find_tcp_route(&at)?.policies.clone(),
            }
            .unwrap_or_default();
            let out = output::render_single(
                &global.output,
                &policies,
                output::render_json_pretty,
                |bag| bag.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Set { at, kind, input } => {
            let kind = parse_kind(&kind)?;
            let data = util::read_json_input(&input)?.unwrap_or_else(|| kind.default_value());
            let at = util::locator(&at);
            util::apply(session, Edit::SetPolicy { at, kind, data }, cancel, global).await?;
            Ok(())
        }

        PoliciesCommand::Delete { at, kind } => {
            let kind = parse_kind(&kind)?;
            let at = util::locator(&at);
            if !util::confirm(&format!("Remove {kind} policy from route {at}?"), global.yes)? {
                return Ok(());
            }
            util::apply(session, Edit::DeletePolicy { at, kind }, cancel, global).await?;
            Ok(())
        }
    }
}
