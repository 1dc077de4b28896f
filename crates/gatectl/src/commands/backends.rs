//! Backend command handlers.

use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::{Backend, BackendKind, Edit, RouteKind, Session};

use crate::cli::{BackendFields, BackendKindArg, BackendsArgs, BackendsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

impl From<BackendKindArg> for BackendKind {
    fn from(arg: BackendKindArg) -> Self {
        match arg {
            BackendKindArg::Mcp => Self::Mcp,
            BackendKindArg::Host => Self::Host,
            BackendKindArg::Service => Self::Service,
            BackendKindArg::Ai => Self::Ai,
            BackendKindArg::Dynamic => Self::Dynamic,
        }
    }
}

fn build_backend(route_kind: RouteKind, fields: &BackendFields) -> Backend {
    let backend = Backend::for_route(
        route_kind,
        fields.kind.into(),
        util::json_or_string(&fields.value),
    );
    match fields.weight {
        Some(w) => backend.with_weight(w),
        None => backend,
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct IndexedBackend<'a> {
    index: usize,
    #[serde(flatten)]
    backend: &'a Backend,
}

#[derive(Tabled)]
struct BackendRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Backend")]
    summary: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

impl From<&IndexedBackend<'_>> for BackendRow {
    fn from(b: &IndexedBackend<'_>) -> Self {
        Self {
            index: b.index,
            summary: b.backend.summary(),
            weight: b.backend.weight.map(|w| w.to_string()).unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: BackendsArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BackendsCommand::List(addr) => {
            let config = util::fetch(session, global).await?;
            let at = util::locator(&addr);
            let backends = match at.kind {
                RouteKind::Http => &config.find_route(&at)?.backends,
                RouteKind::Tcp => &config.find_tcp_route(&at)?.backends,
            };
            let rows: Vec<IndexedBackend<'_>> = backends
                .iter()
                .enumerate()
                .map(|(index, backend)| IndexedBackend { index, backend })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |r| BackendRow::from(r),
                |b| b.index.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BackendsCommand::Add { at, fields } => {
            let at = util::locator(&at);
            let backend = build_backend(at.kind, &fields);
            util::apply(session, Edit::AddBackend { at, backend }, cancel, global).await?;
            Ok(())
        }

        BackendsCommand::Update { at, index, fields } => {
            let at = util::locator(&at);
            let backend = build_backend(at.kind, &fields);
            util::apply(
                session,
                Edit::UpdateBackend { at, index, backend },
                cancel,
                global,
            )
            .await?;
            Ok(())
        }

        BackendsCommand::Remove { at, index } => {
            let at = util::locator(&at);
            if !util::confirm(&format!("Remove backend {index} from route {at}?"), global.yes)? {
                return Ok(());
            }
            util::apply(session, Edit::RemoveBackend { at, index }, cancel, global).await?;
            Ok(())
        }
    }
}
