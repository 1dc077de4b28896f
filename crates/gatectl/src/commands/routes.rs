//! Route command handlers.

use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use gatectl_core::{
    Backend, Config, Edit, Match, MatchInput, PathKind, PolicyBag, Route, RouteKind, RouteSpec,
    RouteUpdate, Session, TcpRoute, build_match,
};

use crate::cli::{GlobalOpts, PathKindArg, RouteFields, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

impl From<PathKindArg> for PathKind {
    fn from(arg: PathKindArg) -> Self {
        match arg {
            PathKindArg::Exact => Self::Exact,
            PathKindArg::Prefix => Self::PathPrefix,
            PathKindArg::Regex => Self::Regex,
        }
    }
}

// ── Views ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Serialize)]
#[serde(untagged)]
enum RouteBody<'a> {
    Http(&'a Route),
    Tcp(&'a TcpRoute),
}

/// A route with its position in the document.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteView<'a> {
    port: u16,
    listener: &'a str,
    kind: String,
    index: usize,
    #[serde(flatten)]
    route: RouteBody<'a>,
}

impl RouteView<'_> {
    fn name(&self) -> Option<&str> {
        let (name, rule) = match self.route {
            RouteBody::Http(r) => (&r.name, &r.rule_name),
            RouteBody::Tcp(r) => (&r.name, &r.rule_name),
        };
        name.as_deref().or(rule.as_deref())
    }

    fn hostnames(&self) -> &[String] {
        match self.route {
            RouteBody::Http(r) => &r.hostnames,
            RouteBody::Tcp(r) => &r.hostnames,
        }
    }

    fn backends(&self) -> &[Backend] {
        match self.route {
            RouteBody::Http(r) => &r.backends,
            RouteBody::Tcp(r) => &r.backends,
        }
    }

    fn policies(&self) -> Option<&PolicyBag> {
        match self.route {
            RouteBody::Http(r) => r.policies.as_ref(),
            RouteBody::Tcp(r) => r.policies.as_ref(),
        }
    }
}

fn match_summary(m: &Match) -> String {
    let mut parts = Vec::new();
    if let Some(method) = &m.method {
        parts.push(method.method.clone());
    }
    if let Some(path) = &m.path {
        parts.push(path.value().to_owned());
    }
    if let Some(headers) = &m.headers {
        parts.push(format!("{} header(s)", headers.len()));
    }
    if let Some(query) = &m.query {
        parts.push(format!("{} query", query.len()));
    }
    parts.join(" ")
}

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Listener")]
    listener: String,
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hostnames")]
    hostnames: String,
    #[tabled(rename = "Matches")]
    matches: String,
    #[tabled(rename = "Backends")]
    backends: String,
    #[tabled(rename = "Policies")]
    policies: String,
}

impl From<&RouteView<'_>> for RouteRow {
    fn from(v: &RouteView<'_>) -> Self {
        let matches = match v.route {
            RouteBody::Http(r) => match r.matches.as_deref() {
                None => "(default)".into(),
                Some([]) => "(none)".into(),
                Some(list) => list.iter().map(match_summary).collect::<Vec<_>>().join("; "),
            },
            RouteBody::Tcp(_) => "-".into(),
        };
        Self {
            port: v.port,
            listener: v.listener.to_owned(),
            index: v.index,
            kind: v.kind.clone(),
            name: v.name().unwrap_or("-").to_owned(),
            hostnames: v.hostnames().join(", "),
            matches,
            backends: v
                .backends()
                .iter()
                .map(Backend::summary)
                .collect::<Vec<_>>()
                .join(", "),
            policies: v
                .policies()
                .map(|bag| bag.keys().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default(),
        }
    }
}

fn collect_views<'a>(
    config: &'a Config,
    port: Option<u16>,
    listener: Option<&str>,
) -> Vec<RouteView<'a>> {
    let mut views = Vec::new();
    for (p, l) in config.listeners() {
        if port.is_some_and(|want| want != p) || listener.is_some_and(|want| want != l.name) {
            continue;
        }
        let http = l.routes.iter().flatten().map(RouteBody::Http);
        let tcp = l.tcp_routes.iter().flatten().map(RouteBody::Tcp);
        for (kind, bodies) in [
            (RouteKind::Http, http.collect::<Vec<_>>()),
            (RouteKind::Tcp, tcp.collect::<Vec<_>>()),
        ] {
            views.extend(bodies.into_iter().enumerate().map(|(index, route)| RouteView {
                port: p,
                listener: &l.name,
                kind: kind.to_string(),
                index,
                route,
            }));
        }
    }
    views
}

// ── Building ────────────────────────────────────────────────────────

/// The match described by the flags, or `None` if no match flag was set.
fn match_from(fields: &RouteFields) -> Option<Match> {
    let input = MatchInput {
        path_kind: fields.path_kind.into(),
        path: fields.path.clone().unwrap_or_default(),
        headers: fields.headers.clone(),
        methods: fields.methods.clone(),
        query_params: fields.query.clone(),
    };
    let empty = input.path.trim().is_empty()
        && input.headers.trim().is_empty()
        && input.methods.trim().is_empty()
        && input.query_params.trim().is_empty();
    (!empty).then(|| build_match(&input))
}

fn route_spec(tcp: bool, fields: RouteFields) -> Result<RouteSpec, CliError> {
    let matched = match_from(&fields);
    if tcp {
        if matched.is_some() {
            return Err(CliError::Validation {
                field: "matches".into(),
                reason: "TCP routes do not support path, header, method, or query matches".into(),
            });
        }
        return Ok(RouteSpec::Tcp(TcpRoute {
            name: fields.name,
            rule_name: fields.rule_name,
            hostnames: fields.hostnames,
            ..TcpRoute::default()
        }));
    }
    Ok(RouteSpec::Http(Route {
        name: fields.name,
        rule_name: fields.rule_name,
        hostnames: fields.hostnames,
        matches: matched.map(|m| vec![m]),
        ..Route::default()
    }))
}

fn route_update(fields: RouteFields) -> RouteUpdate {
    let matches = match_from(&fields).map(|m| vec![m]);
    RouteUpdate {
        name: fields.name,
        rule_name: fields.rule_name,
        hostnames: fields.hostnames,
        matches,
        backends: None,
        policies: None,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: RoutesArgs,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RoutesCommand::List { port, listener } => {
            let config = util::fetch(session, global).await?;
            let views = collect_views(&config, port, listener.as_deref());
            let out = output::render_list(
                &global.output,
                &views,
                |r| RouteRow::from(r),
                |v| format!("{}/{}/{}#{}", v.port, v.listener, v.kind, v.index),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Get(addr) => {
            let config = util::fetch(session, global).await?;
            let at = util::locator(&addr);
            let value = match at.kind {
                RouteKind::Http => serde_json::to_value(config.find_route(&at)?),
                RouteKind::Tcp => serde_json::to_value(config.find_tcp_route(&at)?),
            }
            .map_err(|e| CliError::Internal(e.to_string()))?;
            let out = output::render_single(
                &global.output,
                &value,
                output::render_json_pretty,
                |_| at.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Add { at, tcp, fields } => {
            let route = route_spec(tcp, fields)?;
            util::apply(
                session,
                Edit::AddRoute {
                    port: at.port,
                    listener: at.listener,
                    route,
                },
                cancel,
                global,
            )
            .await?;
            Ok(())
        }

        RoutesCommand::Update { at, fields } => {
            if at.tcp && match_from(&fields).is_some() {
                return Err(CliError::Validation {
                    field: "matches".into(),
                    reason: "TCP routes do not support path, header, method, or query matches"
                        .into(),
                });
            }
            let update = route_update(fields);
            util::apply(
                session,
                Edit::UpdateRoute {
                    at: util::locator(&at),
                    update,
                },
                cancel,
                global,
            )
            .await?;
            Ok(())
        }

        RoutesCommand::Delete(addr) => {
            let at = util::locator(&addr);
            if !util::confirm(&format!("Delete route {at}?"), global.yes)? {
                return Ok(());
            }
            util::apply(session, Edit::DeleteRoute { at }, cancel, global).await?;
            Ok(())
        }
    }
}
