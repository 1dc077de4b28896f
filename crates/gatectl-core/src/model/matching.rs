// ── Match construction ──
//
// Turns the loosely-typed inputs of a route form (path kind and value,
// comma-separated header/method/query strings) into one `Match`.
// Parsing is lenient: a pair without its separator keeps the name and
// gets an empty value, blank segments are skipped, and empty inputs
// leave the corresponding key out.

use super::route::{KeyMatch, Match, MethodMatch, PathMatch, ValueMatch};

/// Path predicate kind offered for a route match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum PathKind {
    Exact,
    #[default]
    PathPrefix,
    Regex,
}

/// Raw form inputs for [`build_match`].
#[derive(Debug, Clone, Default)]
pub struct MatchInput {
    pub path_kind: PathKind,
    pub path: String,
    /// `name:value` pairs separated by commas.
    pub headers: String,
    /// HTTP methods separated by commas. Only the first is used.
    pub methods: String,
    /// `name=value` pairs separated by commas.
    pub query_params: String,
}

pub fn build_match(input: &MatchInput) -> Match {
    let path = input.path.trim();
    let path = (!path.is_empty()).then(|| match input.path_kind {
        PathKind::Exact => PathMatch::Exact(path.to_owned()),
        PathKind::PathPrefix => PathMatch::PathPrefix(path.to_owned()),
        PathKind::Regex => PathMatch::Regex(path.to_owned(), 0),
    });

    let method = split_list(&input.methods).next().map(|m| MethodMatch {
        method: m.to_ascii_uppercase(),
    });

    let headers = key_matches(&input.headers, ':');
    let query = key_matches(&input.query_params, '=');

    Match {
        path,
        method,
        headers,
        query,
        ..Match::default()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// `None` when nothing usable was entered.
fn key_matches(raw: &str, separator: char) -> Option<Vec<KeyMatch>> {
    let pairs: Vec<KeyMatch> = split_list(raw)
        .filter_map(|pair| {
            let (name, value) = pair.split_once(separator).unwrap_or((pair, ""));
            let name = name.trim();
            (!name.is_empty()).then(|| KeyMatch {
                name: name.to_owned(),
                value: ValueMatch::Exact(value.trim().to_owned()),
            })
        })
        .collect();
    (!pairs.is_empty()).then_some(pairs)
}
