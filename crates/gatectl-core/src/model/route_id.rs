// ── Route identity ──
//
// Routes have no identity on the wire; they are addressed by position.
// `RouteId` gives each parsed or created route an in-memory id that is
// never serialized and is carried across re-fetches for unchanged routes.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// In-memory identity of a `Route` or `TcpRoute` for the session lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(Uuid);

impl RouteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RouteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RouteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RouteId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── RouteRef ────────────────────────────────────────────────────────

/// How a caller addresses one route inside a listener's route array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRef {
    /// Position in the array as last seen by the caller.
    Index(usize),
    /// Stable in-memory id.
    Id(RouteId),
}

impl fmt::Display for RouteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// `"3"` is an index, anything that parses as a UUID is an id.
impl FromStr for RouteRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        if let Ok(index) = s.parse::<usize>() {
            return Ok(Self::Index(index));
        }
        s.parse::<RouteId>()
            .map(Self::Id)
            .map_err(|_| format!("'{s}' is neither a route index nor a route id"))
    }
}
