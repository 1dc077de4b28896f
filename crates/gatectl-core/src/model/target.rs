// ── Targets ──
//
// Two wire shapes exist for a target: the payload tagged only by which
// key is present (`{"name": .., "stdio": {..}}`), and the same with an
// explicit `"type"` discriminant. Both are normalized at the parse
// boundary through `RawTarget`; output always carries `type` plus the
// payload key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use gatectl_api::TargetFamily;

/// Target payload kinds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum TargetKind {
    Sse,
    Stdio,
    Openapi,
    A2a,
    Mcp,
}

impl TargetKind {
    const ALL: [Self; 5] = [Self::Sse, Self::Stdio, Self::Openapi, Self::A2a, Self::Mcp];

    /// Management endpoint family this kind is written through.
    pub fn family(self) -> TargetFamily {
        match self {
            Self::A2a => TargetFamily::A2a,
            Self::Sse | Self::Stdio | Self::Openapi | Self::Mcp => TargetFamily::Mcp,
        }
    }
}

/// A named upstream definition attached to listeners by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "RawTarget")]
pub struct Target {
    pub name: String,
    /// `None` attaches the target to every listener.
    pub listeners: Option<Vec<String>>,
    pub kind: TargetKind,
    /// The kind-specific payload object (`{"cmd": ..}` for stdio, etc.).
    pub spec: Value,
    pub extra: Map<String, Value>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind, spec: Value) -> Self {
        Self {
            name: name.into(),
            listeners: None,
            kind,
            spec,
            extra: Map::new(),
        }
    }

    /// Whether this target is attached to the named listener.
    pub fn attached_to(&self, listener: &str) -> bool {
        self.listeners
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == listener))
    }
}

// ── Wire shape ──────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct RawTarget {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listeners: Option<Vec<String>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawTarget> for Target {
    type Error = String;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        let RawTarget {
            name,
            kind,
            listeners,
            mut rest,
        } = raw;

        let present: Vec<TargetKind> = TargetKind::ALL
            .into_iter()
            .filter(|k| rest.contains_key(k.as_ref()))
            .collect();

        let kind = match kind {
            Some(tag) => {
                let kind: TargetKind = tag
                    .parse()
                    .map_err(|_| format!("target '{name}': unknown type '{tag}'"))?;
                if let Some(other) = present.iter().find(|k| **k != kind) {
                    return Err(format!(
                        "target '{name}': type is '{kind}' but a '{other}' payload is present"
                    ));
                }
                kind
            }
            None => match present.as_slice() {
                [kind] => *kind,
                [] => return Err(format!("target '{name}': no target payload present")),
                _ => {
                    return Err(format!(
                        "target '{name}': more than one target payload present"
                    ));
                }
            },
        };

        let spec = rest
            .remove(kind.as_ref())
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(Self {
            name,
            listeners,
            kind,
            spec,
            extra: rest,
        })
    }
}

impl From<Target> for RawTarget {
    fn from(target: Target) -> Self {
        let mut rest = Map::with_capacity(target.extra.len() + 1);
        rest.insert(target.kind.as_ref().to_owned(), target.spec);
        rest.extend(target.extra);
        Self {
            name: target.name,
            kind: Some(target.kind.to_string()),
            listeners: target.listeners,
            rest,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn presence_tagged_target_is_inferred() {
        let t: Target = serde_json::from_value(json!({
            "name": "everything",
            "stdio": { "cmd": "npx", "args": ["server"] }
        }))
        .unwrap();
        assert_eq!(t.kind, TargetKind::Stdio);
        assert_eq!(t.spec["cmd"], "npx");
        assert!(t.listeners.is_none());
    }

    #[test]
    fn canonical_output_carries_type_and_payload() {
        let t: Target = serde_json::from_value(json!({
            "name": "agent",
            "listeners": ["l1"],
            "a2a": { "host": "localhost", "port": 9999 }
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            json!({
                "name": "agent",
                "type": "a2a",
                "listeners": ["l1"],
                "a2a": { "host": "localhost", "port": 9999 }
            })
        );
    }

    #[test]
    fn explicit_type_must_agree_with_payload() {
        let err = serde_json::from_value::<Target>(json!({
            "name": "x", "type": "mcp", "sse": { "host": "h" }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("'sse' payload"));
    }

    #[test]
    fn missing_or_ambiguous_payload_is_rejected() {
        assert!(serde_json::from_value::<Target>(json!({ "name": "x" })).is_err());
        assert!(
            serde_json::from_value::<Target>(json!({
                "name": "x", "sse": {}, "stdio": {}
            }))
            .is_err()
        );
    }

    #[test]
    fn families_split_a2a_from_mcp() {
        assert_eq!(TargetKind::A2a.family(), TargetFamily::A2a);
        assert_eq!(TargetKind::Openapi.family(), TargetFamily::Mcp);
    }

    #[test]
    fn no_listener_list_means_all() {
        let mut t = Target::new("t", TargetKind::Mcp, json!({}));
        assert!(t.attached_to("anything"));
        t.listeners = Some(vec!["l1".into()]);
        assert!(!t.attached_to("l2"));
    }
}
