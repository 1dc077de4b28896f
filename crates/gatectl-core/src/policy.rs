// ── Policy schema registry ──
//
// Static catalog of the policy kinds a route's policy bag may hold:
// the JSON shape each kind takes, whether it applies to HTTP and/or TCP
// routes, and a starting value for new policies.

use serde_json::{Value, json};
use strum::IntoEnumIterator;

use crate::error::EditError;
use crate::model::RouteKind;

/// JSON shape of a policy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PolicyShape {
    Object,
    Array,
}

impl PolicyShape {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Every policy kind the gateway understands, by wire key.
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
pub enum PolicyKind {
    #[strum(serialize = "jwtAuth")]
    JwtAuth,
    #[strum(serialize = "mcpAuthentication")]
    McpAuthentication,
    #[strum(serialize = "mcpAuthorization")]
    McpAuthorization,
    #[strum(serialize = "extAuthz")]
    ExtAuthz,
    #[strum(serialize = "backendAuth")]
    BackendAuth,
    #[strum(serialize = "backendTLS")]
    BackendTls,
    #[strum(serialize = "cors")]
    Cors,
    #[strum(serialize = "localRateLimit")]
    LocalRateLimit,
    #[strum(serialize = "remoteRateLimit")]
    RemoteRateLimit,
    #[strum(serialize = "timeout")]
    Timeout,
    #[strum(serialize = "retry")]
    Retry,
    #[strum(serialize = "requestHeaderModifier")]
    RequestHeaderModifier,
    #[strum(serialize = "responseHeaderModifier")]
    ResponseHeaderModifier,
    #[strum(serialize = "requestRedirect")]
    RequestRedirect,
    #[strum(serialize = "urlRewrite")]
    UrlRewrite,
    #[strum(serialize = "requestMirror")]
    RequestMirror,
    #[strum(serialize = "directResponse")]
    DirectResponse,
    #[strum(serialize = "ai")]
    Ai,
    #[strum(serialize = "a2a")]
    A2a,
}

impl PolicyKind {
    /// Parse a wire key, mapping failure to an edit error.
    pub fn parse(name: &str) -> Result<Self, EditError> {
        name.parse().map_err(|_| EditError::UnknownPolicyKind {
            name: name.to_owned(),
        })
    }

    pub fn shape(self) -> PolicyShape {
        match self {
            Self::LocalRateLimit => PolicyShape::Array,
            _ => PolicyShape::Object,
        }
    }

    #[allow(clippy::unused_self)]
    pub fn applies_to_http(self) -> bool {
        true
    }

    pub fn applies_to_tcp(self) -> bool {
        matches!(self, Self::BackendTls)
    }

    pub fn is_applicable(self, route_kind: RouteKind) -> bool {
        match route_kind {
            RouteKind::Http => self.applies_to_http(),
            RouteKind::Tcp => self.applies_to_tcp(),
        }
    }

    /// One-line description for listings.
    pub fn summary(self) -> &'static str {
        match self {
            Self::JwtAuth => "Validate JWT bearer tokens",
            Self::McpAuthentication => "OAuth-protected MCP resource authentication",
            Self::McpAuthorization => "CEL rules authorizing MCP tool access",
            Self::ExtAuthz => "Delegate authorization to an external service",
            Self::BackendAuth => "Credentials sent to the backend",
            Self::BackendTls => "TLS settings for backend connections",
            Self::Cors => "Cross-origin resource sharing",
            Self::LocalRateLimit => "Token-bucket rate limits enforced in-process",
            Self::RemoteRateLimit => "Rate limits enforced by a rate limit service",
            Self::Timeout => "Request and backend timeouts",
            Self::Retry => "Retry failed requests",
            Self::RequestHeaderModifier => "Add, set, or remove request headers",
            Self::ResponseHeaderModifier => "Add, set, or remove response headers",
            Self::RequestRedirect => "Redirect matching requests",
            Self::UrlRewrite => "Rewrite host or path before forwarding",
            Self::RequestMirror => "Mirror a share of traffic to another backend",
            Self::DirectResponse => "Answer directly without a backend",
            Self::Ai => "AI provider routing and prompt handling",
            Self::A2a => "Agent-to-agent protocol handling",
        }
    }

    /// A fresh starting value for this kind. Each call builds a new value.
    pub fn default_value(self) -> Value {
        match self {
            Self::JwtAuth => json!({
                "issuer": "",
                "audiences": [],
                "jwks": { "url": "" }
            }),
            Self::McpAuthentication => json!({
                "issuer": "",
                "audience": "",
                "scopes": []
            }),
            Self::McpAuthorization => json!({ "rules": [] }),
            Self::ExtAuthz => json!({ "target": { "host": "" } }),
            Self::BackendAuth => json!({ "passthrough": {} }),
            Self::BackendTls => json!({ "insecure": false }),
            Self::Cors => json!({
                "allowCredentials": false,
                "allowHeaders": [],
                "allowMethods": [],
                "allowOrigins": [],
                "exposeHeaders": []
            }),
            Self::LocalRateLimit => json!([{
                "maxTokens": 10,
                "tokensPerFill": 1,
                "fillInterval": "1s",
                "type": "requests"
            }]),
            Self::RemoteRateLimit => json!({
                "host": "",
                "domain": "",
                "descriptors": []
            }),
            Self::Timeout => json!({ "requestTimeout": "15s" }),
            Self::Retry => json!({
                "attempts": 1,
                "backoff": "500ms",
                "codes": [503]
            }),
            Self::RequestHeaderModifier | Self::ResponseHeaderModifier => json!({
                "add": {},
                "set": {},
                "remove": []
            }),
            Self::RequestRedirect => json!({ "status": 302 }),
            Self::UrlRewrite => json!({ "path": { "prefix": "/" } }),
            Self::RequestMirror => json!({
                "backend": { "host": "" },
                "percentage": 1.0
            }),
            Self::DirectResponse => json!({ "body": "", "status": 200 }),
            Self::Ai | Self::A2a => json!({}),
        }
    }

    /// Check `value` against this kind for a route of `route_kind`.
    pub fn check(self, route_kind: RouteKind, value: &Value) -> Result<(), EditError> {
        if !self.is_applicable(route_kind) {
            return Err(EditError::PolicyNotApplicable {
                kind: self,
                route_kind,
            });
        }
        if !self.shape().accepts(value) {
            return Err(EditError::InvalidPolicyValue {
                kind: self,
                expected: self.shape(),
            });
        }
        Ok(())
    }
}

/// Kinds that may be offered for a route of the given kind.
pub fn kinds_for(route_kind: RouteKind) -> Vec<PolicyKind> {
    PolicyKind::iter()
        .filter(|k| k.is_applicable(route_kind))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_not_aliased() {
        let a = PolicyKind::Cors.default_value();
        let mut b = PolicyKind::Cors.default_value();
        assert_eq!(a, b);

        b["allowCredentials"] = Value::Bool(true);
        assert_ne!(a, b);
        assert_eq!(PolicyKind::Cors.default_value()["allowCredentials"], false);
    }

    #[test]
    fn defaults_match_declared_shape() {
        for kind in PolicyKind::iter() {
            assert!(
                kind.shape().accepts(&kind.default_value()),
                "{kind} default does not match its shape"
            );
        }
    }

    #[test]
    fn only_backend_tls_applies_to_tcp() {
        assert_eq!(kinds_for(RouteKind::Tcp), vec![PolicyKind::BackendTls]);
        assert_eq!(kinds_for(RouteKind::Http).len(), 19);
    }

    #[test]
    fn wire_names_round_trip() {
        assert_eq!(PolicyKind::BackendTls.to_string(), "backendTLS");
        assert_eq!(PolicyKind::parse("jwtAuth").unwrap(), PolicyKind::JwtAuth);
        assert!(matches!(
            PolicyKind::parse("bogus"),
            Err(EditError::UnknownPolicyKind { .. })
        ));
    }

    #[test]
    fn check_rejects_wrong_route_kind_and_shape() {
        assert!(matches!(
            PolicyKind::Cors.check(RouteKind::Tcp, &json!({})),
            Err(EditError::PolicyNotApplicable { .. })
        ));
        assert!(matches!(
            PolicyKind::LocalRateLimit.check(RouteKind::Http, &json!({})),
            Err(EditError::InvalidPolicyValue {
                expected: PolicyShape::Array,
                ..
            })
        ));
        assert!(
            PolicyKind::BackendTls
                .check(RouteKind::Tcp, &json!({ "insecure": true }))
                .is_ok()
        );
    }
}
