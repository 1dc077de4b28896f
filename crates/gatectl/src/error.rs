//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` / `EditError` / `ConfigError` variants into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gatectl_config::ConfigError;
use gatectl_core::{CoreError, EditError, FailureReason};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const READ_ONLY: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the gateway at {url}: {message}")]
    #[diagnostic(
        code(gatectl::connection_failed),
        help(
            "Check that the gateway admin listener is running and reachable.\n\
             URL: {url}\n\
             Try: gatectl mode --url http://localhost:15000"
        )
    )]
    ConnectionFailed { url: String, message: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(gatectl::timeout),
        help("Increase the timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(gatectl::auth_failed),
        help(
            "Verify the bearer token for profile '{profile}'.\n\
             Run: gatectl profile set token <TOKEN> --keyring"
        )
    )]
    AuthFailed { profile: String, message: String },

    // ── Gateway state ────────────────────────────────────────────────
    #[error("The gateway is driven by xDS; its local config is read-only")]
    #[diagnostic(
        code(gatectl::read_only),
        help("Edit the configuration at its xDS source instead.")
    )]
    ReadOnly,

    #[error("The gateway rejected the {phase}: {message}")]
    #[diagnostic(code(gatectl::rejected))]
    Rejected { phase: &'static str, message: String },

    #[error("Unexpected response from the gateway: {message}")]
    #[diagnostic(code(gatectl::decode))]
    Decode { message: String },

    #[error("Another edit is already in progress")]
    #[diagnostic(code(gatectl::busy))]
    Busy,

    #[error("Edit cancelled")]
    #[diagnostic(code(gatectl::cancelled))]
    Cancelled,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(gatectl::not_found),
        help("Run: gatectl {list_command} to see what exists")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(gatectl::conflict))]
    Conflict { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(gatectl::invalid_edit))]
    InvalidEdit { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatectl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gatectl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gatectl profile set url <URL> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No gateway configured")]
    #[diagnostic(
        code(gatectl::no_config),
        help(
            "Pass --url, or create a profile with: gatectl profile set url <URL>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatectl::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gatectl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ReadOnly => exit_code::READ_ONLY,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::Busy => exit_code::CONFLICT,
            Self::InvalidEdit { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the gateway URL to transport failures.
    pub fn at_url(self, url: &str) -> Self {
        match self {
            Self::ConnectionFailed { message, .. } => Self::ConnectionFailed {
                url: url.into(),
                message,
            },
            Self::Timeout { .. } => Self::Timeout { url: url.into() },
            other => other,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── EditError → CliError mapping ────────────────────────────────────

impl From<EditError> for CliError {
    fn from(err: EditError) -> Self {
        let message = err.to_string();
        match err {
            EditError::ListenerNotFound { .. } => Self::NotFound {
                message,
                list_command: "listeners list".into(),
            },
            EditError::RouteNotFound { .. } | EditError::IndexOutOfRange { .. } => {
                Self::NotFound {
                    message,
                    list_command: "routes list".into(),
                }
            }
            EditError::TargetNotFound { .. } => Self::NotFound {
                message,
                list_command: "targets list".into(),
            },
            EditError::UnknownPolicyKind { .. } => Self::NotFound {
                message,
                list_command: "policies kinds".into(),
            },
            EditError::DuplicateListenerName { .. } | EditError::DuplicateTargetName { .. } => {
                Self::Conflict { message }
            }
            _ => Self::InvalidEdit { message },
        }
    }
}

// ── CoreError → CliError mapping ────────────────────────────────────

fn from_failure(phase: &'static str, reason: FailureReason, message: String) -> CliError {
    match reason {
        FailureReason::Connection => CliError::ConnectionFailed {
            url: String::new(),
            message,
        },
        FailureReason::Timeout => CliError::Timeout { url: String::new() },
        FailureReason::Authentication => CliError::AuthFailed {
            profile: "current".into(),
            message,
        },
        FailureReason::NotFound => CliError::NotFound {
            message,
            list_command: "mode".into(),
        },
        FailureReason::Rejected => CliError::Rejected { phase, message },
        FailureReason::Decode => CliError::Decode { message },
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Fetch { reason, message } => from_failure("read", reason, message),
            CoreError::Persist { reason, message } => from_failure("write", reason, message),
            CoreError::Edit(e) => e.into(),
            CoreError::EditInProgress => Self::Busy,
            CoreError::Cancelled => Self::Cancelled,
            CoreError::ReadOnly => Self::ReadOnly,
            CoreError::Config { message } => Self::Validation {
                field: "connection".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_reason() {
        let err: CliError = CoreError::Fetch {
            reason: FailureReason::Connection,
            message: "refused".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err: CliError = CoreError::Persist {
            reason: FailureReason::Timeout,
            message: "slow".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        assert_eq!(CliError::from(CoreError::ReadOnly).exit_code(), exit_code::READ_ONLY);
        assert_eq!(CliError::from(CoreError::EditInProgress).exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn edit_errors_split_into_lookup_conflict_and_usage() {
        let not_found = CliError::from(EditError::TargetNotFound { name: "t".into() });
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let dup = CliError::from(EditError::DuplicateTargetName { name: "t".into() });
        assert_eq!(dup.exit_code(), exit_code::CONFLICT);

        let bad = CliError::from(EditError::InvalidPort { port: 0 });
        assert_eq!(bad.exit_code(), exit_code::USAGE);
        assert!(bad.to_string().contains("Invalid port 0"));
    }

    #[test]
    fn url_is_attached_to_transport_errors() {
        let err = CliError::ConnectionFailed {
            url: String::new(),
            message: "refused".into(),
        }
        .at_url("http://gw:15000");
        assert!(err.to_string().contains("http://gw:15000"));
    }
}
