//! CLI configuration, a thin wrapper around `gatectl_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --token, --insecure, --timeout, --write-mode).

use std::time::Duration;

use secrecy::SecretString;

use gatectl_config::Defaults;
use gatectl_core::{SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gatectl_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the `SessionConfig` for this invocation.
///
/// With a matching profile, flags override its values. Without one,
/// `--url` alone is enough; an explicitly named but missing profile is
/// an error.
pub fn session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg.defaults, global),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            available: cfg.available_profiles(),
            name: profile_name,
        }),
        None => {
            let url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let bare = Profile {
                url: url.to_owned(),
                ..Profile::default()
            };
            resolve_profile(&bare, &profile_name, &cfg.defaults, global)
        }
    }
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<SessionConfig, CliError> {
    let mut session = gatectl_config::profile_to_session_config(profile, profile_name, defaults)?;

    // 1. URL (flag > env > profile)
    if let Some(url) = global.url.as_deref() {
        session.url = gatectl_config::parse_url(url)?;
    }

    // 2. Token (flag > env > profile chain)
    if let Some(token) = global.token.as_ref() {
        session.token = Some(SecretString::from(token.clone()));
    }

    // 3. TLS
    if global.insecure {
        session.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 4. Timeout and write mode
    if let Some(secs) = global.timeout {
        session.timeout = Duration::from_secs(secs);
    }
    if let Some(mode) = global.write_mode {
        session.write_mode = mode.into();
    }

    Ok(session)
}
