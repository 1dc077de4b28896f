//! Profile subcommand handlers. These never contact the gateway.

use gatectl_core::WriteMode;

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "write_mode = \"{}\"", cfg.defaults.write_mode);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(mode) = p.write_mode {
            let _ = writeln!(out, "write_mode = \"{mode}\"");
        }
    }

    out
}

/// A copy of the config with every plaintext token replaced by a mask.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for p in cfg.profiles.values_mut() {
        if p.token.is_some() {
            p.token = Some("****".into());
        }
    }
    cfg
}

fn save(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Apply one `key = value` assignment to a profile. Returns `true` when
/// the token went to the keyring instead of the profile.
fn set_key(
    profile: &mut Profile,
    profile_name: &str,
    key: &str,
    value: String,
    keyring: bool,
) -> Result<bool, CliError> {
    if keyring && key != "token" {
        return Err(CliError::Validation {
            field: "keyring".into(),
            reason: "--keyring only applies to 'token'".into(),
        });
    }

    match key {
        "url" => {
            gatectl_config::parse_url(&value)?;
            profile.url = value;
        }
        "token" if keyring => {
            gatectl_config::store_token(profile_name, &value)?;
            profile.token = None;
            return Ok(true);
        }
        "token" => profile.token = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "write_mode" | "write-mode" => {
            profile.write_mode =
                Some(value.parse::<WriteMode>().map_err(|_| CliError::Validation {
                    field: "write_mode".into(),
                    reason: "must be 'document' or 'endpoints'".into(),
                })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown profile key '{other}'. Valid keys: url, token, token_env, \
                     ca_cert, insecure, timeout, write_mode"
                ),
            });
        }
    }
    Ok(false)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ProfileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProfileCommand::List => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                output::note(
                    "No profiles configured. Run: gatectl profile set url <URL>",
                    global.quiet,
                );
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .iter()
                    .map(|(name, p)| {
                        let marker = if *name == active { " *" } else { "" };
                        format!("{name}{marker}\t{}", p.url)
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        ProfileCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfileCommand::Set {
            key,
            value,
            keyring,
        } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            let in_keyring = set_key(profile, &profile_name, &key, value, keyring)?;
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            save(&cfg)?;

            if in_keyring {
                output::note("✓ Token stored in system keyring", global.quiet);
            }
            output::note(
                &format!("✓ Set {key} on profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }

        ProfileCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.available_profiles(),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            output::note(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_validates_values() {
        let mut profile = Profile::default();
        assert!(!set_key(&mut profile, "default", "timeout", "12".into(), false).unwrap());
        assert_eq!(profile.timeout, Some(12));

        set_key(&mut profile, "default", "write-mode", "endpoints".into(), false).unwrap();
        assert_eq!(profile.write_mode, Some(WriteMode::Endpoints));

        assert!(matches!(
            set_key(&mut profile, "default", "timeout", "soon".into(), false),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            set_key(&mut profile, "default", "url", "ftp://gw".into(), false),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            set_key(&mut profile, "default", "colour", "red".into(), false),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            set_key(&mut profile, "default", "url", "http://gw".into(), true),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn show_masks_tokens() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                url: "http://gw:15000".into(),
                token: Some("s3cret".into()),
                ..Profile::default()
            },
        );
        let text = format_config_redacted(&redacted(&cfg));
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("token = \"****\""));
        assert!(!text.contains("s3cret"));
    }
}
