//! Settings loading and environment variable interpolation.
//!
//! Handles loading from `~/.relnotes/settings.toml` and resolving `$VAR` and
//! `${VAR}` references in secret-bearing fields. An absent file means
//! defaults; there is no first-run template generation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::schema::RelnotesSettings;

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relnotes")
        .join("settings.toml")
}

/// Load settings from the default location.
pub fn load() -> Result<RelnotesSettings> {
    load_from_path(&settings_path())
}

/// Load settings from a specific path, resolving env var references.
pub fn load_from_path(path: &Path) -> Result<RelnotesSettings> {
    if !path.exists() {
        tracing::debug!("Settings file not found at {:?}, using defaults", path);
        return Ok(RelnotesSettings::default());
    }

    let contents = std::fs::read_to_string(path).context("Failed to read settings file")?;

    let mut settings: RelnotesSettings =
        toml::from_str(&contents).context("Failed to deserialize settings")?;

    resolve_env_vars(&mut settings);

    tracing::info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Resolve $ENV_VAR references in string fields.
fn resolve_env_vars(settings: &mut RelnotesSettings) {
    fn resolve_opt(value: &mut Option<String>) {
        if let Some(v) = value {
            if let Some(resolved) = resolve_env_ref(v) {
                *v = resolved;
            }
        }
    }

    resolve_opt(&mut settings.generation.api_key);
    resolve_opt(&mut settings.github.token);
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var
/// exists; `None` otherwise.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.starts_with('$') {
        let var_name = if trimmed.starts_with("${") && trimmed.ends_with('}') {
            &trimmed[2..trimmed.len() - 1]
        } else {
            &trimmed[1..]
        };

        return std::env::var(var_name).ok();
    }

    None
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    default
}
