//! Config file discovery and layered loading.
//!
//! `Config::load()`:
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the user file (`$WARDEN_HOME/config.toml`, else `~/.warden/config.toml`)
//! 3. Merge `{workspace}/.warden/config.toml`
//! 4. Apply `WARDEN_*` environment overrides
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Prefix of every environment variable the loader looks at.
const ENV_PREFIX: &str = "WARDEN_";

/// Collect the `WARDEN_*` variables from the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Load configuration with layered file precedence.
///
/// `workspace_root` enables the workspace layer. `home_override` replaces
/// user-level discovery and is treated as the `.warden` directory itself.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any file is malformed, an environment
/// override cannot be parsed, or the merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<Config> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let user_path = match home_override {
        Some(dir) => dir.join("config.toml"),
        None => user_config_path(env_vars)?,
    };
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge(&mut merged, &overlay);
        info!(path = %user_path.display(), "loaded user config");
    }

    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(".warden").join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %ws_path.display(), "loaded workspace config");
        }
    }

    let applied = apply_env_overrides(&mut merged, env_vars)?;
    if applied > 0 {
        debug!(count = applied, "applied environment overrides");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a single file, without layering.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let Some(value) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

fn user_config_path(env_vars: &HashMap<String, String>) -> ConfigResult<PathBuf> {
    if let Some(home) = env_vars.get("WARDEN_HOME") {
        return Ok(PathBuf::from(home).join("config.toml"));
    }
    let base = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
    Ok(base.home_dir().join(".warden").join("config.toml"))
}

/// Read and parse a TOML file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

/// Write `value` at `section.key`, creating the section table if needed.
fn set_field(root: &mut toml::Value, section: &str, key: &str, value: toml::Value) {
    let toml::Value::Table(table) = root else {
        return;
    };
    let entry = table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let toml::Value::Table(section_table) = entry {
        section_table.insert(key.to_owned(), value);
    }
}

fn parse_integer(var_name: &str, raw: &str) -> ConfigResult<toml::Value> {
    raw.trim()
        .parse::<i64>()
        .map(toml::Value::Integer)
        .map_err(|e| ConfigError::EnvError {
            var_name: var_name.to_owned(),
            message: format!("expected an integer: {e}"),
        })
}

/// Apply environment overrides. Returns the number applied.
fn apply_env_overrides(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied = 0_usize;

    let string_vars = [
        ("WARDEN_LOG_LEVEL", "logging", "level"),
        ("WARDEN_LOG_FORMAT", "logging", "format"),
        ("WARDEN_DATA_DIR", "storage", "data_dir"),
    ];
    for (var, section, key) in string_vars {
        if let Some(raw) = env_vars.get(var) {
            set_field(merged, section, key, toml::Value::String(raw.clone()));
            applied = applied.saturating_add(1);
        }
    }

    let integer_vars = [
        ("WARDEN_UNDO_CAPACITY", "undo", "capacity"),
        ("WARDEN_COMMAND_TIMEOUT_SECS", "executor", "command_timeout_secs"),
    ];
    for (var, section, key) in integer_vars {
        if let Some(raw) = env_vars.get(var) {
            let value = parse_integer(var, raw)?;
            set_field(merged, section, key, value);
            applied = applied.saturating_add(1);
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_files() {
        let home = tempfile::tempdir().unwrap();
        let config = load(None, Some(home.path()), &HashMap::new()).unwrap();
        assert_eq!(config.undo.capacity, 50);
        assert_eq!(config.activity.persist_limit, 200);
    }

    #[test]
    fn test_workspace_overrides_user() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write(
            &home.path().join("config.toml"),
            "[undo]\ncapacity = 20\n[safety]\nmax_diff_lines = 10\n",
        );
        write(
            &ws.path().join(".warden").join("config.toml"),
            "[undo]\ncapacity = 5\n",
        );

        let config = load(Some(ws.path()), Some(home.path()), &HashMap::new()).unwrap();
        assert_eq!(config.undo.capacity, 5);
        assert_eq!(config.safety.max_diff_lines, 10);
    }

    #[test]
    fn test_env_overrides_files() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join("config.toml"), "[logging]\nlevel = \"warn\"\n");

        let env = HashMap::from([
            ("WARDEN_LOG_LEVEL".to_owned(), "debug".to_owned()),
            ("WARDEN_UNDO_CAPACITY".to_owned(), "7".to_owned()),
        ]);
        let config = load(None, Some(home.path()), &env).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.undo.capacity, 7);
    }

    #[test]
    fn test_bad_env_integer_rejected() {
        let home = tempfile::tempdir().unwrap();
        let env = HashMap::from([("WARDEN_UNDO_CAPACITY".to_owned(), "lots".to_owned())]);
        let result = load(None, Some(home.path()), &env);
        assert!(matches!(result, Err(ConfigError::EnvError { .. })));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join("config.toml"), "[undo]\ncapacity = 0\n");
        let result = load(None, Some(home.path()), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/warden.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&path, data).unwrap();

        let result = try_load_file(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
