//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_safety(config)?;
    validate_undo(config)?;
    validate_activity(config)?;
    validate_executor(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_safety(config: &Config) -> ConfigResult<()> {
    if config.safety.max_diff_lines == 0 {
        return Err(invalid(
            "safety.max_diff_lines",
            "max_diff_lines must be at least 1",
        ));
    }
    Ok(())
}

fn validate_undo(config: &Config) -> ConfigResult<()> {
    if config.undo.capacity == 0 {
        return Err(invalid("undo.capacity", "capacity must be at least 1"));
    }
    Ok(())
}

fn validate_activity(config: &Config) -> ConfigResult<()> {
    let a = &config.activity;
    if a.capacity == 0 {
        return Err(invalid("activity.capacity", "capacity must be at least 1"));
    }
    if a.persist_limit > a.capacity {
        return Err(invalid(
            "activity.persist_limit",
            format!(
                "persist_limit {} exceeds capacity {}",
                a.persist_limit, a.capacity
            ),
        ));
    }
    if a.text_truncate == 0 || a.result_truncate == 0 {
        return Err(invalid(
            "activity.text_truncate",
            "truncation limits must be at least 1",
        ));
    }
    Ok(())
}

fn validate_executor(config: &Config) -> ConfigResult<()> {
    if config.executor.command_timeout_secs == 0 {
        return Err(invalid(
            "executor.command_timeout_secs",
            "command_timeout_secs must be at least 1",
        ));
    }
    if config.executor.max_file_size == 0 {
        return Err(invalid(
            "executor.max_file_size",
            "max_file_size must be at least 1",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_undo_capacity_rejected() {
        let mut config = Config::default();
        config.undo.capacity = 0;
        assert_eq!(field_of(validate(&config)), "undo.capacity");
    }

    #[test]
    fn test_persist_limit_above_capacity_rejected() {
        let mut config = Config::default();
        config.activity.capacity = 100;
        config.activity.persist_limit = 200;
        assert_eq!(field_of(validate(&config)), "activity.persist_limit");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.executor.command_timeout_secs = 0;
        assert_eq!(field_of(validate(&config)), "executor.command_timeout_secs");
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
