//! Configuration validation

use super::*;
use crate::error::{FilterError, Result};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty", "compact"];

/// Validate complete configuration
pub fn validate_config(config: &FilterConfig) -> Result<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validate logging configuration
pub fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if !LOG_LEVELS.contains(&config.level.to_lowercase().as_str()) {
        return Err(FilterError::Config(format!(
            "Invalid log level '{}' (expected one of: {})",
            config.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if !LOG_FORMATS.contains(&config.format.as_str()) {
        return Err(FilterError::Config(format!(
            "Invalid log format '{}' (expected one of: {})",
            config.format,
            LOG_FORMATS.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = FilterConfig::default_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = FilterConfig::default_config();
        config.logging.level = "DEBUG".to_string();

        assert!(validate_logging_config(&config.logging).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = FilterConfig::default_config();
        config.logging.level = "verbose".to_string();

        assert!(validate_logging_config(&config.logging).is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = FilterConfig::default_config();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            validate_config(&config),
            Err(FilterError::Config(_))
        ));
    }
}
