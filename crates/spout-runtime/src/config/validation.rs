//! Configuration validation utilities.
//!
//! Source options (`port`, `handler`, ...) are validated by the source itself
//! when it is configured; this module only checks the runtime sections.

use super::error::{ConfigLoadError, ConfigLoadResult};
use super::schema::{ChannelConfig, LogOutput, LoggingConfig, SourceConfig, SpoutConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SpoutConfig) -> ConfigLoadResult<()> {
    validate_logging_config(&config.logging)?;
    validate_source_config(&config.source)?;
    validate_channel_config(&config.channel)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigLoadResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigLoadError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_source_config(source: &SourceConfig) -> ConfigLoadResult<()> {
    if source.name.is_empty() {
        return Err(ConfigLoadError::missing_field("source.name"));
    }

    if source.name.contains(char::is_whitespace) {
        return Err(ConfigLoadError::validation(
            "Source name cannot contain whitespace",
        ));
    }

    Ok(())
}

fn validate_channel_config(channel: &ChannelConfig) -> ConfigLoadResult<()> {
    if channel.capacity == 0 {
        return Err(ConfigLoadError::validation(
            "Channel capacity must be greater than 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SpoutConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = SpoutConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigLoadError::MissingField { .. })
        ));

        config.logging.file_path = Some("spout.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = SpoutConfig::default();
        config.channel.capacity = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigLoadError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_source_name() {
        let mut config = SpoutConfig::default();
        config.source.name = "my source".to_string();
        assert!(validate_config(&config).is_err());
    }
}
