//! Configuration validation.

use std::collections::HashSet;

use onelink_adapter_onebot::OneBotHttpConfig;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, OnelinkConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &OnelinkConfig) -> ConfigResult<()> {
    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    let mut seen = HashSet::new();
    for bot in &config.bots {
        validate_bot(bot)?;
        if !seen.insert(bot.self_id.as_str()) {
            return Err(ConfigError::DuplicateBotId(bot.self_id.clone()));
        }
    }
    Ok(())
}

fn validate_bot(bot: &OneBotHttpConfig) -> ConfigResult<()> {
    if bot.self_id.trim().is_empty() {
        return Err(ConfigError::validation("bot self_id must not be empty"));
    }

    if let Some(endpoint) = bot.transport.endpoint()
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ConfigError::validation(format!(
            "bot {}: endpoint must start with http:// or https://, got {endpoint}",
            bot.self_id
        )));
    }

    if bot.transport.timeout_ms == 0 {
        return Err(ConfigError::validation(format!(
            "bot {}: timeout_ms must be greater than 0",
            bot.self_id
        )));
    }

    Ok(())
}
