//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::common::types::Platform;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.configured_platforms().is_empty() {
        errors.push("at least one of platforms.mixer / platforms.twitch is required".to_string());
    }

    for platform in config.configured_platforms() {
        let Some(section) = config.platform(platform) else {
            continue;
        };
        let key = platform.key();

        if section.username.is_empty() {
            errors.push(format!("platforms.{}.username is required", key));
        }
        if section.oauth.is_empty() {
            errors.push(format!("platforms.{}.oauth is required", key));
        }
        if section.oauth.starts_with("YOUR_") {
            errors.push(format!(
                "platforms.{}.oauth has not been configured (still using placeholder)",
                key
            ));
        }
        if platform == Platform::Twitch {
            for (i, channel) in section.channels.iter().enumerate() {
                if !channel.starts_with('#') {
                    errors.push(format!(
                        "platforms.twitch.channels[{}] '{}' must start with '#'",
                        i, channel
                    ));
                }
            }
        }
        for (i, target) in section.relay_to.iter().enumerate() {
            if *target == platform {
                errors.push(format!("platforms.{}.relay_to[{}] relays to itself", key, i));
            } else if config.platform(*target).is_none() {
                errors.push(format!(
                    "platforms.{}.relay_to[{}] names '{}', which is not configured",
                    key,
                    i,
                    target.key()
                ));
            }
        }
    }

    if let Some(ref coop) = config.coop {
        match config.platform(coop.platform) {
            None => errors.push(format!(
                "coop.platform '{}' is not configured",
                coop.platform.key()
            )),
            Some(section) => {
                if !coop.primary.eq_ignore_ascii_case(section.default_channel()) {
                    errors.push(format!(
                        "coop.primary '{}' must be the default channel '{}' of {}",
                        coop.primary,
                        section.default_channel(),
                        coop.platform.key()
                    ));
                }
                if !section
                    .channels
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&coop.secondary))
                {
                    errors.push(format!(
                        "coop.secondary '{}' is not in platforms.{}.channels",
                        coop.secondary,
                        coop.platform.key()
                    ));
                }
            }
        }
        if coop.primary.eq_ignore_ascii_case(&coop.secondary) {
            errors.push("coop.primary and coop.secondary must differ".to_string());
        }
    }

    if let Some(ref suppression) = config.suppression {
        if let Some(ref patterns) = suppression.patterns {
            for (i, pattern) in patterns.iter().enumerate() {
                if fancy_regex::Regex::new(pattern).is_err() {
                    errors.push(format!(
                        "suppression.patterns[{}] is not a valid regex: '{}'",
                        i, pattern
                    ));
                }
            }
        }
    }

    if config.queue_capacity == Some(0) {
        errors.push("queue_capacity must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
