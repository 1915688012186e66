//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `LUTRA_TWITCH_USERNAME` / `LUTRA_TWITCH_OAUTH` - Twitch bot identity
//! - `LUTRA_MIXER_USERNAME` / `LUTRA_MIXER_OAUTH` - Mixer bot identity

use std::env;

use crate::common::types::Platform;
use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "LUTRA";

/// Apply environment variable overrides to a config.
///
/// Only platforms already present in the file are touched.
pub fn apply_env_overrides(mut config: Config) -> Config {
    for platform in Platform::ALL {
        let key = platform.key().to_uppercase();
        let section = match platform {
            Platform::Mixer => config.platforms.mixer.as_mut(),
            Platform::Twitch => config.platforms.twitch.as_mut(),
        };
        let Some(section) = section else {
            continue;
        };

        if let Ok(username) = env::var(format!("{}_{}_USERNAME", ENV_PREFIX, key)) {
            section.username = username;
        }
        if let Ok(oauth) = env::var(format!("{}_{}_OAUTH", ENV_PREFIX, key)) {
            section.oauth = oauth;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `LUTRA_CONFIG` environment variable, otherwise returns "lutrabot.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "lutrabot.conf".to_string())
}
