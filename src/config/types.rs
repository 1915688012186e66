//! Configuration type definitions.

use serde::Deserialize;

use crate::common::types::Platform;

/// Default capacity of each inbound and outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub platforms: PlatformsConfig,
    pub coop: Option<CoopConfig>,
    pub emotes: Option<EmotesConfig>,
    pub suppression: Option<SuppressionConfig>,
    #[serde(default)]
    pub lookup: LookupConfig,
    pub queue_capacity: Option<usize>,
    pub mirror_clear: Option<bool>,
}

impl Config {
    /// Settings of one platform, if it is configured.
    pub fn platform(&self, platform: Platform) -> Option<&PlatformConfig> {
        match platform {
            Platform::Mixer => self.platforms.mixer.as_ref(),
            Platform::Twitch => self.platforms.twitch.as_ref(),
        }
    }

    /// All configured platforms, in a fixed order.
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.platform(*p).is_some())
            .collect()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn mirror_clear(&self) -> bool {
        self.mirror_clear.unwrap_or(false)
    }
}

/// Per-platform section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformsConfig {
    pub mixer: Option<PlatformConfig>,
    pub twitch: Option<PlatformConfig>,
}

/// Bot identity and relay targets for one platform.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Bot account name; events reported for it are never relayed.
    pub username: String,
    pub oauth: String,
    /// Joined channels; the first is the default destination.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Platforms that receive events originating here.
    #[serde(default)]
    pub relay_to: Vec<Platform>,
}

impl PlatformConfig {
    /// Default destination channel: the first configured channel, else the bot's own.
    pub fn default_channel(&self) -> &str {
        self.channels
            .first()
            .map(String::as_str)
            .unwrap_or(&self.username)
    }
}

/// The two channels that may be linked into a coop session.
#[derive(Debug, Clone, Deserialize)]
pub struct CoopConfig {
    pub platform: Platform,
    /// Streamer channel; only its owner may start coop.
    pub primary: String,
    pub secondary: String,
    #[serde(default)]
    pub greetings: CoopGreetings,
}

/// Emote tags used in coop announcements.
#[derive(Debug, Clone, Deserialize)]
pub struct CoopGreetings {
    #[serde(default = "default_primary_greeting")]
    pub primary: String,
    #[serde(default = "default_secondary_greeting")]
    pub secondary: String,
    #[serde(default = "default_counterpart_greeting")]
    pub counterpart: String,
}

fn default_primary_greeting() -> String {
    "TwitchUnity".to_string()
}

fn default_secondary_greeting() -> String {
    "lordafSun".to_string()
}

fn default_counterpart_greeting() -> String {
    ":mixerlove".to_string()
}

impl Default for CoopGreetings {
    fn default() -> Self {
        Self {
            primary: default_primary_greeting(),
            secondary: default_secondary_greeting(),
            counterpart: default_counterpart_greeting(),
        }
    }
}

/// Paths of the emote mapping tables, one per origin platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmotesConfig {
    pub mixer: Option<String>,
    pub twitch: Option<String>,
}

impl EmotesConfig {
    pub fn path(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Mixer => self.mixer.as_deref(),
            Platform::Twitch => self.twitch.as_deref(),
        }
    }
}

/// Extra suppression rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuppressionConfig {
    /// Regexes matched against the raw text of chat and action messages.
    pub patterns: Option<Vec<String>>,
}

/// Side-channel user lookup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_lookup_retries")]
    pub retries: usize,
}

fn default_lookup_base_url() -> String {
    "https://mixer.com/api/v1/users".to_string()
}

fn default_lookup_timeout() -> u64 {
    10
}

fn default_lookup_retries() -> usize {
    2
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_lookup_base_url(),
            timeout_secs: default_lookup_timeout(),
            retries: default_lookup_retries(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Twitch with two coop channels, Mixer relaying to it and back.
    pub fn make_test_config() -> Config {
        Config {
            platforms: PlatformsConfig {
                mixer: Some(PlatformConfig {
                    username: "LutraBot".to_string(),
                    oauth: "mixer_token".to_string(),
                    channels: vec!["lutra".to_string()],
                    relay_to: vec![Platform::Twitch],
                }),
                twitch: Some(PlatformConfig {
                    username: "lutrabot".to_string(),
                    oauth: "oauth:twitch_token".to_string(),
                    channels: vec!["#lutra".to_string(), "#otter".to_string()],
                    relay_to: vec![Platform::Mixer],
                }),
            },
            coop: Some(CoopConfig {
                platform: Platform::Twitch,
                primary: "#lutra".to_string(),
                secondary: "#otter".to_string(),
                greetings: CoopGreetings::default(),
            }),
            emotes: None,
            suppression: None,
            lookup: LookupConfig::default(),
            queue_capacity: None,
            mirror_clear: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::make_test_config;
    use super::*;

    #[test]
    fn test_default_channel_falls_back_to_username() {
        let mut config = make_test_config();
        assert_eq!(config.platform(Platform::Twitch).unwrap().default_channel(), "#lutra");

        config.platforms.mixer.as_mut().unwrap().channels.clear();
        assert_eq!(config.platform(Platform::Mixer).unwrap().default_channel(), "LutraBot");
    }

    #[test]
    fn test_configured_platforms() {
        let mut config = make_test_config();
        assert_eq!(config.configured_platforms(), vec![Platform::Mixer, Platform::Twitch]);

        config.platforms.mixer = None;
        assert_eq!(config.configured_platforms(), vec![Platform::Twitch]);
        assert!(config.platform(Platform::Mixer).is_none());
    }

    #[test]
    fn test_defaults() {
        let config = make_test_config();
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert!(!config.mirror_clear());
        assert_eq!(config.lookup.timeout_secs, 10);
        assert_eq!(CoopGreetings::default().counterpart, ":mixerlove");
    }
}
