//! Emote translation between platforms.
//!
//! Each origin platform has a table mapping its emote tokens to the
//! equivalent token on other platforms. Tables are JSON files of the form
//! `{ "<token>": { "<platform>": "<replacement>" } }`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::common::error::ConfigError;
use crate::common::types::Platform;
use crate::config::types::EmotesConfig;

/// One emote token and its replacements.
#[derive(Debug, Clone)]
struct EmoteEntry {
    token: String,
    replacements: HashMap<Platform, String>,
}

/// Emote table of a single origin platform.
///
/// Entries are ordered longest token first (ties broken lexicographically),
/// so a token that contains another one is matched as a whole.
#[derive(Debug, Clone, Default)]
pub struct EmoteTable {
    entries: Vec<EmoteEntry>,
}

impl EmoteTable {
    /// Build a table from a raw `token -> platform key -> replacement` map.
    ///
    /// Unknown platform keys are logged and skipped.
    pub fn from_raw(raw: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let mut entries: Vec<EmoteEntry> = raw
            .into_iter()
            .filter(|(token, _)| !token.is_empty())
            .map(|(token, targets)| {
                let replacements = targets
                    .into_iter()
                    .filter_map(|(platform, replacement)| match platform.parse::<Platform>() {
                        Ok(p) => Some((p, replacement)),
                        Err(_) => {
                            warn!("Unknown emote mapping destination '{}' for '{}'", platform, token);
                            None
                        }
                    })
                    .collect();
                EmoteEntry {
                    token,
                    replacements,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.token
                .len()
                .cmp(&a.token.len())
                .then_with(|| a.token.cmp(&b.token))
        });

        Self { entries }
    }

    /// Parse a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, BTreeMap<String, String>> =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError {
                message: format!("invalid emote table: {}", e),
            })?;
        Ok(Self::from_raw(raw))
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrites emote tokens for a destination platform.
#[derive(Debug, Clone, Default)]
pub struct EmoteTranslator {
    tables: HashMap<Platform, EmoteTable>,
}

impl EmoteTranslator {
    /// A translator without tables; passes all text through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every table named in the configuration.
    pub fn from_config(config: Option<&EmotesConfig>) -> Result<Self, ConfigError> {
        let mut translator = Self::empty();
        let Some(config) = config else {
            return Ok(translator);
        };

        for platform in Platform::ALL {
            if let Some(path) = config.path(platform) {
                let table = EmoteTable::load(path)?;
                if table.is_empty() {
                    warn!("Emote table {} for {} is empty", path, platform);
                }
                debug!("Loaded {} emotes for {} from {}", table.len(), platform, path);
                translator.insert(platform, table);
            }
        }

        Ok(translator)
    }

    /// Register the table of an origin platform.
    pub fn insert(&mut self, origin: Platform, table: EmoteTable) {
        self.tables.insert(origin, table);
    }

    /// Replace every known origin emote in `text` with its destination equivalent.
    ///
    /// A single left-to-right pass, so replacements are never re-translated.
    /// Tokens without a mapping for `destination` are copied unchanged.
    pub fn translate(&self, text: &str, origin: Platform, destination: Platform) -> String {
        if origin == destination {
            return text.to_string();
        }
        let Some(table) = self.tables.get(&origin) else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        'scan: while !rest.is_empty() {
            for entry in &table.entries {
                if rest.starts_with(entry.token.as_str()) {
                    match entry.replacements.get(&destination) {
                        Some(replacement) => out.push_str(replacement),
                        None => {
                            debug!(
                                "No {} mapping for {} emote '{}'",
                                destination, origin, entry.token
                            );
                            out.push_str(&entry.token);
                        }
                    }
                    rest = &rest[entry.token.len()..];
                    continue 'scan;
                }
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        out
    }
}
