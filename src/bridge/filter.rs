//! Event suppression rules.
//!
//! Every inbound event is checked against one declared rule table before it is
//! formatted. The table always contains the self-echo rule and the duplicate
//! GIF attribution rule; deployments may add regex patterns on message text.
//!
//! Identity rules apply to everything the relay sees. Content rules are
//! checked only after coop commands have been taken out, so a pattern can
//! never swallow `!startcoop` or `!endcoop`.

use std::collections::HashMap;

use fancy_regex::Regex;
use tracing::warn;

use crate::common::types::{ChatEvent, EventKind, Platform, SkillKind};
use crate::config::types::Config;

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    original: String,
    regex: Regex,
}

/// One suppression rule.
#[derive(Debug, Clone)]
pub enum SuppressionRule {
    /// Drop events reported for the relay's own bot identity on that platform.
    SelfEcho,
    /// Drop generic GIF attributions; the side channel reports them with more detail.
    GifAttribution,
    /// Drop chat/action messages whose raw text matches.
    Pattern(CompiledPattern),
}

impl SuppressionRule {
    pub fn name(&self) -> &str {
        match self {
            Self::SelfEcho => "self-echo",
            Self::GifAttribution => "gif-attribution",
            Self::Pattern(p) => &p.original,
        }
    }

    /// Rules that look at who reported the event rather than what it says.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::SelfEcho)
    }

    fn matches(&self, event: &ChatEvent, identities: &HashMap<Platform, String>) -> bool {
        match self {
            Self::SelfEcho => {
                let (Some(user), Some(identity)) = (&event.user, identities.get(&event.origin))
                else {
                    return false;
                };
                user.login.eq_ignore_ascii_case(identity)
                    || user.display_name.eq_ignore_ascii_case(identity)
            }
            Self::GifAttribution => matches!(
                &event.kind,
                EventKind::Attribution(skill) if skill.kind == SkillKind::Gif
            ),
            Self::Pattern(p) => {
                let text = match &event.kind {
                    EventKind::PlainMessage(msg) | EventKind::ActionMessage(msg) => msg.raw_text(),
                    _ => return false,
                };
                p.regex.is_match(&text).unwrap_or_else(|e| {
                    warn!("Regex match error for pattern '{}': {}", p.original, e);
                    false
                })
            }
        }
    }
}

/// Ordered rule table plus the bot identities the self-echo rule compares against.
#[derive(Debug, Clone)]
pub struct SuppressionTable {
    rules: Vec<SuppressionRule>,
    identities: HashMap<Platform, String>,
}

impl SuppressionTable {
    /// Standard rules followed by the given patterns.
    ///
    /// Invalid regex patterns are logged and skipped.
    pub fn new(identities: HashMap<Platform, String>, patterns: Option<Vec<String>>) -> Self {
        let mut rules = vec![SuppressionRule::SelfEcho, SuppressionRule::GifAttribution];
        rules.extend(
            compile_patterns(patterns.unwrap_or_default())
                .into_iter()
                .map(SuppressionRule::Pattern),
        );
        Self { rules, identities }
    }

    /// Build the table from bot identities and `suppression.patterns`.
    pub fn from_config(config: &Config) -> Self {
        let identities = config
            .configured_platforms()
            .into_iter()
            .filter_map(|p| config.platform(p).map(|c| (p, c.username.clone())))
            .collect();
        let patterns = config
            .suppression
            .as_ref()
            .and_then(|s| s.patterns.clone());
        Self::new(identities, patterns)
    }

    /// First identity rule that suppresses the event, if any.
    pub fn check_identity(&self, event: &ChatEvent) -> Option<&SuppressionRule> {
        self.find(event, true)
    }

    /// First content rule that suppresses the event, if any.
    pub fn check_content(&self, event: &ChatEvent) -> Option<&SuppressionRule> {
        self.find(event, false)
    }

    fn find(&self, event: &ChatEvent, identity: bool) -> Option<&SuppressionRule> {
        self.rules
            .iter()
            .filter(|rule| rule.is_identity() == identity)
            .find(|rule| rule.matches(event, &self.identities))
    }

    pub fn rules(&self) -> &[SuppressionRule] {
        &self.rules
    }
}

/// Compile a list of regex pattern strings, skipping invalid ones.
fn compile_patterns(patterns: Vec<String>) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledPattern {
                original: pattern,
                regex,
            }),
            Err(e) => {
                warn!("Invalid suppression regex pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}
