//! Shared types used across the application.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::error::RelayError;

/// A chat service the relay is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mixer,
    Twitch,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Mixer, Platform::Twitch];

    /// Human-readable service name, as used in relayed text.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mixer => "Mixer",
            Self::Twitch => "Twitch",
        }
    }

    /// Configuration key for this platform.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Mixer => "mixer",
            Self::Twitch => "twitch",
        }
    }

    /// Short origin marker appended to relayed messages outside of coop.
    pub fn short_tag(&self) -> &'static str {
        match self {
            Self::Mixer => "[M]",
            Self::Twitch => "[T]",
        }
    }

    /// Public URL prefix of a channel page.
    pub fn channel_url_base(&self) -> &'static str {
        match self {
            Self::Mixer => "https://mixer.com/",
            Self::Twitch => "https://twitch.tv/",
        }
    }

    /// The channel a user owns on this platform.
    ///
    /// Twitch IRC channels are `#login`; Mixer channels are named after the user.
    pub fn home_channel(&self, login: &str) -> String {
        match self {
            Self::Mixer => login.to_lowercase(),
            Self::Twitch => format!("#{}", login.to_lowercase()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mixer" | "m" => Ok(Self::Mixer),
            "twitch" | "t" => Ok(Self::Twitch),
            _ => Err(RelayError::UnknownOrigin {
                platform: s.to_string(),
            }),
        }
    }
}

/// Strip the IRC `#` prefix from a channel name.
pub fn channel_label(channel: &str) -> &str {
    channel.trim_start_matches('#')
}

/// A destination chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingTarget {
    pub platform: Platform,
    pub channel: String,
}

impl RoutingTarget {
    pub fn new(platform: Platform, channel: impl Into<String>) -> Self {
        Self {
            platform,
            channel: channel.into(),
        }
    }
}

impl fmt::Display for RoutingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform.key(), self.channel)
    }
}

/// The user an event is reported for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Account name, used for identity checks.
    pub login: String,
    /// Name shown in relayed text.
    pub display_name: String,
}

impl ChatUser {
    pub fn new(login: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            display_name: display_name.into(),
        }
    }
}

/// One piece of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text { data: String },
    Emoticon { text: String },
    Link { url: String },
    Tag { text: String },
    /// A sticker; its price lives in the message metadata.
    Image { text: String },
    #[serde(other)]
    Unknown,
}

impl Segment {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    /// Kind name as reported by the service.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Emoticon { .. } => "emoticon",
            Self::Link { .. } => "link",
            Self::Tag { .. } => "tag",
            Self::Image { .. } => "image",
            Self::Unknown => "unknown",
        }
    }
}

/// What a paid interactive feature was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    #[default]
    Standard,
    Sticker,
    /// A GIF seen on the chat socket. The side-channel subscription reports
    /// the same redemption with more detail as a deferred attribution.
    Gif,
}

/// A paid interactive feature ("skill") and its price.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Skill {
    pub skill_name: String,
    pub cost: u64,
    pub currency: String,
    #[serde(default)]
    pub kind: SkillKind,
}

/// Chat message metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageMeta {
    /// `/me` style message.
    #[serde(default)]
    pub me: bool,
    /// Message was sent through a skill (e.g. a sticker).
    #[serde(default)]
    pub is_skill: bool,
    #[serde(default)]
    pub skill: Option<Skill>,
}

/// Body of a plain or action chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub meta: MessageMeta,
}

impl ChatMessage {
    /// Build a message consisting of a single text segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
            meta: MessageMeta::default(),
        }
    }

    /// Concatenated text of all text segments, used for command and pattern matching.
    pub fn raw_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text { data } => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A poll that just opened (or is still running).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStart {
    pub initiator: String,
    pub question: String,
    pub answers: Vec<String>,
    pub duration_ms: u64,
}

/// Final poll results, in answer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEnd {
    pub question: String,
    pub responses: Vec<(String, u64)>,
    pub voters: u64,
}

/// Coop linking commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoopCommand {
    Start,
    End,
}

impl CoopCommand {
    /// Recognize a chat line that is exactly a coop command.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "!startcoop" => Some(Self::Start),
            "!endcoop" => Some(Self::End),
            _ => None,
        }
    }
}

/// Event payload, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PlainMessage(ChatMessage),
    ActionMessage(ChatMessage),
    Attribution(Skill),
    /// Attribution whose user is known only by id and must be looked up.
    DeferredAttribution { triggering_user_id: u64, skill: Skill },
    PollStart(PollStart),
    PollEnd(PollEnd),
    ClearChat,
    CoopControl(CoopCommand),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlainMessage(_) => "PlainMessage",
            Self::ActionMessage(_) => "ActionMessage",
            Self::Attribution(_) => "Attribution",
            Self::DeferredAttribution { .. } => "DeferredAttribution",
            Self::PollStart(_) => "PollStart",
            Self::PollEnd(_) => "PollEnd",
            Self::ClearChat => "ClearChat",
            Self::CoopControl(_) => "CoopControl",
        }
    }
}

/// A normalized event as emitted by a platform adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub origin: Platform,
    /// Channel the event was observed in.
    pub channel: String,
    /// Reporting user, if the event has one.
    pub user: Option<ChatUser>,
    pub kind: EventKind,
}

impl ChatEvent {
    pub fn new(
        origin: Platform,
        channel: impl Into<String>,
        user: Option<ChatUser>,
        kind: EventKind,
    ) -> Self {
        Self {
            origin,
            channel: channel.into(),
            user,
            kind,
        }
    }

    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.display_name.as_str())
            .unwrap_or("")
    }
}
