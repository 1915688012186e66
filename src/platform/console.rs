//! Console event source.
//!
//! Reads chat activity from stdin so the relay can be run and observed
//! without live chat services. One event per line:
//!
//! ```text
//! <platform> <channel> <login> <text>
//! twitch #lutra ann hello there
//! twitch #lutra ann /me waves
//! twitch #lutra - /clear
//! mixer lutra ann /skill Confetti 100 sparks
//! mixer lutra - /gif 12345 Party 50 sparks
//! mixer lutra lutra /poll Next game? | Celeste | Hades
//! mixer lutra - /pollend Celeste=3 Hades=5
//! ```

use std::collections::HashMap;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info, warn};

use crate::common::error::{RelayError, RelayResult};
use crate::common::types::{
    ChatEvent, ChatMessage, ChatUser, EventKind, Platform, PollEnd, PollStart, Skill, SkillKind,
};

/// Poll duration used for console polls.
const CONSOLE_POLL_DURATION_MS: u64 = 60_000;

/// Feeds stdin lines into the inbound queue of the matching platform.
pub struct ConsoleSource {
    inbound: HashMap<Platform, mpsc::Sender<ChatEvent>>,
}

impl ConsoleSource {
    pub fn new(inbound: HashMap<Platform, mpsc::Sender<ChatEvent>>) -> Self {
        Self { inbound }
    }

    /// Read stdin until EOF or shutdown.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
        info!("Console source ready: <platform> <channel> <login> <text>");

        loop {
            let line = tokio::select! {
                line = lines.next() => line,
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            };

            let line = match line {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("Failed to read console line: {}", e);
                    continue;
                }
                None => break,
            };

            match parse_line(&line) {
                Ok(Some(event)) => self.dispatch(event).await,
                Ok(None) => {}
                Err(e) => warn!("Dropping console line: {}", e),
            }
        }

        info!("Console source ended");
    }

    async fn dispatch(&self, event: ChatEvent) {
        let Some(tx) = self.inbound.get(&event.origin) else {
            warn!("{}", RelayError::UnknownOrigin {
                platform: event.origin.key().to_string(),
            });
            return;
        };
        if let Err(e) = tx.send(event).await {
            debug!("Inbound queue closed: {}", e);
        }
    }
}

/// Parse one console line. Blank lines and `//` comments yield `None`.
pub fn parse_line(line: &str) -> RelayResult<Option<ChatEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }

    let mut parts = line.splitn(4, ' ');
    let origin: Platform = parts.next().unwrap_or_default().parse()?;
    let (Some(channel), Some(login)) = (parts.next(), parts.next()) else {
        return Err(malformed(line));
    };
    let text = parts.next().unwrap_or_default();
    let user = (login != "-").then(|| ChatUser::new(login, login));

    let kind = if let Some(action) = text.strip_prefix("/me ") {
        EventKind::ActionMessage(ChatMessage::plain(action))
    } else if text == "/clear" {
        EventKind::ClearChat
    } else if let Some(args) = text.strip_prefix("/skill ") {
        EventKind::Attribution(parse_skill(args).ok_or_else(|| malformed(line))?)
    } else if let Some(args) = text.strip_prefix("/gif ") {
        let (id, rest) = args.split_once(' ').ok_or_else(|| malformed(line))?;
        let triggering_user_id = id.parse().map_err(|_| malformed(line))?;
        let skill = parse_skill(rest).ok_or_else(|| malformed(line))?;
        EventKind::DeferredAttribution {
            triggering_user_id,
            skill,
        }
    } else if let Some(args) = text.strip_prefix("/poll ") {
        let mut fields = args.split('|').map(str::trim);
        let question = fields.next().unwrap_or_default().to_string();
        EventKind::PollStart(PollStart {
            initiator: login.to_string(),
            question,
            answers: fields.map(String::from).collect(),
            duration_ms: CONSOLE_POLL_DURATION_MS,
        })
    } else if let Some(args) = text.strip_prefix("/pollend") {
        let responses = args
            .split_whitespace()
            .map(|pair| {
                let (answer, votes) = pair.split_once('=')?;
                Some((answer.to_string(), votes.parse().ok()?))
            })
            .collect::<Option<Vec<(String, u64)>>>()
            .ok_or_else(|| malformed(line))?;
        let voters = responses.iter().map(|(_, v)| v).sum();
        EventKind::PollEnd(PollEnd {
            question: String::new(),
            responses,
            voters,
        })
    } else {
        EventKind::PlainMessage(ChatMessage::plain(text))
    };

    Ok(Some(ChatEvent::new(origin, channel, user, kind)))
}

/// `<name> <cost> <currency>`, where the name may contain spaces.
fn parse_skill(args: &str) -> Option<Skill> {
    let mut words = args.rsplitn(3, ' ');
    let currency = words.next()?.to_string();
    let cost = words.next()?.parse().ok()?;
    let skill_name = words.next()?.to_string();
    Some(Skill {
        skill_name,
        cost,
        currency,
        kind: SkillKind::Standard,
    })
}

fn malformed(line: &str) -> RelayError {
    RelayError::UnknownEventKind {
        kind: format!("malformed console line '{}'", line),
    }
}
