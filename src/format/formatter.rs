//! Event formatting for display.
//!
//! Renders a normalized [`ChatEvent`] into the single line of text that is
//! relayed to other chat surfaces.

use tracing::warn;

use crate::common::error::{RelayError, RelayResult};
use crate::common::types::{
    channel_label, ChatEvent, ChatMessage, EventKind, Platform, PollEnd, PollStart, Segment, Skill,
};

/// Render an event as relay text.
///
/// `coop_active` only changes the origin tag of chat and action messages.
/// Events that are not displayable on their own (coop commands, attributions
/// still waiting for a user lookup) fail with `UnknownEventKind`.
pub fn format_event(event: &ChatEvent, coop_active: bool) -> RelayResult<String> {
    match &event.kind {
        EventKind::PlainMessage(msg) => Ok(format_message(event, msg, false, coop_active)),
        EventKind::ActionMessage(msg) => Ok(format_message(event, msg, true, coop_active)),
        EventKind::Attribution(skill) => Ok(format_attribution(
            event.display_name(),
            event.origin,
            skill,
        )),
        EventKind::PollStart(poll) => Ok(format_poll_start(event.origin, poll)),
        EventKind::PollEnd(poll) => Ok(format_poll_end(event.origin, poll)),
        EventKind::ClearChat => Ok(format!("Chat was cleared on {}", event.origin)),
        kind @ (EventKind::DeferredAttribution { .. } | EventKind::CoopControl(_)) => {
            Err(RelayError::UnknownEventKind {
                kind: kind.name().to_string(),
            })
        }
    }
}

/// Origin marker appended to chat messages.
pub fn origin_tag(origin: Platform, channel: &str, coop_active: bool) -> String {
    if coop_active {
        format!("[{}@{}]", channel_label(channel), origin.name())
    } else {
        origin.short_tag().to_string()
    }
}

fn format_message(event: &ChatEvent, msg: &ChatMessage, action: bool, coop_active: bool) -> String {
    let mut out = String::from(event.display_name());

    // Action messages and stickers read as "<name> <does something>"
    if action || msg.meta.me || msg.meta.is_skill {
        out.push(' ');
    } else {
        out.push_str(": ");
    }

    for segment in &msg.segments {
        match segment {
            Segment::Text { data } => out.push_str(data),
            Segment::Emoticon { text } | Segment::Tag { text } => out.push_str(text),
            Segment::Link { url } => out.push_str(url),
            Segment::Image { text } => {
                out.push_str(&format!("used a sticker on {}: {}", event.origin, text));
                if let Some(ref skill) = msg.meta.skill {
                    out.push_str(&format!(" ({} {})", skill.cost, skill.currency));
                }
            }
            Segment::Unknown => {
                let err = RelayError::UnknownEventKind {
                    kind: format!("{} segment", segment.kind()),
                };
                warn!(origin = %event.origin, "{}", err);
            }
        }
    }

    out.push(' ');
    out.push_str(&origin_tag(event.origin, &event.channel, coop_active));
    out
}

/// `"<name> used a skill on <Platform>: <skill> (<cost> <currency>)"`.
pub fn format_attribution(display_name: &str, origin: Platform, skill: &Skill) -> String {
    format!(
        "{} used a skill on {}: {} ({} {})",
        display_name, origin, skill.skill_name, skill.cost, skill.currency
    )
}

fn format_poll_start(origin: Platform, poll: &PollStart) -> String {
    let seconds = poll.duration_ms.div_ceil(1000);
    let mut out = format!(
        "{} started a poll on {}: {} ({} seconds)",
        poll.initiator, origin, poll.question, seconds
    );
    if !poll.answers.is_empty() {
        out.push_str(&format!(" Options: {}.", poll.answers.join(", ")));
    }
    out
}

fn format_poll_end(origin: Platform, poll: &PollEnd) -> String {
    match poll_winners(&poll.responses) {
        None => format!("Poll ended on {} without any votes.", origin),
        Some((winners, votes)) if winners.len() == 1 => format!(
            "Poll ended on {}! Winner: {} with {} votes out of {} voters.",
            origin, winners[0], votes, poll.voters
        ),
        Some((winners, votes)) => format!(
            "Poll ended on {}! It's a tie between {} with {} votes each out of {} voters.",
            origin,
            winners.join(", "),
            votes,
            poll.voters
        ),
    }
}

/// Every answer holding the maximum vote count, in answer order, plus that count.
///
/// Returns `None` when there are no responses at all.
pub fn poll_winners(responses: &[(String, u64)]) -> Option<(Vec<&str>, u64)> {
    let max = responses.iter().map(|(_, votes)| *votes).max()?;
    let winners = responses
        .iter()
        .filter(|(_, votes)| *votes == max)
        .map(|(answer, _)| answer.as_str())
        .collect();
    Some((winners, max))
}
