//! Relay routing.
//!
//! The router makes the single decision of who receives an event and in what
//! form. It owns the session state, so every routing decision sees the coop
//! and poll flags exactly as the previous event left them.

use tracing::{debug, info};

use crate::bridge::filter::{SuppressionRule, SuppressionTable};
use crate::bridge::state::SessionState;
use crate::common::error::{RelayError, RelayResult};
use crate::common::messages::Delivery;
use crate::common::types::{channel_label, ChatEvent, CoopCommand, EventKind, Platform, RoutingTarget};
use crate::config::types::{Config, CoopConfig};
use crate::format::emotes::EmoteTranslator;
use crate::format::formatter::format_event;

/// Decides destinations for every inbound event.
#[derive(Debug)]
pub struct RelayRouter {
    config: Config,
    state: SessionState,
    suppression: SuppressionTable,
    emotes: EmoteTranslator,
}

impl RelayRouter {
    /// Create a router from configuration and loaded emote tables.
    pub fn new(config: Config, emotes: EmoteTranslator) -> Self {
        let suppression = SuppressionTable::from_config(&config);
        debug!("{} suppression rules active", suppression.rules().len());
        Self {
            config,
            state: SessionState::new(),
            suppression,
            emotes,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Compute the deliveries for one event.
    ///
    /// An empty list means the event was intentionally dropped (suppressed,
    /// unlinked channel, repeated poll signal, unauthorized coop command).
    pub fn route(&mut self, event: &ChatEvent) -> RelayResult<Vec<Delivery>> {
        if self.config.platform(event.origin).is_none() {
            return Err(RelayError::UnknownOrigin {
                platform: event.origin.key().to_string(),
            });
        }

        if let Some(rule) = self.suppression.check_identity(event) {
            self.log_suppressed(event, rule);
            return Ok(Vec::new());
        }

        if let Some(command) = self.coop_command(event) {
            return Ok(self.handle_coop(event, command));
        }

        if let Some(rule) = self.suppression.check_content(event) {
            self.log_suppressed(event, rule);
            return Ok(Vec::new());
        }

        match &event.kind {
            EventKind::PollStart(_) if !self.state.open_poll() => {
                debug!(origin = %event.origin, "Poll already open, ignoring repeated start");
                return Ok(Vec::new());
            }
            EventKind::PollEnd(_) if !self.state.close_poll() => {
                debug!(origin = %event.origin, "No poll open, ignoring end");
                return Ok(Vec::new());
            }
            _ => {}
        }

        let targets = self.targets_for(event.origin, &event.channel);
        if targets.is_empty() {
            debug!(
                origin = %event.origin,
                channel = %event.channel,
                "No relay target for {}",
                event.kind.name()
            );
            return Ok(Vec::new());
        }

        let text = format_event(event, self.state.coop_active())?;
        let mirror_clear = matches!(event.kind, EventKind::ClearChat) && self.config.mirror_clear();

        let mut deliveries = Vec::with_capacity(targets.len());
        for target in targets {
            let translated = self.emotes.translate(&text, event.origin, target.platform);
            info!(
                origin = %event.origin,
                target = %target,
                "{} -> {}: {}",
                event.origin,
                target.platform,
                translated
            );
            if mirror_clear {
                deliveries.push(Delivery::clear(target.clone()));
            }
            deliveries.push(Delivery::send(target, translated));
        }

        Ok(deliveries)
    }

    fn log_suppressed(&self, event: &ChatEvent, rule: &SuppressionRule) {
        debug!(
            origin = %event.origin,
            channel = %event.channel,
            rule = rule.name(),
            "Suppressed {}",
            event.kind.name()
        );
    }

    /// Destinations for an event seen on `channel` of `origin`.
    ///
    /// - every `relay_to` platform receives it in its default channel
    /// - while coop is active, the coop platform also receives it in the secondary channel
    /// - while coop is active, events from one coop channel go to the other one
    /// - events from the secondary coop channel go nowhere while coop is inactive
    pub fn targets_for(&self, origin: Platform, channel: &str) -> Vec<RoutingTarget> {
        let Some(origin_config) = self.config.platform(origin) else {
            return Vec::new();
        };
        let coop = self.config.coop.as_ref();
        let active = self.state.coop_active();
        let origin_is_coop = coop.is_some_and(|c| c.platform == origin);

        if let Some(coop) = coop.filter(|_| origin_is_coop) {
            let linked = channel.eq_ignore_ascii_case(&coop.primary)
                || (active && channel.eq_ignore_ascii_case(&coop.secondary));
            if !linked {
                return Vec::new();
            }
        }

        let mut targets: Vec<RoutingTarget> = Vec::new();
        let mut push = |target: RoutingTarget| {
            let duplicate = targets.iter().any(|t| {
                t.platform == target.platform && t.channel.eq_ignore_ascii_case(&target.channel)
            });
            if !duplicate {
                targets.push(target);
            }
        };

        for destination in &origin_config.relay_to {
            let Some(dest_config) = self.config.platform(*destination) else {
                debug!(origin = %origin, "Relay destination {} is not configured", destination);
                continue;
            };
            push(RoutingTarget::new(*destination, dest_config.default_channel()));
            if let Some(coop) = coop.filter(|c| active && c.platform == *destination) {
                push(RoutingTarget::new(*destination, coop.secondary.as_str()));
            }
        }

        if let Some(coop) = coop.filter(|_| active && origin_is_coop) {
            for linked in [&coop.primary, &coop.secondary] {
                if !linked.eq_ignore_ascii_case(channel) {
                    push(RoutingTarget::new(origin, linked.as_str()));
                }
            }
        }

        targets
    }

    /// Coop command carried by the event, if it is one on the coop platform.
    fn coop_command(&self, event: &ChatEvent) -> Option<CoopCommand> {
        let command = match &event.kind {
            EventKind::CoopControl(command) => *command,
            EventKind::PlainMessage(msg) => CoopCommand::parse(&msg.raw_text())?,
            _ => return None,
        };
        match self.config.coop.as_ref() {
            Some(coop) if coop.platform == event.origin => Some(command),
            // Without coop on this platform the text is ordinary chat
            _ if matches!(event.kind, EventKind::PlainMessage(_)) => None,
            _ => {
                debug!(origin = %event.origin, "Coop is not configured for this platform");
                Some(command)
            }
        }
    }

    fn handle_coop(&mut self, event: &ChatEvent, command: CoopCommand) -> Vec<Delivery> {
        let Some(coop) = self.config.coop.as_ref().filter(|c| c.platform == event.origin) else {
            return Vec::new();
        };
        let Some(user) = event.user.as_ref() else {
            return Vec::new();
        };

        let home = coop.platform.home_channel(&user.login);
        let authorized = match command {
            CoopCommand::Start => home.eq_ignore_ascii_case(&coop.primary),
            CoopCommand::End => {
                home.eq_ignore_ascii_case(&coop.primary) || home.eq_ignore_ascii_case(&coop.secondary)
            }
        };
        if !authorized {
            debug!(user = %user.login, ?command, "Ignoring unauthorized coop command");
            return Vec::new();
        }

        let changed = match command {
            CoopCommand::Start => self.state.enter_coop(),
            CoopCommand::End => self.state.exit_coop(),
        };
        if !changed {
            debug!(user = %user.login, ?command, "Coop already in requested state");
            return Vec::new();
        }

        info!(
            user = %user.login,
            primary = %coop.primary,
            secondary = %coop.secondary,
            "Coop {}",
            if self.state.coop_active() { "started" } else { "ended" }
        );

        coop_announcements(&self.config, coop, command)
    }
}

/// Fixed announcements sent to both coop channels and every counterpart default channel.
fn coop_announcements(config: &Config, coop: &CoopConfig, command: CoopCommand) -> Vec<Delivery> {
    let verb = match command {
        CoopCommand::Start => "linked",
        CoopCommand::End => "ended",
    };
    let base = coop.platform.channel_url_base();
    let primary = channel_label(&coop.primary);
    let secondary = channel_label(&coop.secondary);
    let greetings = &coop.greetings;

    let mut deliveries = vec![
        Delivery::send(
            RoutingTarget::new(coop.platform, coop.primary.as_str()),
            format!(
                "{} Coop chat {} with {}{} {}",
                greetings.primary, verb, base, secondary, greetings.secondary
            ),
        ),
        Delivery::send(
            RoutingTarget::new(coop.platform, coop.secondary.as_str()),
            format!(
                "{} Coop chat {} with {}{} {}",
                greetings.secondary, verb, base, primary, greetings.primary
            ),
        ),
    ];

    let counterparts = config
        .platform(coop.platform)
        .map(|c| c.relay_to.as_slice())
        .unwrap_or_default();
    for destination in counterparts {
        if let Some(dest_config) = config.platform(*destination) {
            deliveries.push(Delivery::send(
                RoutingTarget::new(*destination, dest_config.default_channel()),
                format!(
                    "{} Coop chat {} with {}{}",
                    greetings.counterpart, verb, base, secondary
                ),
            ));
        }
    }

    deliveries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::state::PollState;
    use crate::common::messages::DeliveryAction;
    use crate::common::types::{ChatMessage, ChatUser, PollEnd, PollStart, Skill, SkillKind};
    use crate::config::types::fixtures::make_test_config;
    use crate::format::emotes::EmoteTable;

    fn make_router() -> RelayRouter {
        RelayRouter::new(make_test_config(), EmoteTranslator::empty())
    }

    fn chat(origin: Platform, channel: &str, login: &str, text: &str) -> ChatEvent {
        ChatEvent::new(
            origin,
            channel,
            Some(ChatUser::new(login, login)),
            EventKind::PlainMessage(ChatMessage::plain(text)),
        )
    }

    fn sends(deliveries: &[Delivery]) -> Vec<(Platform, &str, &str)> {
        deliveries
            .iter()
            .filter_map(|d| d.text().map(|t| (d.target.platform, d.target.channel.as_str(), t)))
            .collect()
    }

    fn start_coop(router: &mut RelayRouter) {
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop"))
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    fn poll_start() -> ChatEvent {
        ChatEvent::new(
            Platform::Mixer,
            "lutra",
            None,
            EventKind::PollStart(PollStart {
                initiator: "Lutra".to_string(),
                question: "Q?".to_string(),
                answers: vec!["A".to_string(), "B".to_string()],
                duration_ms: 30_000,
            }),
        )
    }

    fn poll_end() -> ChatEvent {
        ChatEvent::new(
            Platform::Mixer,
            "lutra",
            None,
            EventKind::PollEnd(PollEnd {
                question: "Q?".to_string(),
                responses: vec![("A".to_string(), 1), ("B".to_string(), 2)],
                voters: 3,
            }),
        )
    }

    #[test]
    fn test_mixer_message_goes_to_twitch_default_channel() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Mixer, "lutra", "ann", "hello"))
            .unwrap();
        assert_eq!(sends(&out), vec![(Platform::Twitch, "#lutra", "ann: hello [M]")]);
    }

    #[test]
    fn test_twitch_primary_message_goes_to_mixer() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "bob", "hey"))
            .unwrap();
        assert_eq!(sends(&out), vec![(Platform::Mixer, "lutra", "bob: hey [T]")]);
    }

    #[test]
    fn test_secondary_channel_unlinked_without_coop() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Twitch, "#otter", "bob", "hey"))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_self_echo_never_routed() {
        let mut router = make_router();
        assert!(router
            .route(&chat(Platform::Twitch, "#lutra", "LutraBot", "relayed [M]"))
            .unwrap()
            .is_empty());
        assert!(router
            .route(&chat(Platform::Mixer, "lutra", "lutrabot", "relayed [T]"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_origin() {
        let mut config = make_test_config();
        config.platforms.mixer = None;
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        let err = router
            .route(&chat(Platform::Mixer, "lutra", "ann", "hi"))
            .unwrap_err();
        assert!(matches!(err, RelayError::UnknownOrigin { .. }));
    }

    #[test]
    fn test_start_coop_from_primary() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "Lutra", "!startcoop"))
            .unwrap();

        assert!(router.state().coop_active());
        assert_eq!(
            sends(&out),
            vec![
                (
                    Platform::Twitch,
                    "#lutra",
                    "TwitchUnity Coop chat linked with https://twitch.tv/otter lordafSun"
                ),
                (
                    Platform::Twitch,
                    "#otter",
                    "lordafSun Coop chat linked with https://twitch.tv/lutra TwitchUnity"
                ),
                (
                    Platform::Mixer,
                    "lutra",
                    ":mixerlove Coop chat linked with https://twitch.tv/otter"
                ),
            ]
        );
    }

    #[test]
    fn test_start_coop_from_non_primary_ignored() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "otter", "!startcoop"))
            .unwrap();
        assert!(out.is_empty());
        assert!(!router.state().coop_active());

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "viewer", "!startcoop"))
            .unwrap();
        assert!(out.is_empty());
        assert!(!router.state().coop_active());
    }

    #[test]
    fn test_end_coop_by_either_owner() {
        let mut router = make_router();
        start_coop(&mut router);

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "viewer", "!endcoop"))
            .unwrap();
        assert!(out.is_empty());
        assert!(router.state().coop_active());

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "otter", "!endcoop"))
            .unwrap();
        assert!(!router.state().coop_active());
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[2].text(),
            Some(":mixerlove Coop chat ended with https://twitch.tv/otter")
        );
    }

    #[test]
    fn test_repeated_start_does_not_reannounce() {
        let mut router = make_router();
        start_coop(&mut router);
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop"))
            .unwrap();
        assert!(out.is_empty());
        assert!(router.state().coop_active());
    }

    #[test]
    fn test_explicit_coop_control_event() {
        let mut router = make_router();
        let ev = ChatEvent::new(
            Platform::Twitch,
            "#lutra",
            Some(ChatUser::new("lutra", "Lutra")),
            EventKind::CoopControl(CoopCommand::Start),
        );
        assert_eq!(router.route(&ev).unwrap().len(), 3);
        assert!(router.state().coop_active());
    }

    #[test]
    fn test_coop_command_on_mixer_is_chat() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Mixer, "lutra", "lutra", "!startcoop"))
            .unwrap();
        assert!(!router.state().coop_active());
        assert_eq!(sends(&out), vec![(Platform::Twitch, "#lutra", "lutra: !startcoop [M]")]);
    }

    #[test]
    fn test_coop_symmetry() {
        let mut router = make_router();
        start_coop(&mut router);

        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "ann", "from a"))
            .unwrap();
        assert_eq!(
            sends(&out),
            vec![
                (Platform::Mixer, "lutra", "ann: from a [lutra@Twitch]"),
                (Platform::Twitch, "#otter", "ann: from a [lutra@Twitch]"),
            ]
        );

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "bob", "from b"))
            .unwrap();
        assert_eq!(
            sends(&out),
            vec![
                (Platform::Mixer, "lutra", "bob: from b [otter@Twitch]"),
                (Platform::Twitch, "#lutra", "bob: from b [otter@Twitch]"),
            ]
        );
    }

    #[test]
    fn test_mixer_message_reaches_both_coop_channels() {
        let mut router = make_router();
        start_coop(&mut router);

        let out = router
            .route(&chat(Platform::Mixer, "lutra", "ann", "hi"))
            .unwrap();
        assert_eq!(
            sends(&out),
            vec![
                (Platform::Twitch, "#lutra", "ann: hi [lutra@Mixer]"),
                (Platform::Twitch, "#otter", "ann: hi [lutra@Mixer]"),
            ]
        );
    }

    #[test]
    fn test_secondary_unlinked_again_after_end() {
        let mut router = make_router();
        start_coop(&mut router);
        router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!endcoop"))
            .unwrap();

        assert!(router
            .route(&chat(Platform::Twitch, "#otter", "bob", "anyone?"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_poll_flicker_collapsed() {
        let mut router = make_router();
        let mut starts = 0;
        for _ in 0..5 {
            starts += router.route(&poll_start()).unwrap().len();
        }
        assert_eq!(router.state().poll(), PollState::Open);
        let ends = router.route(&poll_end()).unwrap();

        assert_eq!(starts, 1);
        assert_eq!(ends.len(), 1);
        assert_eq!(router.state().poll(), PollState::Idle);
        assert!(router.route(&poll_end()).unwrap().is_empty());
    }

    #[test]
    fn test_gif_attribution_dropped_standard_relayed() {
        let mut router = make_router();
        let attribution = |kind| {
            ChatEvent::new(
                Platform::Mixer,
                "lutra",
                Some(ChatUser::new("ann", "Ann")),
                EventKind::Attribution(Skill {
                    skill_name: "Confetti".to_string(),
                    cost: 100,
                    currency: "gems".to_string(),
                    kind,
                }),
            )
        };

        assert!(router.route(&attribution(SkillKind::Gif)).unwrap().is_empty());
        let out = router.route(&attribution(SkillKind::Standard)).unwrap();
        assert_eq!(
            sends(&out),
            vec![(Platform::Twitch, "#lutra", "Ann used a skill on Mixer: Confetti (100 gems)")]
        );
    }

    #[test]
    fn test_emotes_translated_per_destination() {
        let mut translator = EmoteTranslator::empty();
        translator.insert(
            Platform::Twitch,
            EmoteTable::from_json(r#"{ "Kappa": { "mixer": ":kappa" } }"#).unwrap(),
        );
        let mut router = RelayRouter::new(make_test_config(), translator);
        start_coop(&mut router);

        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "ann", "Kappa"))
            .unwrap();
        assert_eq!(
            sends(&out),
            vec![
                (Platform::Mixer, "lutra", "ann: :kappa [lutra@Twitch]"),
                (Platform::Twitch, "#otter", "ann: Kappa [lutra@Twitch]"),
            ]
        );
    }

    #[test]
    fn test_clear_chat_notice_and_mirror() {
        let clear = ChatEvent::new(Platform::Twitch, "#lutra", None, EventKind::ClearChat);

        let mut router = make_router();
        let out = router.route(&clear).unwrap();
        assert_eq!(sends(&out), vec![(Platform::Mixer, "lutra", "Chat was cleared on Twitch")]);

        let mut config = make_test_config();
        config.mirror_clear = Some(true);
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());
        let out = router.route(&clear).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].action, DeliveryAction::Clear);
    }

    #[test]
    fn test_suppression_pattern_from_config() {
        let mut config = make_test_config();
        config.suppression = Some(crate::config::types::SuppressionConfig {
            patterns: Some(vec![r"@Twitch\]$".to_string()]),
        });
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        assert!(router
            .route(&chat(Platform::Mixer, "lutra", "ann", "bob: hi [x@Twitch]"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_command_patterns_do_not_block_coop() {
        let mut config = make_test_config();
        config.suppression = Some(crate::config::types::SuppressionConfig {
            patterns: Some(vec!["^!".to_string()]),
        });
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop"))
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(router.state().coop_active());

        assert!(router
            .route(&chat(Platform::Twitch, "#lutra", "ann", "!uptime"))
            .unwrap()
            .is_empty());

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "otter", "!endcoop"))
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(!router.state().coop_active());
    }

    #[test]
    fn test_sample_config_allows_coop() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/lutrabot.conf.example");
        let config = crate::config::load_config(path).unwrap();
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop"))
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(router.state().coop_active());
    }

    #[test]
    fn test_bot_cannot_issue_coop_commands() {
        let mut config = make_test_config();
        config.platforms.twitch.as_mut().unwrap().username = "lutra".to_string();
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop"))
            .unwrap();
        assert!(out.is_empty());
        assert!(!router.state().coop_active());
    }

    #[test]
    fn test_command_with_trailing_words_is_chat() {
        let mut router = make_router();
        let out = router
            .route(&chat(Platform::Twitch, "#lutra", "lutra", "!startcoop please"))
            .unwrap();
        assert!(!router.state().coop_active());
        assert_eq!(
            sends(&out),
            vec![(Platform::Mixer, "lutra", "lutra: !startcoop please [T]")]
        );
    }

    #[test]
    fn test_no_coop_config() {
        let mut config = make_test_config();
        config.coop = None;
        let mut router = RelayRouter::new(config, EmoteTranslator::empty());

        let out = router
            .route(&chat(Platform::Twitch, "#otter", "bob", "!startcoop"))
            .unwrap();
        assert!(!router.state().coop_active());
        assert_eq!(sends(&out), vec![(Platform::Mixer, "lutra", "bob: !startcoop [T]")]);
    }
}
