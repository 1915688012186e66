//! Text rendering: event formatting and emote translation.

pub mod emotes;
pub mod formatter;

pub use emotes::EmoteTranslator;
