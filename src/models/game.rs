use poise::serenity_prelude::ChannelId;
use strum::{AsRefStr, Display, EnumString};

use super::types::UtcDateTime;

/// Lifecycle of a game. Only an explicit reset moves it backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Accepting participants.
    Joining,
    /// A draw has been claimed and is being computed and persisted.
    Drawing,
    /// Assignments are stored.
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub group: ChannelId,
    pub status: GameStatus,
    pub started_at: UtcDateTime,
    pub exchange_date: Option<String>,
}
