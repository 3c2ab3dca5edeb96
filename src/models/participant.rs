use poise::serenity_prelude::{ChannelId, UserId};

use super::types::UtcDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub group: ChannelId,
    pub display_name: String,
    pub joined_at: UtcDateTime,
}
