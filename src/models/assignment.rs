use poise::serenity_prelude::{ChannelId, UserId};

/// The santa gifts the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pairing {
    pub santa: UserId,
    pub target: UserId,
}

impl From<(UserId, UserId)> for Pairing {
    fn from((santa, target): (UserId, UserId)) -> Self {
        Pairing { santa, target }
    }
}

/// What a participant sees when asking who they are gifting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SantaAssignment {
    pub group: ChannelId,
    pub recipient_name: String,
    pub exchange_date: Option<String>,
}
