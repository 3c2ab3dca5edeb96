use std::{collections::HashMap, sync::Arc, time::Duration};

use poise::serenity_prelude::{ChannelId, UserId};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    models::{GameStatus, Pairing},
    notifier::{deliver_assignments, AssignmentNotice, DeliveryReport, Notifier},
    repository::{AssignmentRepository, GameRepository, ParticipantRepository},
    solver::{derange, DerangementError, DerangementPolicy},
};

#[derive(Debug, Error)]
pub enum DrawError {
    #[error("At least 2 participants are needed to draw names, there are {count}")]
    InsufficientParticipants { count: usize },
    #[error("Names are already being drawn")]
    AlreadyInProgress,
    #[error("Names have already been drawn")]
    AlreadyCompleted,
    #[error("The game was reset while names were being drawn")]
    StaleDraw,
    #[error("There is no Secret Santa in this channel yet")]
    GameNotFound,
    #[error("Could not store the draw: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl From<DerangementError> for DrawError {
    fn from(value: DerangementError) -> Self {
        match value {
            DerangementError::InsufficientParticipants { count } => {
                DrawError::InsufficientParticipants { count }
            }
            // Participants are unique per group, so this means the store is broken.
            DerangementError::DuplicateParticipant => DrawError::Persistence(value.into()),
        }
    }
}

#[derive(Debug)]
pub struct DrawOutcome {
    pub pairs: Vec<Pairing>,
    pub report: DeliveryReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// `confirmed` is `false` if the confirmation could not be sent in DMs.
    Joined { confirmed: bool },
    AlreadyJoined,
    /// The draw has started or finished, nobody can join until a reset.
    Closed(GameStatus),
}

pub struct DrawService {
    games: Arc<GameRepository>,
    participants: Arc<ParticipantRepository>,
    assignments: Arc<AssignmentRepository>,
    notifier: Arc<dyn Notifier>,
    policy: DerangementPolicy,
    delivery_timeout: Duration,
}

impl DrawService {
    pub fn new(
        games: Arc<GameRepository>,
        participants: Arc<ParticipantRepository>,
        assignments: Arc<AssignmentRepository>,
        notifier: Arc<dyn Notifier>,
        policy: DerangementPolicy,
        delivery_timeout: Duration,
    ) -> DrawService {
        DrawService {
            games,
            participants,
            assignments,
            notifier,
            policy,
            delivery_timeout,
        }
    }

    #[tracing::instrument(skip(self, display_name))]
    pub async fn join(
        &self,
        group: ChannelId,
        participant: UserId,
        display_name: &str,
    ) -> Result<JoinOutcome, anyhow::Error> {
        self.games.ensure_game(group).await?;

        if !self
            .participants
            .add_participant(participant, group, display_name)
            .await?
        {
            return match self.games.get_status(group).await? {
                Some(GameStatus::Joining) | None => Ok(JoinOutcome::AlreadyJoined),
                Some(status) => Ok(JoinOutcome::Closed(status)),
            };
        }

        let confirmation = tokio::time::timeout(
            self.delivery_timeout,
            self.notifier.send_join_confirmation(participant, group),
        )
        .await;

        let confirmed = match confirmation {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!("Could not confirm joining to {participant}: {err}");
                false
            }
            Err(_) => {
                warn!("Confirming joining to {participant} timed out");
                false
            }
        };

        Ok(JoinOutcome::Joined { confirmed })
    }

    /// Draws names for the group, stores them and notifies every santa.
    ///
    /// Only the caller that moves the game from joining to drawing goes on to draw; everyone else
    /// gets the reason they were rejected. Notification failures end up in the report and never
    /// undo the stored draw.
    #[tracing::instrument(skip(self))]
    pub async fn run_draw(&self, group: ChannelId) -> Result<DrawOutcome, DrawError> {
        match self.games.get_status(group).await? {
            None => return Err(DrawError::GameNotFound),
            Some(GameStatus::Drawing) => return Err(DrawError::AlreadyInProgress),
            Some(GameStatus::Completed) => return Err(DrawError::AlreadyCompleted),
            Some(GameStatus::Joining) => {}
        }

        let count = self.participants.list_participants(group).await?.len();
        if count < 2 {
            return Err(DrawError::InsufficientParticipants { count });
        }

        if !self.games.try_begin_draw(group).await? {
            return Err(self.rejection(group).await);
        }

        self.draw_claimed(group).await
    }

    /// The rest of a draw, once this caller holds the claim.
    async fn draw_claimed(&self, group: ChannelId) -> Result<DrawOutcome, DrawError> {
        info!("Drawing names for group {group}");

        // Nobody can join from now on, and a reset may have emptied the group since the check.
        let participants = self.participants.list_participants(group).await?;
        if participants.len() < 2 {
            self.games.release_draw(group).await?;
            return Err(DrawError::InsufficientParticipants {
                count: participants.len(),
            });
        }

        let pairs = {
            let ids = participants.iter().map(|p| p.id).collect::<Vec<_>>();
            let mut rng = rand::rng();
            derange(&ids, self.policy, &mut rng)?
                .into_iter()
                .map(Pairing::from)
                .collect::<Vec<_>>()
        };

        match self.assignments.commit_draw(group, &pairs).await {
            Ok(true) => {}
            Ok(false) => return Err(DrawError::StaleDraw),
            Err(err) => {
                error!("Could not store the draw for group {group}, it stays in the drawing state: {err}");
                return Err(DrawError::Persistence(err));
            }
        }

        let exchange_date = self
            .games
            .get_exchange_date(group)
            .await
            .unwrap_or_else(|err| {
                warn!("Could not read the exchange date of group {group}: {err}");
                None
            });

        let names = participants
            .iter()
            .map(|p| (p.id, p.display_name.as_str()))
            .collect::<HashMap<_, _>>();

        let notices = pairs
            .iter()
            .map(|pairing| AssignmentNotice {
                santa: pairing.santa,
                group,
                target: pairing.target,
                target_name: names
                    .get(&pairing.target)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                exchange_date: exchange_date.clone(),
            })
            .collect::<Vec<_>>();

        let report =
            deliver_assignments(self.notifier.as_ref(), &notices, self.delivery_timeout).await;

        Ok(DrawOutcome { pairs, report })
    }

    /// Explains why the draw could not be claimed.
    async fn rejection(&self, group: ChannelId) -> DrawError {
        match self.games.get_status(group).await {
            Ok(Some(GameStatus::Completed)) => DrawError::AlreadyCompleted,
            Ok(Some(_)) => DrawError::AlreadyInProgress,
            Ok(None) => DrawError::GameNotFound,
            Err(err) => DrawError::Persistence(err),
        }
    }
}
