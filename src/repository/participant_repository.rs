use poise::serenity_prelude::{ChannelId, UserId};
use sqlx::{query, query_as, FromRow, Pool, Sqlite};
use tracing::debug;

use crate::models::{
    types::{Sqlx, SqlxConvertible, UtcDateTime},
    GameStatus, Participant,
};

#[derive(Debug)]
pub struct ParticipantRepository {
    pool: Pool<Sqlite>,
}

impl ParticipantRepository {
    pub fn new(pool: Pool<Sqlite>) -> ParticipantRepository {
        ParticipantRepository { pool }
    }

    /// Returns `false` if the participant has already joined or the game is not open for joining.
    ///
    /// The status check is part of the insert, so nobody gets in once the draw has been claimed.
    pub async fn add_participant(
        &self,
        participant: UserId,
        group: ChannelId,
        display_name: &str,
    ) -> Result<bool, anyhow::Error> {
        let query_result = query(
            r#"
                INSERT INTO participants (participant_id, group_id, display_name, joined_at)
                SELECT $1, $2, $3, $4
                WHERE EXISTS (
                    SELECT 1 FROM games
                    WHERE group_id = $2 AND (status = $5 OR status IS NULL)
                )
                ON CONFLICT (participant_id, group_id) DO NOTHING
            "#,
        )
        .bind(participant.to_sqlx())
        .bind(group.to_sqlx())
        .bind(display_name)
        .bind(UtcDateTime::now())
        .bind(GameStatus::Joining.to_sqlx())
        .execute(&self.pool)
        .await?;

        let added = query_result.rows_affected() > 0;
        debug!("Participant {participant} in group {group}, added: {added}");

        Ok(added)
    }

    /// Participants in the order they joined.
    pub async fn list_participants(
        &self,
        group: ChannelId,
    ) -> Result<Vec<Participant>, anyhow::Error> {
        let participants = query_as::<_, SqlParticipant>(
            r#"
                SELECT participant_id, group_id, display_name, joined_at
                FROM participants
                WHERE group_id = $1
                ORDER BY rowid
            "#,
        )
        .bind(group.to_sqlx())
        .fetch_all(&self.pool)
        .await?;

        Ok(participants.into_iter().map(Participant::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct SqlParticipant {
    participant_id: Sqlx<UserId>,
    group_id: Sqlx<ChannelId>,
    display_name: String,
    joined_at: UtcDateTime,
}

impl From<SqlParticipant> for Participant {
    fn from(value: SqlParticipant) -> Self {
        Participant {
            id: value.participant_id.0,
            group: value.group_id.0,
            display_name: value.display_name,
            joined_at: value.joined_at,
        }
    }
}
