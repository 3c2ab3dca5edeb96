use poise::serenity_prelude::{ChannelId, UserId};
use sqlx::{query, query_as, FromRow, Pool, Sqlite};
use tracing::{info, warn};

use crate::models::{
    types::{Sqlx, SqlxConvertible},
    GameStatus, Pairing, SantaAssignment,
};

#[derive(Debug)]
pub struct AssignmentRepository {
    pool: Pool<Sqlite>,
}

impl AssignmentRepository {
    pub fn new(pool: Pool<Sqlite>) -> AssignmentRepository {
        AssignmentRepository { pool }
    }

    /// Replaces the group's assignments with `pairs` and completes the game, all in one
    /// transaction.
    ///
    /// Returns `false` and changes nothing if the game is not drawing anymore, e.g. it was reset
    /// while the draw was computed. On error the game stays drawing.
    #[tracing::instrument(skip(self, pairs), fields(pairs = pairs.len()))]
    pub async fn commit_draw(
        &self,
        group: ChannelId,
        pairs: &[Pairing],
    ) -> Result<bool, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let group_id = group.to_sqlx();

        let completed = query(
            r#"
                UPDATE games
                SET status = $1
                WHERE group_id = $2 AND status = $3
            "#,
        )
        .bind(GameStatus::Completed.to_sqlx())
        .bind(group_id)
        .bind(GameStatus::Drawing.to_sqlx())
        .execute(&mut *transaction)
        .await?
        .rows_affected();

        if completed == 0 {
            transaction.rollback().await?;
            warn!("Group {group} is not drawing anymore, discarding the draw");
            return Ok(false);
        }

        query(r#"DELETE FROM assignments WHERE group_id = $1"#)
            .bind(group_id)
            .execute(&mut *transaction)
            .await?;

        for pairing in pairs {
            query(
                r#"
                    INSERT INTO assignments (group_id, santa_id, target_id)
                    VALUES ($1, $2, $3)
                "#,
            )
            .bind(group_id)
            .bind(pairing.santa.to_sqlx())
            .bind(pairing.target.to_sqlx())
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await?;

        info!("Committed {} assignments for group {group}", pairs.len());

        Ok(true)
    }

    pub async fn list_assignments(&self, group: ChannelId) -> Result<Vec<Pairing>, anyhow::Error> {
        let pairs = query_as::<_, (Sqlx<UserId>, Sqlx<UserId>)>(
            r#"
                SELECT santa_id, target_id
                FROM assignments
                WHERE group_id = $1
                ORDER BY rowid
            "#,
        )
        .bind(group.to_sqlx())
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs
            .into_iter()
            .map(|(santa, target)| Pairing {
                santa: santa.0,
                target: target.0,
            })
            .collect())
    }

    /// Everyone the participant is gifting, across all groups.
    pub async fn assignments_for(
        &self,
        participant: UserId,
    ) -> Result<Vec<SantaAssignment>, anyhow::Error> {
        let assignments = query_as::<_, SqlSantaAssignment>(
            r#"
                SELECT
                    a.group_id AS group_id,
                    p.display_name AS recipient_name,
                    g.exchange_date AS exchange_date
                FROM assignments a
                JOIN participants p ON p.participant_id = a.target_id AND p.group_id = a.group_id
                JOIN games g ON g.group_id = a.group_id
                WHERE a.santa_id = $1
                ORDER BY a.group_id
            "#,
        )
        .bind(participant.to_sqlx())
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments
            .into_iter()
            .map(SantaAssignment::from)
            .collect())
    }
}

#[derive(Debug, FromRow)]
struct SqlSantaAssignment {
    group_id: Sqlx<ChannelId>,
    recipient_name: String,
    exchange_date: Option<String>,
}

impl From<SqlSantaAssignment> for SantaAssignment {
    fn from(value: SqlSantaAssignment) -> Self {
        SantaAssignment {
            group: value.group_id.0,
            recipient_name: value.recipient_name,
            exchange_date: value.exchange_date,
        }
    }
}
