use poise::serenity_prelude::ChannelId;
use sqlx::{query, query_as, query_scalar, FromRow, Pool, Sqlite};
use tracing::{info, warn};

use crate::models::{
    types::{Sqlx, SqlxConvertible, UtcDateTime},
    Game, GameStatus,
};

#[derive(Debug)]
pub struct GameRepository {
    pool: Pool<Sqlite>,
}

impl GameRepository {
    pub fn new(pool: Pool<Sqlite>) -> GameRepository {
        GameRepository { pool }
    }

    /// Creates a game in the joining state unless the group already has one.
    ///
    /// Returns `true` if this call created it.
    pub async fn ensure_game(&self, group: ChannelId) -> Result<bool, anyhow::Error> {
        let query_result = query(
            r#"
                INSERT INTO games (group_id, status, started_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (group_id) DO NOTHING
            "#,
        )
        .bind(group.to_sqlx())
        .bind(GameStatus::Joining.to_sqlx())
        .bind(UtcDateTime::now())
        .execute(&self.pool)
        .await?;

        let created = query_result.rows_affected() > 0;
        if created {
            info!("Created a game for group {group}");
        }

        Ok(created)
    }

    pub async fn get_game(&self, group: ChannelId) -> Result<Option<Game>, anyhow::Error> {
        let game = query_as::<_, SqlGame>(
            r#"
                SELECT group_id, status, started_at, exchange_date
                FROM games
                WHERE group_id = $1
            "#,
        )
        .bind(group.to_sqlx())
        .fetch_optional(&self.pool)
        .await?;

        Ok(game.map(Game::from))
    }

    pub async fn get_status(&self, group: ChannelId) -> Result<Option<GameStatus>, anyhow::Error> {
        Ok(self.get_game(group).await?.map(|game| game.status))
    }

    /// Claims the draw for the group.
    ///
    /// The status check and the update are one statement, so among concurrent callers exactly
    /// one sees `true`. A missing game is never claimed.
    #[tracing::instrument(skip(self))]
    pub async fn try_begin_draw(&self, group: ChannelId) -> Result<bool, anyhow::Error> {
        let query_result = query(
            r#"
                UPDATE games
                SET status = $1
                WHERE group_id = $2 AND (status = $3 OR status IS NULL)
            "#,
        )
        .bind(GameStatus::Drawing.to_sqlx())
        .bind(group.to_sqlx())
        .bind(GameStatus::Joining.to_sqlx())
        .execute(&self.pool)
        .await?;

        let claimed = query_result.rows_affected();

        if claimed > 1 {
            warn!("Claimed more than one game for group {group}");
        }

        Ok(claimed > 0)
    }

    /// Gives a claimed draw back, reopening the game for joining.
    ///
    /// Only a game still in the drawing state is touched.
    #[tracing::instrument(skip(self))]
    pub async fn release_draw(&self, group: ChannelId) -> Result<bool, anyhow::Error> {
        let query_result = query(
            r#"
                UPDATE games
                SET status = $1
                WHERE group_id = $2 AND status = $3
            "#,
        )
        .bind(GameStatus::Joining.to_sqlx())
        .bind(group.to_sqlx())
        .bind(GameStatus::Drawing.to_sqlx())
        .execute(&self.pool)
        .await?;

        Ok(query_result.rows_affected() > 0)
    }

    /// Stores the exchange date text as is, creating the game if needed.
    pub async fn set_exchange_date(
        &self,
        group: ChannelId,
        exchange_date: &str,
    ) -> Result<(), anyhow::Error> {
        query(
            r#"
                INSERT INTO games (group_id, status, started_at, exchange_date)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (group_id) DO UPDATE SET exchange_date = excluded.exchange_date
            "#,
        )
        .bind(group.to_sqlx())
        .bind(GameStatus::Joining.to_sqlx())
        .bind(UtcDateTime::now())
        .bind(exchange_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_exchange_date(&self, group: ChannelId) -> Result<Option<String>, anyhow::Error> {
        let exchange_date = query_scalar::<_, Option<String>>(
            r#"SELECT exchange_date FROM games WHERE group_id = $1"#,
        )
        .bind(group.to_sqlx())
        .fetch_optional(&self.pool)
        .await?;

        Ok(exchange_date.flatten())
    }

    /// Drops the participants and assignments of the group and reopens it for joining.
    #[tracing::instrument(skip(self))]
    pub async fn reset_game(&self, group: ChannelId) -> Result<(), anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let group_id = group.to_sqlx();

        let assignments = query(r#"DELETE FROM assignments WHERE group_id = $1"#)
            .bind(group_id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        let participants = query(r#"DELETE FROM participants WHERE group_id = $1"#)
            .bind(group_id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        query(
            r#"
                INSERT INTO games (group_id, status, started_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (group_id) DO UPDATE SET status = excluded.status
            "#,
        )
        .bind(group_id)
        .bind(GameStatus::Joining.to_sqlx())
        .bind(UtcDateTime::now())
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;

        info!("Reset group {group}: removed {participants} participants and {assignments} assignments");

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct SqlGame {
    group_id: Sqlx<ChannelId>,
    status: Option<Sqlx<GameStatus>>,
    started_at: UtcDateTime,
    exchange_date: Option<String>,
}

impl From<SqlGame> for Game {
    fn from(value: SqlGame) -> Self {
        Game {
            group: value.group_id.0,
            status: value.status.map(|s| s.0).unwrap_or(GameStatus::Joining),
            started_at: value.started_at,
            exchange_date: value.exchange_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use poise::serenity_prelude::ChannelId;
    use sqlx::query;
    use test_log::test;

    use crate::{
        models::{types::SqlxConvertible, GameStatus},
        repository::{test_pool, GameRepository},
    };

    fn group() -> ChannelId {
        ChannelId::new(100)
    }

    #[test(tokio::test)]
    async fn ensure_game_is_idempotent() {
        let games = GameRepository::new(test_pool().await);

        assert!(games.ensure_game(group()).await.unwrap());
        assert!(!games.ensure_game(group()).await.unwrap());
        assert_eq!(
            games.get_status(group()).await.unwrap(),
            Some(GameStatus::Joining)
        );
    }

    #[test(tokio::test)]
    async fn status_of_unknown_group_is_absent() {
        let games = GameRepository::new(test_pool().await);

        assert_eq!(games.get_status(group()).await.unwrap(), None);
        assert!(!games.try_begin_draw(group()).await.unwrap());
    }

    #[test(tokio::test)]
    async fn begin_draw_only_once() {
        let games = GameRepository::new(test_pool().await);
        games.ensure_game(group()).await.unwrap();

        assert!(games.try_begin_draw(group()).await.unwrap());
        assert!(!games.try_begin_draw(group()).await.unwrap());
        assert_eq!(
            games.get_status(group()).await.unwrap(),
            Some(GameStatus::Drawing)
        );
    }

    #[test(tokio::test)]
    async fn begin_draw_accepts_games_without_status() {
        let pool = test_pool().await;
        let games = GameRepository::new(pool.clone());
        games.ensure_game(group()).await.unwrap();

        query("UPDATE games SET status = NULL WHERE group_id = $1")
            .bind(group().to_sqlx())
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(
            games.get_status(group()).await.unwrap(),
            Some(GameStatus::Joining)
        );
        assert!(games.try_begin_draw(group()).await.unwrap());
    }

    #[test(tokio::test)]
    async fn release_only_undoes_a_claim() {
        let games = GameRepository::new(test_pool().await);
        games.ensure_game(group()).await.unwrap();

        assert!(!games.release_draw(group()).await.unwrap());
        assert!(games.try_begin_draw(group()).await.unwrap());
        assert!(games.release_draw(group()).await.unwrap());
        assert_eq!(
            games.get_status(group()).await.unwrap(),
            Some(GameStatus::Joining)
        );
        assert!(games.try_begin_draw(group()).await.unwrap());
    }

    #[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn concurrent_begin_draw_has_one_winner() {
        let games = Arc::new(GameRepository::new(test_pool().await));
        games.ensure_game(group()).await.unwrap();

        let handles = (0..16)
            .map(|_| {
                let games = games.clone();
                tokio::spawn(async move { games.try_begin_draw(group()).await.unwrap() })
            })
            .collect::<Vec<_>>();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[test(tokio::test)]
    async fn exchange_date_round_trip() {
        let games = GameRepository::new(test_pool().await);
        games.ensure_game(group()).await.unwrap();

        assert_eq!(games.get_exchange_date(group()).await.unwrap(), None);

        games
            .set_exchange_date(group(), "Dec 24th, after dinner")
            .await
            .unwrap();
        assert_eq!(
            games.get_exchange_date(group()).await.unwrap().as_deref(),
            Some("Dec 24th, after dinner")
        );

        games.set_exchange_date(group(), "").await.unwrap();
        assert_eq!(
            games.get_exchange_date(group()).await.unwrap().as_deref(),
            Some("")
        );
    }

    #[test(tokio::test)]
    async fn exchange_date_creates_missing_game() {
        let games = GameRepository::new(test_pool().await);

        games.set_exchange_date(group(), "January 5").await.unwrap();

        let game = games.get_game(group()).await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Joining);
        assert_eq!(game.exchange_date.as_deref(), Some("January 5"));
    }

    #[test(tokio::test)]
    async fn reset_reopens_drawing_game() {
        let games = GameRepository::new(test_pool().await);
        games.ensure_game(group()).await.unwrap();
        games.set_exchange_date(group(), "Dec 24").await.unwrap();
        assert!(games.try_begin_draw(group()).await.unwrap());

        games.reset_game(group()).await.unwrap();

        let game = games.get_game(group()).await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Joining);
        assert_eq!(game.exchange_date.as_deref(), Some("Dec 24"));
        assert!(games.try_begin_draw(group()).await.unwrap());
    }
}
