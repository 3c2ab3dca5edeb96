mod assignment_repository;
mod game_repository;
mod participant_repository;

pub use assignment_repository::AssignmentRepository;
pub use game_repository::GameRepository;
pub use participant_repository::ParticipantRepository;

/// A private in-memory database with the real migrations applied.
///
/// A single connection is kept alive, otherwise every new connection would see an empty database.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("In-memory database should open");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Migrations should apply to an empty database");

    pool
}
