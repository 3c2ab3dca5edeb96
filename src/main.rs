#![forbid(unsafe_code)]

mod commands;
mod draw_service;
mod interactions;
mod models;
mod notifier;
mod poise_error_handler;
mod repository;
mod solver;
mod utils;

use std::{process::exit, sync::Arc, time::Duration};

use draw_service::DrawService;
use notifier::DiscordNotifier;
use poise::{serenity_prelude::*, Framework};
use poise_error_handler::handle_error;
use repository::{AssignmentRepository, GameRepository, ParticipantRepository};
use serde::Deserialize;
use solver::DerangementPolicy;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::{select, signal};
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct AppConfig {
    discord_bot_token: String,
    database_url: String,
    register_commands_globally: Option<bool>,
    register_commands_in_guilds: Option<Vec<u64>>,
    draw_policy: Option<DerangementPolicy>,
    notification_timeout_secs: Option<u64>,
}

pub struct BotState {
    pub game_repository: Arc<GameRepository>,
    pub participant_repository: Arc<ParticipantRepository>,
    pub assignment_repository: Arc<AssignmentRepository>,
    pub draw_service: Arc<DrawService>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        warn!("Could not load config from .env file: {err}");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "secret_santa_bot=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let db_pool = match setup_database(&app_config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not setup database: {err}");
            exit(255);
        }
    };

    let policy = app_config.draw_policy.unwrap_or_default();
    let delivery_timeout = Duration::from_secs(
        app_config
            .notification_timeout_secs
            .unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT_SECS),
    );
    info!("Drawing names with the {policy:?} policy, DMs time out after {delivery_timeout:?}");

    let game_repository = Arc::new(GameRepository::new(db_pool.clone()));
    let participant_repository = Arc::new(ParticipantRepository::new(db_pool.clone()));
    let assignment_repository = Arc::new(AssignmentRepository::new(db_pool.clone()));

    let framework = Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::santa()],
            on_error: |error| Box::pin(handle_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(interactions::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(
                async move {
                    let commands = &framework.options().commands;

                    if let Some(true) = app_config.register_commands_globally {
                        info!("Registering commands globally");
                        poise::builtins::register_globally(ctx, commands).await?;
                    }

                    if let Some(guilds) = app_config.register_commands_in_guilds {
                        for guild in guilds.iter().map(|g| GuildId::new(*g)) {
                            let guild_name = ctx
                                .http()
                                .get_guild(guild)
                                .await
                                .map(|g| g.name)
                                .unwrap_or("???".to_string());

                            info!("Registering commands in guild {guild} ({guild_name})");

                            poise::builtins::register_in_guild(ctx, commands, guild).await?;
                        }
                    }

                    let draw_service = Arc::new(DrawService::new(
                        game_repository.clone(),
                        participant_repository.clone(),
                        assignment_repository.clone(),
                        Arc::new(DiscordNotifier::new(ctx.http.clone())),
                        policy,
                        delivery_timeout,
                    ));

                    Ok(BotState {
                        game_repository,
                        participant_repository,
                        assignment_repository,
                        draw_service,
                    })
                }
                .instrument(info_span!("bot_setup")),
            )
        })
        .build();

    let mut client = match ClientBuilder::new(app_config.discord_bot_token, GatewayIntents::empty())
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to create the client: {err}");
            exit(255);
        }
    };

    select! {
        _ = signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            client.shard_manager.shutdown_all().await;
            db_pool.close().await;
        },

        result = client.start() => {
            if let Err(err) = result {
                error!("Failed to start the client: {err}");
            }
        },
    };
}

#[tracing::instrument(skip(url))]
async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database at {url}");
    let pool = SqlitePoolOptions::new().connect(url).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Done!");
    Ok(pool)
}
