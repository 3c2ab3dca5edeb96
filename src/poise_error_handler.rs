use poise::{Context, CreateReply, FrameworkError};
use tracing::{error, warn};

use crate::{commands::CommandError, BotState};

pub async fn handle_error(error: FrameworkError<'_, BotState, CommandError>) {
    use FrameworkError::*;

    match error {
        Setup { error, .. } => {
            error!("Error in user data setup: {error}");
        }

        EventHandler { error, event, .. } => {
            error!(
                "Error in user event {} handler: {error}",
                event.snake_case_name()
            );
        }

        Command { error, ctx, .. } => {
            log_command_error(&error);
            reply_with_error(ctx, &error_message(&error)).await;
        }

        ArgumentParse {
            error, input, ctx, ..
        } => {
            let response = match input {
                Some(input) => format!("**Sorry, cannot use `{input}` here: {error}**"),
                None => format!("**{error}**"),
            };

            reply_with_error(ctx, &response).await;
        }

        CommandStructureMismatch {
            description, ctx, ..
        } => {
            error!(
                "Failed to deserialize interaction arguments for `{}`: {description}",
                ctx.command.qualified_name
            );
        }

        MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            warn!(
                "Missing bot permissions {missing_permissions:?} in channel {}",
                ctx.channel_id()
            );
            reply_with_error(
                ctx,
                "Sorry, I lack the permissions needed to run the Secret Santa in this channel.",
            )
            .await;
        }

        MissingUserPermissions { ctx, .. } => {
            reply_with_error(
                ctx,
                "Sorry, only members who can manage this server can do that.",
            )
            .await;
        }

        GuildOnly { ctx, .. } => {
            reply_with_error(
                ctx,
                "Secret Santa happens in server channels, please run this command there.",
            )
            .await;
        }

        UnknownInteraction { interaction, .. } => {
            warn!("Received an unknown interaction: {:?}", interaction);
        }

        error => {
            error!("Unknown error: {error}");
        }
    }
}

/// What the user gets to read about a failed command or button press.
pub fn error_message(error: &CommandError) -> String {
    match error {
        CommandError::User { message } => message.clone(),
        CommandError::Internal { message } => {
            format!("Sorry, something went wrong on my side: {message}")
        }
        CommandError::Serenity(error) => {
            format!("Sorry, something went wrong while talking to Discord: {error}")
        }
    }
}

pub fn log_command_error(error: &CommandError) {
    match error {
        CommandError::User { .. } => {}
        CommandError::Internal { message } => error!("Internal error: {message}"),
        CommandError::Serenity(error) => error!("Serenity error: {error}"),
    }
}

async fn reply_with_error(ctx: Context<'_, BotState, CommandError>, error_message: &str) {
    if let Err(send_error) = poise::send_reply(
        ctx,
        CreateReply::default()
            .content(error_message)
            .ephemeral(true),
    )
    .await
    {
        error!(
            "Failed to send an error message to the user: {send_error}\nThe message was: {error_message}"
        );
    }
}
