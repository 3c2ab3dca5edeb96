use poise::serenity_prelude::{
    self as serenity, ComponentInteraction, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditInteractionResponse,
    FullEvent, Interaction, Mentionable,
};
use tracing::{info, warn};

use crate::{
    commands::{draw_err, internal_err, CommandError},
    draw_service::JoinOutcome,
    models::GameStatus,
    poise_error_handler::{error_message, log_command_error},
    utils::formatting::{
        draw_summary, roster_components, roster_message, DRAW_BUTTON, JOIN_BUTTON,
    },
    BotState,
};

pub async fn handle_event(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, BotState, CommandError>,
    data: &BotState,
) -> Result<(), CommandError> {
    let FullEvent::InteractionCreate {
        interaction: Interaction::Component(component),
    } = event
    else {
        return Ok(());
    };

    match component.data.custom_id.as_str() {
        JOIN_BUTTON => handle_join(ctx, component, data).await,
        DRAW_BUTTON => handle_draw(ctx, component, data).await,
        _ => Ok(()),
    }
}

async fn handle_join(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotState,
) -> Result<(), CommandError> {
    let group = component.channel_id;
    let user = &component.user;
    let display_name = user.global_name.as_deref().unwrap_or(&user.name);

    let outcome = match data.draw_service.join(group, user.id, display_name).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let error = internal_err(format!("Could not add you to the Secret Santa: {err}"));
            reply_privately(ctx, component, &error_message(&error)).await?;
            return Err(error);
        }
    };

    match outcome {
        JoinOutcome::Joined { confirmed } => {
            info!("{} joined the Secret Santa in {group}", user.id);

            let game = data
                .game_repository
                .get_game(group)
                .await
                .map_err(|err| internal_err(format!("Could not get the game: {err}")))?;
            let participants = data
                .participant_repository
                .list_participants(group)
                .await
                .map_err(|err| internal_err(format!("Could not get the participants: {err}")))?;

            let response = match game {
                Some(game) => CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .content(roster_message(&game, &participants))
                        .components(roster_components(&game, &participants)),
                ),
                None => CreateInteractionResponse::Acknowledge,
            };
            component.create_response(&ctx.http, response).await?;

            if !confirmed {
                group
                    .say(
                        &ctx.http,
                        format!(
                            "{} you're in, but I could not DM you. Please open your DMs so I can tell you who you got!",
                            user.id.mention()
                        ),
                    )
                    .await?;
            }
        }

        JoinOutcome::AlreadyJoined => {
            reply_privately(ctx, component, "You're already in the list!").await?;
        }

        JoinOutcome::Closed(GameStatus::Completed) => {
            reply_privately(
                ctx,
                component,
                "Names have already been drawn, you can't join anymore.",
            )
            .await?;
        }

        JoinOutcome::Closed(_) => {
            reply_privately(
                ctx,
                component,
                "The draw has already started, you can't join anymore.",
            )
            .await?;
        }
    }

    Ok(())
}

async fn handle_draw(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    data: &BotState,
) -> Result<(), CommandError> {
    let group = component.channel_id;

    // Drawing and sending DMs can outlast the interaction deadline.
    component
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await?;

    let outcome = match data.draw_service.run_draw(group).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let error = draw_err(err);
            log_command_error(&error);

            component
                .create_followup(
                    &ctx.http,
                    CreateInteractionResponseFollowup::new()
                        .content(error_message(&error))
                        .ephemeral(true),
                )
                .await?;

            return Ok(());
        }
    };

    info!(
        "{} drew names in {group}, {} of {} DMs delivered",
        component.user.id,
        outcome.report.delivered.len(),
        outcome.pairs.len()
    );

    let participants = data
        .participant_repository
        .list_participants(group)
        .await
        .unwrap_or_else(|err| {
            warn!("Could not get the participants of {group} for the draw summary: {err}");
            vec![]
        });

    component
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .content(draw_summary(&outcome, &participants))
                .components(vec![]),
        )
        .await?;

    Ok(())
}

async fn reply_privately(
    ctx: &serenity::Context,
    component: &ComponentInteraction,
    message: &str,
) -> Result<(), CommandError> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(message)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}
