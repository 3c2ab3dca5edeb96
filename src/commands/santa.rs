use indoc::formatdoc;
use poise::{serenity_prelude::ChannelId, CreateReply};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    commands::{
        arguments::ExchangeDateText, draw_err, internal_err, user_err, CommandResult, Context,
    },
    models::GameStatus,
    utils::{
        exchange_day::{days_left, DaysLeft},
        formatting::{assignments_message, draw_summary, roster_components, roster_message},
    },
};

#[poise::command(
    slash_command,
    subcommands(
        "start",
        "draw",
        "roster",
        "set_date",
        "date",
        "days_left_command",
        "mine",
        "reset"
    ),
    subcommand_required
)]
pub async fn santa(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Start a Secret Santa in this channel.
#[poise::command(slash_command, guild_only)]
pub async fn start(ctx: Context<'_>) -> CommandResult {
    let group = ctx.channel_id();

    ctx.data()
        .game_repository
        .ensure_game(group)
        .await
        .map_err(|err| internal_err(format!("Could not start the Secret Santa: {err}")))?;

    send_roster(ctx, group).await
}

/// Show who has joined so far.
#[poise::command(slash_command, guild_only)]
pub async fn roster(ctx: Context<'_>) -> CommandResult {
    send_roster(ctx, ctx.channel_id()).await
}

/// Draw names now. Everyone gets their recipient in DMs.
#[poise::command(slash_command, guild_only)]
pub async fn draw(ctx: Context<'_>) -> CommandResult {
    let group = ctx.channel_id();

    ctx.defer().await?;

    let outcome = ctx
        .data()
        .draw_service
        .run_draw(group)
        .await
        .map_err(draw_err)?;

    let participants = ctx
        .data()
        .participant_repository
        .list_participants(group)
        .await
        .map_err(|err| internal_err(format!("Names were drawn, but the summary failed: {err}")))?;

    ctx.say(draw_summary(&outcome, &participants)).await?;

    Ok(())
}

/// Set the gifting day, e.g. "Dec 24th".
#[poise::command(slash_command, guild_only, rename = "setdate")]
pub async fn set_date(
    ctx: Context<'_>,
    #[description = "When gifts are exchanged, e.g. Dec 24th."] date: ExchangeDateText,
) -> CommandResult {
    ctx.data()
        .game_repository
        .set_exchange_date(ctx.channel_id(), date.as_ref())
        .await
        .map_err(|err| internal_err(format!("Could not save the gifting day: {err}")))?;

    info!("Gifting day of {} set to {date:?}", ctx.channel_id());

    ctx.say(format!("It's a date! Gifts are exchanged on **{date}**."))
        .await?;

    Ok(())
}

/// Show the gifting day.
#[poise::command(slash_command, guild_only)]
pub async fn date(ctx: Context<'_>) -> CommandResult {
    let exchange_date = ctx
        .data()
        .game_repository
        .get_exchange_date(ctx.channel_id())
        .await
        .map_err(|err| internal_err(format!("Could not get the gifting day: {err}")))?;

    match exchange_date {
        Some(date) => ctx.say(format!("Gifts are exchanged on **{date}**.")).await?,
        None => ctx
            .say("The gifting day has not been set yet. Use `/santa setdate` to set it.")
            .await?,
    };

    Ok(())
}

/// How many days are left until the gifting day.
#[poise::command(slash_command, guild_only, rename = "daysleft")]
pub async fn days_left_command(ctx: Context<'_>) -> CommandResult {
    let exchange_date = ctx
        .data()
        .game_repository
        .get_exchange_date(ctx.channel_id())
        .await
        .map_err(|err| internal_err(format!("Could not get the gifting day: {err}")))?
        .ok_or(user_err(
            "The gifting day has not been set yet. Use `/santa setdate` to set it.",
        ))?;

    let today = OffsetDateTime::now_utc().date();

    let message = match days_left(&exchange_date, today) {
        Some(DaysLeft::Today) => "# It's today!\nLet's see those gifts!".to_string(),
        Some(DaysLeft::Days(1)) => "**1 day** left until the gifting day. Last chance to shop!".to_string(),
        Some(DaysLeft::Days(days)) => {
            format!("**{days} days** left until the gifting day. Happy shopping!")
        }
        Some(DaysLeft::Passed) => "The gifting day has passed. How were the gifts?".to_string(),
        None => {
            return Err(user_err(formatdoc! {
                r#"
                    **I couldn't understand the gifting day: `{exchange_date}`.**

                    Set it with `/santa setdate` using a clear format, e.g. `Dec 24th` or `2025-12-24`.
                "#,
            }))
        }
    };

    ctx.say(message).await?;

    Ok(())
}

/// See who you are gifting, in every group you've joined.
#[poise::command(slash_command, ephemeral)]
pub async fn mine(ctx: Context<'_>) -> CommandResult {
    let assignments = ctx
        .data()
        .assignment_repository
        .assignments_for(ctx.author().id)
        .await
        .map_err(|err| internal_err(format!("Could not get your assignments: {err}")))?;

    ctx.send(
        CreateReply::default()
            .ephemeral(true)
            .content(assignments_message(&assignments)),
    )
    .await?;

    Ok(())
}

/// Cancel the Secret Santa in this channel: forget everyone who joined and every drawn name.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn reset(ctx: Context<'_>) -> CommandResult {
    let group = ctx.channel_id();

    ctx.data()
        .game_repository
        .reset_game(group)
        .await
        .map_err(|err| internal_err(format!("Could not reset the Secret Santa: {err}")))?;

    info!("{} reset the Secret Santa in {group}", ctx.author().id);

    ctx.say("The Secret Santa has been reset. Use `/santa start` to gather people again.")
        .await?;

    Ok(())
}

async fn send_roster(ctx: Context<'_>, group: ChannelId) -> CommandResult {
    let data = ctx.data();

    let game = data
        .game_repository
        .get_game(group)
        .await
        .map_err(|err| internal_err(format!("Could not get the game: {err}")))?
        .ok_or(user_err(
            "There is no Secret Santa in this channel yet. Use `/santa start` to begin.",
        ))?;

    let participants = data
        .participant_repository
        .list_participants(group)
        .await
        .map_err(|err| internal_err(format!("Could not get the participants: {err}")))?;

    let mut content = roster_message(&game, &participants);

    if game.status == GameStatus::Completed {
        let drawn = data
            .assignment_repository
            .list_assignments(group)
            .await
            .map_err(|err| internal_err(format!("Could not get the drawn names: {err}")))?;

        content.push_str(&format!("\n{} santas know who they are gifting.", drawn.len()));
    }

    ctx.send(
        CreateReply::default()
            .content(content)
            .components(roster_components(&game, &participants)),
    )
    .await?;

    Ok(())
}
