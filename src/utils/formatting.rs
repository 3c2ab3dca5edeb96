use poise::serenity_prelude::{ButtonStyle, CreateActionRow, CreateButton, Mentionable};
use time::OffsetDateTime;

use crate::{
    draw_service::DrawOutcome,
    models::{Game, GameStatus, Participant, SantaAssignment},
    notifier::DeliveryError,
};

pub const JOIN_BUTTON: &str = "santa_join";
pub const DRAW_BUTTON: &str = "santa_draw";

/// Rendered by Discord as e.g. `2 hours ago` in the reader's language.
pub fn relative_time(date_time: impl Into<OffsetDateTime>) -> String {
    format!("<t:{}:R>", date_time.into().unix_timestamp())
}

pub fn roster_message(game: &Game, participants: &[Participant]) -> String {
    let mut message = format!(
        "# Secret Santa\nStarted {} ({}).\n",
        relative_time(game.started_at),
        game.started_at
    );

    match &game.exchange_date {
        Some(date) => message.push_str(&format!("Gifting day: **{date}**\n")),
        None => message.push_str("Gifting day: not set yet, use `/santa setdate`.\n"),
    }

    message.push_str(&format!("\n**Participants ({}):**\n", participants.len()));
    for participant in participants {
        message.push_str(&format!("- {}\n", participant.display_name));
    }

    message.push('\n');
    message.push_str(match game.status {
        GameStatus::Joining if participants.len() >= 2 => "Is everyone in? Hit **Draw**!",
        GameStatus::Joining => "Are you planning to gift yourself? Wait for more people to join...",
        GameStatus::Drawing => "Names are being drawn...",
        GameStatus::Completed => "Names have been drawn! Check your DMs.",
    });

    message
}

pub fn roster_components(game: &Game, participants: &[Participant]) -> Vec<CreateActionRow> {
    if game.status != GameStatus::Joining {
        return vec![];
    }

    let mut buttons = vec![CreateButton::new(JOIN_BUTTON)
        .label("Join")
        .style(ButtonStyle::Primary)];

    if participants.len() >= 2 {
        buttons.push(
            CreateButton::new(DRAW_BUTTON)
                .label("Draw")
                .style(ButtonStyle::Success),
        );
    }

    vec![CreateActionRow::Buttons(buttons)]
}

pub fn draw_summary(outcome: &DrawOutcome, participants: &[Participant]) -> String {
    let mut message = format!(
        "# Names have been drawn!\nParticipants: {}\nDMs sent: {}\n",
        outcome.pairs.len(),
        outcome.report.delivered.len(),
    );

    if outcome.report.all_delivered() {
        message.push_str("\nCheck your DMs to see who you got!");
        return message;
    }

    message.push_str("\nI could not reach:\n");
    for failed in &outcome.report.failed {
        let name = participants
            .iter()
            .find(|p| p.id == failed.santa)
            .map(|p| p.display_name.as_str())
            .unwrap_or("someone");

        let reason = match failed.error {
            DeliveryError::TimedOut => "timed out",
            DeliveryError::Unreachable(_) => "DMs are closed",
        };

        message.push_str(&format!("- {} ({name}, {reason})\n", failed.santa.mention()));
    }
    message.push_str("\nOpen your DMs to me and use `/santa mine` to see who you got.");

    message
}

pub fn assignments_message(assignments: &[SantaAssignment]) -> String {
    if assignments.is_empty() {
        return "You are not anyone's Secret Santa yet.".to_string();
    }

    let mut message = String::from("# Your Secret Santa assignments\n");
    for assignment in assignments {
        message.push_str(&format!(
            "- In {} you are gifting **{}**",
            assignment.group.mention(),
            assignment.recipient_name
        ));
        match &assignment.exchange_date {
            Some(date) => message.push_str(&format!(", gifting day: {date}\n")),
            None => message.push('\n'),
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::{ChannelId, UserId};
    use time::macros::datetime;

    use crate::{
        draw_service::DrawOutcome,
        models::{types::UtcDateTime, Game, GameStatus, Pairing, Participant, SantaAssignment},
        notifier::{DeliveryError, DeliveryReport, FailedDelivery},
    };

    use super::{assignments_message, draw_summary, roster_components, roster_message};

    fn game(status: GameStatus, exchange_date: Option<&str>) -> Game {
        Game {
            group: ChannelId::new(1),
            status,
            started_at: UtcDateTime::assume_utc(datetime!(2024-12-01 12:00:00)),
            exchange_date: exchange_date.map(str::to_string),
        }
    }

    fn participant(id: u64, name: &str) -> Participant {
        Participant {
            id: UserId::new(id),
            group: ChannelId::new(1),
            display_name: name.to_string(),
            joined_at: UtcDateTime::assume_utc(datetime!(2024-12-01 12:00:00)),
        }
    }

    #[test]
    fn roster_lists_participants() {
        let participants = vec![participant(1, "Alice"), participant(2, "Bob")];
        let message = roster_message(&game(GameStatus::Joining, Some("Dec 24th")), &participants);

        assert!(message.contains("Started <t:1733054400:R> (2024-12-01 12:00 UTC)."));
        assert!(message.contains("Gifting day: **Dec 24th**"));
        assert!(message.contains("**Participants (2):**\n- Alice\n- Bob\n"));
        assert!(message.ends_with("Hit **Draw**!"));
    }

    #[test]
    fn roster_waits_for_more_people() {
        let participants = vec![participant(1, "Alice")];
        let game = game(GameStatus::Joining, None);

        assert!(roster_message(&game, &participants).contains("not set yet"));
        assert!(roster_message(&game, &participants).ends_with("more people to join..."));
        assert_eq!(roster_components(&game, &participants).len(), 1);
    }

    #[test]
    fn no_buttons_after_the_draw() {
        let participants = vec![participant(1, "Alice"), participant(2, "Bob")];

        assert!(roster_components(&game(GameStatus::Completed, None), &participants).is_empty());
        assert!(roster_components(&game(GameStatus::Drawing, None), &participants).is_empty());
    }

    #[test]
    fn summary_names_unreachable_santas() {
        let participants = vec![participant(1, "Alice"), participant(2, "Bob")];
        let outcome = DrawOutcome {
            pairs: vec![
                Pairing::from((UserId::new(1), UserId::new(2))),
                Pairing::from((UserId::new(2), UserId::new(1))),
            ],
            report: DeliveryReport {
                delivered: vec![UserId::new(1)],
                failed: vec![FailedDelivery {
                    santa: UserId::new(2),
                    error: DeliveryError::TimedOut,
                }],
            },
        };

        let summary = draw_summary(&outcome, &participants);

        assert!(summary.contains("Participants: 2\nDMs sent: 1\n"));
        assert!(summary.contains("- <@2> (Bob, timed out)"));
    }

    #[test]
    fn assignments_list() {
        assert_eq!(
            assignments_message(&[]),
            "You are not anyone's Secret Santa yet."
        );

        let message = assignments_message(&[
            SantaAssignment {
                group: ChannelId::new(10),
                recipient_name: "Bob".to_string(),
                exchange_date: Some("Dec 24th".to_string()),
            },
            SantaAssignment {
                group: ChannelId::new(11),
                recipient_name: "Carol".to_string(),
                exchange_date: None,
            },
        ]);

        assert!(message.contains("- In <#10> you are gifting **Bob**, gifting day: Dec 24th\n"));
        assert!(message.contains("- In <#11> you are gifting **Carol**\n"));
    }
}
