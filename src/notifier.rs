use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use indoc::formatdoc;
use poise::serenity_prelude::{ChannelId, CreateMessage, Http, Mentionable, UserId};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("could not reach the user: {0}")]
    Unreachable(String),
    #[error("timed out")]
    TimedOut,
}

/// Tells a santa who they are gifting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentNotice {
    pub santa: UserId,
    pub group: ChannelId,
    pub target: UserId,
    pub target_name: String,
    pub exchange_date: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_assignment(&self, notice: &AssignmentNotice) -> Result<(), DeliveryError>;

    async fn send_join_confirmation(
        &self,
        participant: UserId,
        group: ChannelId,
    ) -> Result<(), DeliveryError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedDelivery {
    pub santa: UserId,
    pub error: DeliveryError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<UserId>,
    pub failed: Vec<FailedDelivery>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends every notice on its own, giving each one up to `timeout`.
///
/// A failure never stops the remaining deliveries.
#[tracing::instrument(skip_all, fields(notices = notices.len()))]
pub async fn deliver_assignments(
    notifier: &dyn Notifier,
    notices: &[AssignmentNotice],
    timeout: Duration,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for notice in notices {
        let result = match tokio::time::timeout(timeout, notifier.send_assignment(notice)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut),
        };

        match result {
            Ok(()) => report.delivered.push(notice.santa),
            Err(error) => {
                warn!("Could not notify santa {}: {error}", notice.santa);
                report.failed.push(FailedDelivery {
                    santa: notice.santa,
                    error,
                });
            }
        }
    }

    info!(
        "Delivered {} of {} assignments",
        report.delivered.len(),
        notices.len()
    );

    report
}

/// Delivers notices as Discord direct messages.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> DiscordNotifier {
        DiscordNotifier { http }
    }

    async fn direct_message(&self, user: UserId, content: String) -> Result<(), DeliveryError> {
        user.direct_message(&self.http, CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(|err| DeliveryError::Unreachable(err.to_string()))
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_assignment(&self, notice: &AssignmentNotice) -> Result<(), DeliveryError> {
        let exchange_date = notice
            .exchange_date
            .as_deref()
            .map(|date| format!("\nGifting day: **{date}**"))
            .unwrap_or_default();

        let content = formatdoc! {
            r#"
                # You are {target}'s Secret Santa!

                The draw in {group} is done and you are gifting **{target_name}**. Make sure you get them something good!
                {exchange_date}
                Lost this message? Use `/santa mine` to see it again.
            "#,
            target = notice.target.mention(),
            target_name = notice.target_name,
            group = notice.group.mention(),
            exchange_date = exchange_date,
        };

        self.direct_message(notice.santa, content).await
    }

    async fn send_join_confirmation(
        &self,
        participant: UserId,
        group: ChannelId,
    ) -> Result<(), DeliveryError> {
        let content = format!(
            "You have joined the Secret Santa in {}. I will message you here once names are drawn.",
            group.mention()
        );

        self.direct_message(participant, content).await
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use map_macro::hash_set;
    use poise::serenity_prelude::{ChannelId, UserId};
    use test_log::test;

    use super::{
        deliver_assignments, testing::RecordingNotifier, AssignmentNotice, DeliveryError,
        FailedDelivery,
    };

    fn notice(santa: u64, target: u64) -> AssignmentNotice {
        AssignmentNotice {
            santa: UserId::new(santa),
            group: ChannelId::new(1),
            target: UserId::new(target),
            target_name: format!("user {target}"),
            exchange_date: None,
        }
    }

    #[test(tokio::test)]
    async fn failures_do_not_stop_the_batch() {
        let notifier = RecordingNotifier {
            unreachable: hash_set! { UserId::new(2) },
            ..Default::default()
        };
        let notices = vec![notice(1, 2), notice(2, 3), notice(3, 1)];

        let report = deliver_assignments(&notifier, &notices, Duration::from_secs(5)).await;

        assert_eq!(report.delivered, vec![UserId::new(1), UserId::new(3)]);
        assert_eq!(
            report.failed,
            vec![FailedDelivery {
                santa: UserId::new(2),
                error: DeliveryError::Unreachable("DMs are closed".to_string()),
            }]
        );
        assert!(!report.all_delivered());
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[test(tokio::test(start_paused = true))]
    async fn slow_delivery_times_out() {
        let notifier = RecordingNotifier {
            slow: hash_set! { UserId::new(1) },
            ..Default::default()
        };
        let notices = vec![notice(1, 2), notice(2, 1)];

        let report = deliver_assignments(&notifier, &notices, Duration::from_secs(10)).await;

        assert_eq!(report.delivered, vec![UserId::new(2)]);
        assert_eq!(
            report.failed,
            vec![FailedDelivery {
                santa: UserId::new(1),
                error: DeliveryError::TimedOut,
            }]
        );
    }
}
