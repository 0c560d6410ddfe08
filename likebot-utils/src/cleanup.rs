use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// A message scheduled for deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CleanupTarget {
    /// A regular channel message (prefix replies and invoking messages).
    ChannelMessage {
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    },
    /// The original response of a slash interaction, addressed by its token.
    InteractionResponse { token: String },
}

impl CleanupTarget {
    fn describe(&self) -> String {
        match self {
            Self::ChannelMessage {
                channel_id,
                message_id,
            } => format!("message {} in channel {}", message_id.get(), channel_id.get()),
            Self::InteractionResponse { .. } => "interaction response".to_owned(),
        }
    }
}

/// Something that can delete a [`CleanupTarget`].
pub trait MessageDeleter: Send + Sync + 'static {
    fn delete(
        &self,
        target: &CleanupTarget,
    ) -> impl Future<Output = Result<(), serenity::Error>> + Send;
}

impl MessageDeleter for Arc<serenity::Http> {
    async fn delete(&self, target: &CleanupTarget) -> Result<(), serenity::Error> {
        let http: &serenity::Http = self;
        match target {
            CleanupTarget::ChannelMessage {
                channel_id,
                message_id,
            } => channel_id.delete_message(http, *message_id).await,
            CleanupTarget::InteractionResponse { token } => {
                http.delete_original_interaction_response(token).await
            }
        }
    }
}

/// Delete `targets` in order after `delay`, on a detached task.
///
/// Failures are logged per target and never reach the caller; a failed
/// deletion does not stop the remaining ones.
pub fn schedule_cleanup<D>(
    deleter: D,
    delay: Duration,
    targets: Vec<CleanupTarget>,
) -> JoinHandle<()>
where
    D: MessageDeleter,
{
    tokio::spawn(async move {
        sleep(delay).await;

        for target in &targets {
            match deleter.delete(target).await {
                Ok(()) => debug!(target = %target.describe(), "transient message deleted"),
                Err(source) if is_forbidden(&source) => {
                    warn!(
                        ?source,
                        target = %target.describe(),
                        "missing permissions to delete message"
                    );
                }
                Err(source) => {
                    error!(
                        ?source,
                        target = %target.describe(),
                        "discord error while deleting message"
                    );
                }
            }
        }
    })
}

fn is_forbidden(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use poise::serenity_prelude as serenity;

    use super::{CleanupTarget, MessageDeleter, schedule_cleanup};

    #[derive(Clone, Default)]
    struct RecordingDeleter {
        deleted: Arc<Mutex<Vec<CleanupTarget>>>,
        fail_first: bool,
    }

    impl MessageDeleter for RecordingDeleter {
        async fn delete(&self, target: &CleanupTarget) -> Result<(), serenity::Error> {
            let mut deleted = self.deleted.lock().unwrap();
            let first = deleted.is_empty();
            deleted.push(target.clone());
            if self.fail_first && first {
                return Err(serenity::Error::Other("missing permissions"));
            }
            Ok(())
        }
    }

    fn channel_message(channel: u64, message: u64) -> CleanupTarget {
        CleanupTarget::ChannelMessage {
            channel_id: serenity::ChannelId::new(channel),
            message_id: serenity::MessageId::new(message),
        }
    }

    #[tokio::test]
    async fn waits_for_delay_before_deleting() {
        let deleter = RecordingDeleter::default();
        let handle = schedule_cleanup(
            deleter.clone(),
            Duration::from_millis(100),
            vec![channel_message(1, 2)],
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(deleter.deleted.lock().unwrap().is_empty());

        handle.await.unwrap();
        assert_eq!(*deleter.deleted.lock().unwrap(), vec![channel_message(1, 2)]);
    }

    #[tokio::test]
    async fn failed_deletion_does_not_stop_the_rest() {
        let deleter = RecordingDeleter {
            fail_first: true,
            ..Default::default()
        };
        let targets = vec![
            CleanupTarget::InteractionResponse {
                token: "token".to_owned(),
            },
            channel_message(1, 3),
        ];

        schedule_cleanup(deleter.clone(), Duration::ZERO, targets.clone())
            .await
            .unwrap();

        assert_eq!(*deleter.deleted.lock().unwrap(), targets);
    }
}
