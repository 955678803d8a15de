//! Direct-message notifications to ticket submitters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::platform::{ChatPlatform, PlatformError, UserId};

/// Terminal-transition notice for the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Resolved {
        title: String,
        at: DateTime<Utc>,
    },
    Closed {
        title: String,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl Notification {
    pub fn message(&self) -> String {
        match self {
            Notification::Resolved { title, at } => format!(
                "Your ticket has been marked as resolved!\nTicket title: `{}`\nResolved At: <t:{}:R>",
                title,
                at.timestamp()
            ),
            Notification::Closed { title, reason, at } => format!(
                "Your ticket was closed!\nTicket title: {}\nReason: `{}`\nClosed at: <t:{}:R>",
                title,
                reason,
                at.timestamp()
            ),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Failed to deliver notification: {0}")]
    Delivery(#[from] PlatformError),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: UserId, notification: &Notification)
        -> Result<(), NotifyError>;
}

/// Delivers notifications as direct messages through the chat platform.
pub struct PlatformNotifier {
    platform: Arc<dyn ChatPlatform>,
}

impl PlatformNotifier {
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Notifier for PlatformNotifier {
    async fn notify(
        &self,
        recipient: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        self.platform
            .send_direct_message(recipient, &notification.message())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlatform;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_resolved_message() {
        let notification = Notification::Resolved {
            title: "Crash".to_string(),
            at: at(),
        };
        assert_eq!(
            notification.message(),
            "Your ticket has been marked as resolved!\nTicket title: `Crash`\nResolved At: <t:1700000000:R>"
        );
    }

    #[test]
    fn test_closed_message_includes_reason_verbatim() {
        let notification = Notification::Closed {
            title: "Crash".to_string(),
            reason: "duplicate".to_string(),
            at: at(),
        };
        assert_eq!(
            notification.message(),
            "Your ticket was closed!\nTicket title: Crash\nReason: `duplicate`\nClosed at: <t:1700000000:R>"
        );
    }

    #[tokio::test]
    async fn test_platform_notifier_sends_dm() {
        let platform = Arc::new(MockPlatform::new(1));
        let notifier = PlatformNotifier::new(platform.clone());
        let notification = Notification::Resolved {
            title: "Crash".to_string(),
            at: at(),
        };

        notifier.notify(42, &notification).await.unwrap();

        let dms = platform.direct_messages().await;
        assert_eq!(dms, vec![(42, notification.message())]);
    }

    #[tokio::test]
    async fn test_platform_notifier_reports_failure() {
        let platform = Arc::new(MockPlatform::new(1));
        platform.set_fail_direct_messages(true).await;
        let notifier = PlatformNotifier::new(platform);

        let result = notifier
            .notify(
                42,
                &Notification::Resolved {
                    title: "Crash".to_string(),
                    at: at(),
                },
            )
            .await;
        assert!(matches!(result, Err(NotifyError::Delivery(_))));
    }
}
