//! Notifier that records instead of delivering.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notify::{Notification, Notifier, NotifyError};
use crate::platform::{PlatformError, UserId};

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<(UserId, Notification)>>>,
    fail: Arc<RwLock<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far, as `(recipient, notification)`.
    pub async fn sent(&self) -> Vec<(UserId, Notification)> {
        self.sent.read().await.clone()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        if *self.fail.read().await {
            return Err(NotifyError::Delivery(PlatformError::Timeout));
        }
        self.sent
            .write()
            .await
            .push((recipient, notification.clone()));
        Ok(())
    }
}
