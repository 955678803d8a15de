//! In-memory chat platform for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::platform::{
    ChannelId, ChatPlatform, MessageId, OutgoingMessage, PlatformError, PostedMessage, UserId,
};

/// Mock implementation of the ChatPlatform trait.
///
/// Keeps channels as ordered message lists and records direct messages
/// and deferred interaction replies. Failures can be injected per channel
/// or for all direct messages, and channel operations can be slowed down.
///
/// # Example
///
/// ```rust,ignore
/// use ticketdesk_core::testing::MockPlatform;
///
/// let platform = Arc::new(MockPlatform::new(BOT_ID));
/// platform.fail_channel(TRACKING_CHANNEL).await;
///
/// // ... run a transition ...
///
/// assert_eq!(platform.direct_messages().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockPlatform {
    bot_user_id: UserId,
    /// Messages per channel, oldest first.
    channels: Arc<RwLock<HashMap<ChannelId, Vec<PostedMessage>>>>,
    direct_messages: Arc<RwLock<Vec<(UserId, String)>>>,
    /// Deferred reply edits as `(interaction token, content)`.
    interaction_replies: Arc<RwLock<Vec<(String, String)>>>,
    latency: Arc<RwLock<Duration>>,
    next_id: Arc<RwLock<MessageId>>,
    failing_channels: Arc<RwLock<HashSet<ChannelId>>>,
    fail_direct_messages: Arc<RwLock<bool>>,
    edit_count: Arc<RwLock<usize>>,
}

impl MockPlatform {
    pub fn new(bot_user_id: UserId) -> Self {
        Self {
            bot_user_id,
            channels: Arc::new(RwLock::new(HashMap::new())),
            direct_messages: Arc::new(RwLock::new(Vec::new())),
            interaction_replies: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            next_id: Arc::new(RwLock::new(1_000)),
            failing_channels: Arc::new(RwLock::new(HashSet::new())),
            fail_direct_messages: Arc::new(RwLock::new(false)),
            edit_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Put a message into a channel as if `author_id` had posted it.
    pub async fn insert_message(
        &self,
        channel_id: ChannelId,
        author_id: UserId,
        message: OutgoingMessage,
    ) -> PostedMessage {
        let posted = PostedMessage {
            id: self.allocate_id().await,
            channel_id,
            author_id,
            content: message.content,
            embeds: message.embeds,
            buttons: message.buttons,
        };
        self.channels
            .write()
            .await
            .entry(channel_id)
            .or_default()
            .push(posted.clone());
        posted
    }

    /// All messages of a channel, oldest first.
    pub async fn channel_messages(&self, channel_id: ChannelId) -> Vec<PostedMessage> {
        self.channels
            .read()
            .await
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Option<PostedMessage> {
        self.channels
            .read()
            .await
            .get(&channel_id)
            .and_then(|messages| messages.iter().find(|m| m.id == message_id).cloned())
    }

    /// Direct messages sent so far as `(recipient, content)`.
    pub async fn direct_messages(&self) -> Vec<(UserId, String)> {
        self.direct_messages.read().await.clone()
    }

    /// Deferred interaction replies edited so far as `(token, content)`.
    pub async fn interaction_replies(&self) -> Vec<(String, String)> {
        self.interaction_replies.read().await.clone()
    }

    /// Delay every channel operation by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Number of successful message edits.
    pub async fn edit_count(&self) -> usize {
        *self.edit_count.read().await
    }

    /// Make every operation on `channel_id` fail.
    pub async fn fail_channel(&self, channel_id: ChannelId) {
        self.failing_channels.write().await.insert(channel_id);
    }

    pub async fn restore_channel(&self, channel_id: ChannelId) {
        self.failing_channels.write().await.remove(&channel_id);
    }

    pub async fn set_fail_direct_messages(&self, fail: bool) {
        *self.fail_direct_messages.write().await = fail;
    }

    async fn allocate_id(&self) -> MessageId {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        *next_id
    }

    async fn check_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing_channels.read().await.contains(&channel_id) {
            return Err(PlatformError::ConnectionFailed(format!(
                "channel {} unavailable",
                channel_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    fn bot_user_id(&self) -> UserId {
        self.bot_user_id
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError> {
        self.check_channel(channel_id).await?;
        Ok(self
            .insert_message(channel_id, self.bot_user_id, message)
            .await)
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError> {
        self.check_channel(channel_id).await?;
        let mut channels = self.channels.write().await;
        let existing = channels
            .get_mut(&channel_id)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| PlatformError::NotFound(format!("message {}", message_id)))?;

        existing.content = message.content;
        existing.embeds = message.embeds;
        existing.buttons = message.buttons;
        let edited = existing.clone();
        drop(channels);

        *self.edit_count.write().await += 1;
        Ok(edited)
    }

    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<PostedMessage, PlatformError> {
        self.check_channel(channel_id).await?;
        self.message(channel_id, message_id)
            .await
            .ok_or_else(|| PlatformError::NotFound(format!("message {}", message_id)))
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<PostedMessage>, PlatformError> {
        self.check_channel(channel_id).await?;
        Ok(self
            .channel_messages(channel_id)
            .await
            .into_iter()
            .rev()
            .take(limit)
            .collect())
    }

    async fn send_direct_message(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<(), PlatformError> {
        if *self.fail_direct_messages.read().await {
            return Err(PlatformError::Api {
                status: 403,
                message: "Cannot send messages to this user".to_string(),
            });
        }
        self.direct_messages
            .write()
            .await
            .push((user_id, content.to_string()));
        Ok(())
    }

    async fn edit_interaction_reply(
        &self,
        _application_id: u64,
        token: &str,
        content: &str,
    ) -> Result<(), PlatformError> {
        self.interaction_replies
            .write()
            .await
            .push((token.to_string(), content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_messages_newest_first_and_limited() {
        let platform = MockPlatform::new(1);
        for i in 0..5 {
            platform
                .send_message(10, OutgoingMessage::text(format!("m{}", i)))
                .await
                .unwrap();
        }

        let recent = platform.recent_messages(10, 2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.clone().unwrap()).collect();
        assert_eq!(contents, vec!["m4", "m3"]);
    }

    #[tokio::test]
    async fn test_edit_and_failure_injection() {
        let platform = MockPlatform::new(1);
        let posted = platform
            .send_message(10, OutgoingMessage::text("before"))
            .await
            .unwrap();

        platform
            .edit_message(10, posted.id, OutgoingMessage::text("after"))
            .await
            .unwrap();
        assert_eq!(
            platform.message(10, posted.id).await.unwrap().content.as_deref(),
            Some("after")
        );
        assert_eq!(platform.edit_count().await, 1);

        platform.fail_channel(10).await;
        assert!(platform.fetch_message(10, posted.id).await.is_err());
        platform.restore_channel(10).await;
        assert!(platform.fetch_message(10, posted.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_latency_and_interaction_replies() {
        let platform = MockPlatform::new(1);
        platform.set_latency(Duration::from_millis(30)).await;

        let started = tokio::time::Instant::now();
        platform
            .send_message(10, OutgoingMessage::text("slow"))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));

        platform
            .edit_interaction_reply(5, "token", "done")
            .await
            .unwrap();
        assert_eq!(
            platform.interaction_replies().await,
            vec![("token".to_string(), "done".to_string())]
        );
    }
}
