use async_trait::async_trait;
use thiserror::Error;

use super::types::{ChannelId, MessageId, OutgoingMessage, PostedMessage, UserId};

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("Platform connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Platform API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to decode platform response: {0}")]
    Decode(String),
}

/// Capabilities the ticket desk needs from a chat platform.
///
/// Messages are the only persistence the platform offers: everything is
/// posted, edited, fetched back or listed by recency.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// User id of the bot itself.
    fn bot_user_id(&self) -> UserId;

    /// Post a new message to a channel.
    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError>;

    /// Replace the content of an existing message.
    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError>;

    /// Fetch a single message.
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<PostedMessage, PlatformError>;

    /// Up to `limit` most recent messages of a channel, newest first.
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<PostedMessage>, PlatformError>;

    /// Send a direct message to a user.
    async fn send_direct_message(&self, user_id: UserId, content: &str)
        -> Result<(), PlatformError>;

    /// Replace the text of a deferred interaction reply.
    async fn edit_interaction_reply(
        &self,
        application_id: u64,
        token: &str,
        content: &str,
    ) -> Result<(), PlatformError>;
}
