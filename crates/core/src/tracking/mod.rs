//! Aggregation message listing every open or claimed ticket.
//!
//! The index lives in one bot-authored message in the tracking channel.
//! Its first embed carries the bot's user id as footer, which is how the
//! message is found again. Nothing is cached: every mutation rescans the
//! channel, so the index survives restarts and manual deletion.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::platform::{
    ChannelId, ChatPlatform, Embed, EmbedField, OutgoingMessage, PlatformError, PostedMessage,
};

/// How many recent messages are searched for the index.
pub const SCAN_LIMIT: usize = 123;

pub const INDEX_TITLE: &str = "Bugs not claimed/resolved";
pub const INDEX_DESCRIPTION: &str = "Bugs that are not claimed or not resolved is saved here";
pub const INDEX_COLOR: u32 = 0x3498DB;

#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    #[error("Tracking index unavailable: {0}")]
    Unavailable(#[from] PlatformError),
}

/// One indexed ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingEntry {
    pub title: String,
    pub link: String,
}

pub struct TrackingIndex {
    platform: Arc<dyn ChatPlatform>,
    channel_id: ChannelId,
    /// Serialises the scan-modify-rewrite cycle.
    write_lock: Mutex<()>,
}

impl TrackingIndex {
    pub fn new(platform: Arc<dyn ChatPlatform>, channel_id: ChannelId) -> Self {
        Self {
            platform,
            channel_id,
            write_lock: Mutex::new(()),
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Add an entry. An identical entry already present is left alone.
    pub async fn append(&self, title: &str, link: &str) -> Result<(), TrackingError> {
        let _guard = self.write_lock.lock().await;
        let (message, mut embed) = self.locate().await?;

        if embed.fields.iter().any(|f| f.name == title && f.value == link) {
            debug!(title, "Ticket already tracked");
            return Ok(());
        }

        embed.fields.push(EmbedField::block(title, link));
        self.rewrite(&message, embed).await?;
        debug!(title, link, "Ticket added to tracking index");
        Ok(())
    }

    /// Drop entries matching both `title` and `link`, keeping the rest in order.
    pub async fn remove(&self, title: &str, link: &str) -> Result<(), TrackingError> {
        let _guard = self.write_lock.lock().await;
        let (message, mut embed) = self.locate().await?;

        let before = embed.fields.len();
        embed
            .fields
            .retain(|f| !(f.name == title && f.value == link));

        if embed.fields.len() == before {
            debug!(title, "Ticket was not tracked");
            return Ok(());
        }

        self.rewrite(&message, embed).await?;
        debug!(title, link, "Ticket removed from tracking index");
        Ok(())
    }

    /// Current entries, in display order.
    pub async fn entries(&self) -> Result<Vec<TrackingEntry>, TrackingError> {
        let _guard = self.write_lock.lock().await;
        let (_, embed) = self.locate().await?;
        Ok(embed
            .fields
            .into_iter()
            .map(|f| TrackingEntry {
                title: f.name,
                link: f.value,
            })
            .collect())
    }

    /// Find the index message, creating it if the scan comes up empty.
    async fn locate(&self) -> Result<(PostedMessage, Embed), TrackingError> {
        let bot_id = self.platform.bot_user_id();
        let marker = bot_id.to_string();

        let recent = self
            .platform
            .recent_messages(self.channel_id, SCAN_LIMIT)
            .await?;

        let found = recent.into_iter().find(|m| {
            m.author_id == bot_id
                && m.first_embed().and_then(|e| e.footer.as_deref()) == Some(marker.as_str())
        });

        let message = match found {
            Some(message) => message,
            None => {
                info!(channel_id = self.channel_id, "Creating tracking index message");
                let embed =
                    Embed::new(INDEX_TITLE, INDEX_DESCRIPTION, INDEX_COLOR).with_footer(marker);
                self.platform
                    .send_message(self.channel_id, OutgoingMessage::embed(embed))
                    .await?
            }
        };

        let embed = message.first_embed().cloned().unwrap_or_default();
        Ok((message, embed))
    }

    async fn rewrite(&self, message: &PostedMessage, embed: Embed) -> Result<(), TrackingError> {
        self.platform
            .edit_message(self.channel_id, message.id, OutgoingMessage::embed(embed))
            .await?;
        Ok(())
    }
}
