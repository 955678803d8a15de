//! Discord REST adapter for [`ChatPlatform`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::metrics;

use crate::config::DiscordConfig;
use crate::platform::{
    ChannelId, ChatPlatform, MessageId, OutgoingMessage, PlatformError, PostedMessage, UserId,
};

use super::model::{DiscordChannel, DiscordMessage, DiscordMessageBody, DiscordUser};

/// Largest page the message history endpoint serves.
const HISTORY_PAGE_SIZE: usize = 100;

/// Discord client speaking the REST API with a bot token.
pub struct DiscordClient {
    client: Client,
    config: DiscordConfig,
    bot_user_id: UserId,
}

impl DiscordClient {
    /// Create a client for a bot whose user id is already known.
    pub fn new(config: DiscordConfig, bot_user_id: UserId) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            bot_user_id,
        })
    }

    /// Create a client and resolve the bot's own user id from the token.
    pub async fn connect(config: DiscordConfig) -> Result<Self, PlatformError> {
        let mut client = Self::new(config, 0)?;
        let me: DiscordUser = client
            .send_json("current_user", client.request(Method::GET, "/users/@me")).await?;
        client.bot_user_id = me.id;
        Ok(client)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .header("Authorization", format!("Bot {}", self.config.token))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, PlatformError> {
        let start = Instant::now();
        let result = self.execute(request).await;

        metrics::PLATFORM_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
        metrics::PLATFORM_REQUESTS
            .with_label_values(&[operation, if result.is_ok() { "success" } else { "error" }])
            .inc();

        result
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PlatformError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PlatformError::Timeout
            } else {
                PlatformError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound(response.url().path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    fn bot_user_id(&self) -> UserId {
        self.bot_user_id
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError> {
        let body = DiscordMessageBody::from(&message);
        let posted: DiscordMessage = self
            .send_json(
                "send_message",
                self.request(Method::POST, &format!("/channels/{}/messages", channel_id))
                    .json(&body),
            )
            .await?;
        debug!(channel_id, message_id = posted.id, "Posted message");
        Ok(posted.into())
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<PostedMessage, PlatformError> {
        let body = DiscordMessageBody::from(&message);
        let edited: DiscordMessage = self
            .send_json(
                "edit_message",
                self.request(
                    Method::PATCH,
                    &format!("/channels/{}/messages/{}", channel_id, message_id),
                )
                .json(&body),
            )
            .await?;
        debug!(channel_id, message_id, "Edited message");
        Ok(edited.into())
    }

    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<PostedMessage, PlatformError> {
        let message: DiscordMessage = self
            .send_json(
                "fetch_message",
                self.request(
                    Method::GET,
                    &format!("/channels/{}/messages/{}", channel_id, message_id),
                ),
            )
            .await?;
        Ok(message.into())
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<PostedMessage>, PlatformError> {
        let mut collected: Vec<PostedMessage> = Vec::with_capacity(limit);
        let mut before: Option<MessageId> = None;

        while collected.len() < limit {
            let page_size = (limit - collected.len()).min(HISTORY_PAGE_SIZE);
            let mut path = format!("/channels/{}/messages?limit={}", channel_id, page_size);
            if let Some(before) = before {
                path.push_str(&format!("&before={}", before));
            }

            let page: Vec<DiscordMessage> =
                self.send_json("recent_messages", self.request(Method::GET, &path)).await?;
            let exhausted = page.len() < page_size;
            before = page.last().map(|m| m.id);
            collected.extend(page.into_iter().map(PostedMessage::from));

            if exhausted || before.is_none() {
                break;
            }
        }

        Ok(collected)
    }

    async fn send_direct_message(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<(), PlatformError> {
        let channel: DiscordChannel = self
            .send_json(
                "open_dm",
                self.request(Method::POST, "/users/@me/channels")
                    .json(&json!({ "recipient_id": user_id.to_string() })),
            )
            .await?;

        let _: DiscordMessage = self
            .send_json(
                "send_dm",
                self.request(Method::POST, &format!("/channels/{}/messages", channel.id))
                    .json(&json!({ "content": content })),
            )
            .await?;
        Ok(())
    }

    async fn edit_interaction_reply(
        &self,
        application_id: u64,
        token: &str,
        content: &str,
    ) -> Result<(), PlatformError> {
        let _: serde_json::Value = self
            .send_json(
                "edit_interaction_reply",
                self.request(Method::PATCH, &interaction_reply_path(application_id, token))
                    .json(&json!({ "content": content })),
            )
            .await?;
        debug!(application_id, "Edited deferred interaction reply");
        Ok(())
    }
}

/// Webhook path of the original response to an interaction.
fn interaction_reply_path(application_id: u64, token: &str) -> String {
    format!("/webhooks/{}/{}/messages/@original", application_id, token)
}
