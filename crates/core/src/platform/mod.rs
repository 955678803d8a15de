//! Chat platform abstraction.
//!
//! The desk never touches platform client types directly. It works against
//! the narrow [`ChatPlatform`] trait, implemented by [`DiscordClient`] for
//! production and by `testing::MockPlatform` in tests.

pub mod discord;
mod traits;
mod types;

pub use discord::DiscordClient;
pub use traits::*;
pub use types::*;

/// Render a user mention.
pub fn mention(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

/// Link that jumps to a message in a guild channel.
pub fn jump_url(guild_id: GuildId, channel_id: ChannelId, message_id: MessageId) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id, channel_id, message_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention() {
        assert_eq!(mention(42), "<@42>");
    }

    #[test]
    fn test_jump_url() {
        assert_eq!(
            jump_url(1, 2, 3),
            "https://discord.com/channels/1/2/3"
        );
    }
}
