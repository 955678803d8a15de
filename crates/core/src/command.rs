//! Slash command handling seam.

use async_trait::async_trait;

use crate::platform::{Actor, GuildId, InteractionReply};

/// A slash command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    pub name: String,
    pub actor: Actor,
    pub guild_id: Option<GuildId>,
}

impl CommandInvocation {
    pub fn new(name: impl Into<String>, actor: Actor) -> Self {
        Self {
            name: name.into(),
            actor,
            guild_id: None,
        }
    }
}

/// Something that answers a slash command.
///
/// Handlers compose: a wrapper such as `RateLimitGuard` implements this
/// trait around another handler.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, invocation: &CommandInvocation) -> InteractionReply;
}
