//! Rate limiting composed in front of a command handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::command::{CommandHandler, CommandInvocation};
use crate::metrics;
use crate::platform::{Embed, InteractionReply};

use super::limiter::{Decision, RateLimiter};

const RATE_LIMITED_COLOR: u32 = 0xE74C3C;

/// The private reply shown to a throttled actor.
pub fn rate_limited_embed(retry_after: Duration) -> Embed {
    Embed::new(
        "Rate Limited",
        format!(
            "Please wait `{}` seconds before using this command again.",
            retry_after.as_secs()
        ),
        RATE_LIMITED_COLOR,
    )
}

/// Wraps a handler so it only runs when the limiter allows the actor.
pub struct RateLimitGuard<H> {
    limiter: Arc<RateLimiter>,
    inner: H,
}

impl<H: CommandHandler> RateLimitGuard<H> {
    pub fn new(limiter: Arc<RateLimiter>, inner: H) -> Self {
        Self { limiter, inner }
    }

    #[cfg(test)]
    fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for RateLimitGuard<H> {
    async fn handle(&self, invocation: &CommandInvocation) -> InteractionReply {
        match self
            .limiter
            .check_and_record(&invocation.actor, Utc::now())
            .await
        {
            Decision::Allow => self.inner.handle(invocation).await,
            Decision::Deny { retry_after } => {
                metrics::RATE_LIMIT_DENIALS
                    .with_label_values(&[invocation.name.as_str()])
                    .inc();
                info!(
                    actor_id = invocation.actor.id,
                    command = %invocation.name,
                    retry_after_secs = retry_after.as_secs(),
                    "Command rate limited"
                );
                InteractionReply::private_embed(rate_limited_embed(retry_after))
            }
        }
    }
}
