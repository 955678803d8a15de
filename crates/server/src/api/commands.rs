//! Slash commands the bot answers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use ticketdesk_core::ticket::ticket_form;
use ticketdesk_core::{
    CommandHandler, CommandInvocation, InteractionReply, RateLimitGuard, RateLimiter,
};

/// Name of the command that opens the bug report form.
pub const TICKET_COMMAND: &str = "ticket";

/// Answers `/ticket` with the bug report form.
pub struct OpenTicketForm;

#[async_trait]
impl CommandHandler for OpenTicketForm {
    async fn handle(&self, _invocation: &CommandInvocation) -> InteractionReply {
        InteractionReply::Modal(ticket_form())
    }
}

/// Command handlers by name.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bot's commands, with ticket creation behind the rate limiter.
    pub fn with_ticket_command(limiter: Arc<RateLimiter>) -> Self {
        let mut registry = Self::new();
        registry.register(TICKET_COMMAND, RateLimitGuard::new(limiter, OpenTicketForm));
        registry
    }

    pub fn register(&mut self, name: &str, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ticketdesk_core::ticket::TICKET_FORM_ID;
    use ticketdesk_core::Actor;

    #[tokio::test]
    async fn test_ticket_command_opens_form_then_limits() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(180)));
        let registry = CommandRegistry::with_ticket_command(limiter);
        let handler = registry.get(TICKET_COMMAND).unwrap();
        let invocation = CommandInvocation::new(TICKET_COMMAND, Actor::new(1, "alice"));

        match handler.handle(&invocation).await {
            InteractionReply::Modal(modal) => assert_eq!(modal.custom_id, TICKET_FORM_ID),
            other => panic!("expected form, got {:?}", other),
        }
        assert!(matches!(
            handler.handle(&invocation).await,
            InteractionReply::Message { private: true, .. }
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(CommandRegistry::new().get("restart").is_none());
    }
}
