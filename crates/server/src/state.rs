use std::sync::Arc;
use std::time::Duration;

use ticketdesk_core::{Authenticator, Config, SanitizedConfig, TicketDesk, TicketStore};

use crate::api::CommandRegistry;

/// How long a ticket action may run before its reply is deferred. The
/// platform drops interactions left unanswered for three seconds.
pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_millis(2500);

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    desk: Arc<TicketDesk>,
    commands: CommandRegistry,
    reply_deadline: Duration,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        desk: Arc<TicketDesk>,
        commands: CommandRegistry,
    ) -> Self {
        Self {
            config,
            authenticator,
            desk,
            commands,
            reply_deadline: DEFAULT_REPLY_DEADLINE,
        }
    }

    pub fn with_reply_deadline(mut self, deadline: Duration) -> Self {
        self.reply_deadline = deadline;
        self
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn desk(&self) -> &TicketDesk {
        self.desk.as_ref()
    }

    pub fn reply_deadline(&self) -> Duration {
        self.reply_deadline
    }

    pub fn ticket_store(&self) -> &Arc<dyn TicketStore> {
        self.desk.store()
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }
}
