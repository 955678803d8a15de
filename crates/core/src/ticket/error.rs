use thiserror::Error;

use crate::platform::PlatformError;

use super::store::StoreError;

/// Reasons a ticket operation did not happen.
///
/// The precondition variants display as the private reply shown to the
/// actor.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("This ticket is already claimed!")]
    AlreadyClaimed,

    #[error("You have to claim this ticket first!")]
    NotClaimed,

    #[error("You can not mark this ticket as {action} since you didn't claim this ticket!")]
    WrongClaimant { action: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Message {0} does not display a ticket")]
    NotATicket(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TicketError {
    /// Whether the error is a rejected precondition rather than a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TicketError::AlreadyClaimed
                | TicketError::NotClaimed
                | TicketError::WrongClaimant { .. }
                | TicketError::InvalidInput(_)
                | TicketError::NotATicket(_)
        )
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            TicketError::AlreadyClaimed => "already_claimed",
            TicketError::NotClaimed => "not_claimed",
            TicketError::WrongClaimant { .. } => "wrong_claimant",
            TicketError::InvalidInput(_) => "invalid_input",
            TicketError::NotATicket(_) => "not_a_ticket",
            TicketError::Platform(_) => "platform",
            TicketError::Store(_) => "store",
        }
    }

    /// Text to show the actor.
    pub fn user_message(&self) -> String {
        match self {
            TicketError::Platform(_) | TicketError::Store(_) => {
                "Something went wrong while updating this ticket, please try again later."
                    .to_string()
            }
            TicketError::NotATicket(_) => "This message is not a ticket.".to_string(),
            other => other.to_string(),
        }
    }
}

/// A side effect that failed after a transition was committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketWarning {
    #[error("Tracking index unavailable: {0}")]
    TrackingIndexUnavailable(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Ticket record not persisted: {0}")]
    StoreWriteFailed(String),
}

impl TicketWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            TicketWarning::TrackingIndexUnavailable(_) => "tracking_index",
            TicketWarning::NotificationFailed(_) => "notification",
            TicketWarning::StoreWriteFailed(_) => "store",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        assert_eq!(
            TicketError::AlreadyClaimed.user_message(),
            "This ticket is already claimed!"
        );
        assert_eq!(
            TicketError::NotClaimed.user_message(),
            "You have to claim this ticket first!"
        );
        assert_eq!(
            TicketError::WrongClaimant { action: "closed" }.user_message(),
            "You can not mark this ticket as closed since you didn't claim this ticket!"
        );
    }

    #[test]
    fn test_failures_are_not_rejections() {
        assert!(TicketError::NotClaimed.is_rejection());
        assert!(!TicketError::Platform(PlatformError::Timeout).is_rejection());
        assert!(!TicketError::Store(StoreError::Database("locked".into())).is_rejection());
        assert!(TicketError::Platform(PlatformError::Timeout)
            .user_message()
            .contains("try again"));
    }
}
