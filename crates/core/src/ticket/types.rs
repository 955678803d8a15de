//! Ticket record and its state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{jump_url, ChannelId, GuildId, MessageId, UserId};

use super::error::TicketError;
use super::form::TicketSubmission;

/// Lifecycle state of a ticket.
///
/// The only legal path is `Open -> Claimed -> Resolved | Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Claimed,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::Claimed,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Claimed => "claimed",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }

    /// Position along the lifecycle path. Both terminal states share a rank.
    pub fn rank(&self) -> u8 {
        match self {
            TicketStatus::Open => 0,
            TicketStatus::Claimed => 1,
            TicketStatus::Resolved | TicketStatus::Closed => 2,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket is identified by the message that displays it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl TicketId {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }

    /// Link that jumps to the displaying message.
    pub fn jump_url(&self, guild_id: GuildId) -> String {
        jump_url(guild_id, self.channel_id, self.message_id)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

/// Transitions an actor can request on an existing ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Claim,
    Resolve,
    Close,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Claim => "claim",
            TransitionKind::Resolve => "resolve",
            TransitionKind::Close => "close",
        }
    }

    /// Past participle used in replies ("marked as resolved").
    pub fn past_tense(&self) -> &'static str {
        match self {
            TransitionKind::Claim => "claimed",
            TransitionKind::Resolve => "resolved",
            TransitionKind::Close => "closed",
        }
    }

    /// Private reply to the actor once the transition is committed.
    pub fn success_reply(&self) -> &'static str {
        match self {
            TransitionKind::Claim => "You've claimed this ticket!",
            TransitionKind::Resolve => "Ticket marked as resolved!",
            TransitionKind::Close => "Ticket marked as closed!",
        }
    }
}

/// Structured content and lifecycle state of one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Displaying message. Zeroed until the ticket has been posted.
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub impacted_service: String,
    pub notes: Option<String>,
    pub submitter_id: UserId,
    pub status: TicketStatus,
    /// Set once, on claim.
    pub claimant_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
    pub close_reason: Option<String>,
}

impl TicketRecord {
    /// A fresh `Open` ticket for a validated submission.
    pub fn open(submission: TicketSubmission, submitter_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TicketId::default(),
            title: submission.title,
            description: submission.description,
            impacted_service: submission.impacted_service,
            notes: submission.notes,
            submitter_id,
            status: TicketStatus::Open,
            claimant_id: None,
            created_at: now,
            status_changed_at: now,
            close_reason: None,
        }
    }

    pub fn reference_link(&self, guild_id: GuildId) -> String {
        self.id.jump_url(guild_id)
    }

    /// Take over the lifecycle fields of `other`, keeping this record's content.
    pub fn adopt_lifecycle(&mut self, other: &TicketRecord) {
        self.status = other.status;
        self.claimant_id = other.claimant_id;
        self.status_changed_at = other.status_changed_at;
        self.close_reason = other.close_reason.clone();
    }

    pub fn claim(&mut self, actor: UserId, now: DateTime<Utc>) -> Result<(), TicketError> {
        if self.status != TicketStatus::Open {
            return Err(TicketError::AlreadyClaimed);
        }
        self.status = TicketStatus::Claimed;
        self.claimant_id = Some(actor);
        self.status_changed_at = now;
        Ok(())
    }

    /// Check that `actor` may perform a terminal transition right now.
    pub fn ensure_can_finish(&self, actor: UserId, kind: TransitionKind) -> Result<(), TicketError> {
        if self.status != TicketStatus::Claimed {
            return Err(TicketError::NotClaimed);
        }
        if self.claimant_id != Some(actor) {
            return Err(TicketError::WrongClaimant {
                action: kind.past_tense(),
            });
        }
        Ok(())
    }

    pub fn resolve(&mut self, actor: UserId, now: DateTime<Utc>) -> Result<(), TicketError> {
        self.ensure_can_finish(actor, TransitionKind::Resolve)?;
        self.status = TicketStatus::Resolved;
        self.status_changed_at = now;
        Ok(())
    }

    pub fn close(
        &mut self,
        actor: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        self.ensure_can_finish(actor, TransitionKind::Close)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TicketError::InvalidInput(
                "a close reason is required".to_string(),
            ));
        }
        self.status = TicketStatus::Closed;
        self.close_reason = Some(reason.to_string());
        self.status_changed_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SUBMITTER: UserId = 100;
    const ALICE: UserId = 200;
    const BOB: UserId = 300;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn open_record() -> TicketRecord {
        TicketRecord::open(
            TicketSubmission {
                title: "Login broken".to_string(),
                description: "Cannot log in".to_string(),
                impacted_service: "website".to_string(),
                notes: None,
            },
            SUBMITTER,
            at(0),
        )
    }

    #[test]
    fn test_open_record_defaults() {
        let record = open_record();
        assert_eq!(record.status, TicketStatus::Open);
        assert_eq!(record.claimant_id, None);
        assert_eq!(record.created_at, record.status_changed_at);
    }

    #[test]
    fn test_claim_sets_claimant_once() {
        let mut record = open_record();
        record.claim(ALICE, at(5)).unwrap();

        assert_eq!(record.status, TicketStatus::Claimed);
        assert_eq!(record.claimant_id, Some(ALICE));
        assert_eq!(record.status_changed_at, at(5));

        assert!(matches!(
            record.claim(BOB, at(6)),
            Err(TicketError::AlreadyClaimed)
        ));
        assert_eq!(record.claimant_id, Some(ALICE));
    }

    #[test]
    fn test_resolve_requires_claim() {
        let mut record = open_record();
        assert!(matches!(
            record.resolve(ALICE, at(1)),
            Err(TicketError::NotClaimed)
        ));
        assert_eq!(record.status, TicketStatus::Open);
    }

    #[test]
    fn test_resolve_requires_claimant() {
        let mut record = open_record();
        record.claim(ALICE, at(1)).unwrap();

        let err = record.resolve(BOB, at(2)).unwrap_err();
        assert!(matches!(err, TicketError::WrongClaimant { action: "resolved" }));
        assert_eq!(record.status, TicketStatus::Claimed);

        record.resolve(ALICE, at(3)).unwrap();
        assert_eq!(record.status, TicketStatus::Resolved);
        assert_eq!(record.claimant_id, Some(ALICE));
    }

    #[test]
    fn test_close_records_reason() {
        let mut record = open_record();
        record.claim(ALICE, at(1)).unwrap();
        record.close(ALICE, "  duplicate ", at(2)).unwrap();

        assert_eq!(record.status, TicketStatus::Closed);
        assert_eq!(record.close_reason.as_deref(), Some("duplicate"));
    }

    #[test]
    fn test_close_rejects_blank_reason() {
        let mut record = open_record();
        record.claim(ALICE, at(1)).unwrap();

        assert!(matches!(
            record.close(ALICE, "   ", at(2)),
            Err(TicketError::InvalidInput(_))
        ));
        assert_eq!(record.status, TicketStatus::Claimed);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut record = open_record();
        record.claim(ALICE, at(1)).unwrap();
        record.resolve(ALICE, at(2)).unwrap();

        assert!(matches!(record.claim(BOB, at(3)), Err(TicketError::AlreadyClaimed)));
        assert!(matches!(record.resolve(ALICE, at(3)), Err(TicketError::NotClaimed)));
        assert!(matches!(
            record.close(ALICE, "late", at(3)),
            Err(TicketError::NotClaimed)
        ));
        assert_eq!(record.status, TicketStatus::Resolved);
    }

    #[test]
    fn test_rank_follows_lifecycle() {
        assert!(TicketStatus::Open.rank() < TicketStatus::Claimed.rank());
        assert!(TicketStatus::Claimed.rank() < TicketStatus::Resolved.rank());
        assert_eq!(TicketStatus::Resolved.rank(), TicketStatus::Closed.rank());
    }

    #[test]
    fn test_adopt_lifecycle_keeps_content() {
        let mut stale = open_record();
        let mut displayed = open_record();
        displayed.title = "Login broken (parsed)".to_string();
        displayed.claim(ALICE, at(4)).unwrap();
        displayed.close(ALICE, "duplicate", at(9)).unwrap();

        stale.adopt_lifecycle(&displayed);

        assert_eq!(stale.title, "Login broken");
        assert_eq!(stale.status, TicketStatus::Closed);
        assert_eq!(stale.claimant_id, Some(ALICE));
        assert_eq!(stale.status_changed_at, at(9));
        assert_eq!(stale.close_reason.as_deref(), Some("duplicate"));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::from_str_opt("pending"), None);
    }

    #[test]
    fn test_ticket_id_jump_url() {
        let id = TicketId::new(20, 30);
        assert_eq!(id.jump_url(10), "https://discord.com/channels/10/20/30");
        assert_eq!(id.to_string(), "20/30");
    }
}
