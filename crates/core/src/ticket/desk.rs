//! Ticket desk: executes ticket transitions and their side effects.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::notify::{Notification, Notifier};
use crate::platform::{Actor, ChannelId, ChatPlatform, GuildId, Modal};
use crate::tracking::TrackingIndex;

use super::error::{TicketError, TicketWarning};
use super::form::{close_reason_form, validate_reason, CloseContext, TicketSubmission};
use super::locks::TicketLocks;
use super::parse::parse_ticket;
use super::render::render_ticket;
use super::store::TicketStore;
use super::types::{TicketId, TicketRecord, TransitionKind};

/// Private reply once a ticket has been opened.
pub const CREATED_REPLY: &str = "Your feedback was sent to the developers!";

/// Where tickets are posted and how they are branded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskSettings {
    pub guild_id: GuildId,
    pub ticket_channel_id: ChannelId,
    pub brand: String,
}

/// A committed transition and the side effects that did not make it.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub record: TicketRecord,
    pub warnings: Vec<TicketWarning>,
}

/// Runs ticket transitions.
///
/// Every transition reloads the record (stored record reconciled with
/// the displayed message) under the ticket's lock, checks its
/// preconditions, and then edits the displayed message. That edit is the
/// commit point: store writes, tracking index updates and notifications
/// that fail afterwards are reported as warnings and never undo the
/// transition.
pub struct TicketDesk {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<dyn TicketStore>,
    tracking: Arc<TrackingIndex>,
    notifier: Arc<dyn Notifier>,
    locks: TicketLocks,
    settings: DeskSettings,
}

impl TicketDesk {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        store: Arc<dyn TicketStore>,
        tracking: Arc<TrackingIndex>,
        notifier: Arc<dyn Notifier>,
        settings: DeskSettings,
    ) -> Self {
        Self {
            platform,
            store,
            tracking,
            notifier,
            locks: TicketLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    pub fn platform(&self) -> &Arc<dyn ChatPlatform> {
        &self.platform
    }

    /// Post a new ticket, store it and add it to the tracking index.
    pub async fn open_ticket(
        &self,
        actor: &Actor,
        submission: TicketSubmission,
    ) -> Result<TransitionOutcome, TicketError> {
        let mut record = TicketRecord::open(submission, actor.id, Utc::now());

        let posted = self
            .platform
            .send_message(
                self.settings.ticket_channel_id,
                render_ticket(&record, &self.settings.brand),
            )
            .await?;
        record.id = TicketId::new(posted.channel_id, posted.id);

        let mut warnings = Vec::new();
        if let Err(e) = self.store.insert(&record) {
            warnings.push(TicketWarning::StoreWriteFailed(e.to_string()));
        }
        self.track(&record, &mut warnings).await;

        metrics::TICKETS_CREATED.inc();
        info!(
            ticket = %record.id,
            submitter_id = actor.id,
            title = %record.title,
            "Ticket opened"
        );
        Ok(self.report(record, warnings))
    }

    /// Current record of a ticket.
    ///
    /// The displayed message is fetched every time since its last edit is
    /// the commit point. A stored record that lags behind the message (its
    /// write failed after a commit) takes over the displayed lifecycle and
    /// is written again. Tickets without a stored record are parsed from
    /// their message and the result is written back to the store.
    pub async fn load(&self, id: TicketId) -> Result<TicketRecord, TicketError> {
        let stored = self.store.get(&id)?;

        let message = self
            .platform
            .fetch_message(id.channel_id, id.message_id)
            .await?;
        if message.author_id != self.platform.bot_user_id() {
            return Err(TicketError::NotATicket(id.to_string()));
        }
        let displayed = parse_ticket(&message);

        match (stored, displayed) {
            (Some(mut stored), Ok(displayed))
                if displayed.status.rank() > stored.status.rank() =>
            {
                warn!(
                    ticket = %id,
                    stored = %stored.status,
                    displayed = %displayed.status,
                    "Stored ticket record is behind its message"
                );
                stored.adopt_lifecycle(&displayed);
                if let Err(e) = self.store.update(&stored) {
                    warn!(ticket = %id, error = %e, "Failed to repair ticket record");
                }
                Ok(stored)
            }
            (Some(stored), Ok(_)) => Ok(stored),
            (Some(stored), Err(e)) => {
                debug!(ticket = %id, error = %e, "Displayed ticket unreadable, using stored record");
                Ok(stored)
            }
            (None, Ok(displayed)) => {
                match self.store.insert(&displayed) {
                    Ok(()) => debug!(ticket = %id, "Backfilled ticket record from message"),
                    Err(e) => warn!(ticket = %id, error = %e, "Failed to backfill ticket record"),
                }
                Ok(displayed)
            }
            (None, Err(e)) => Err(e),
        }
    }

    pub async fn claim(
        &self,
        actor: &Actor,
        id: TicketId,
    ) -> Result<TransitionOutcome, TicketError> {
        let _guard = self.locks.acquire(id).await;
        let mut record = self.load(id).await?;
        self.check(record.claim(actor.id, Utc::now()))?;

        self.publish(&record).await?;

        let mut warnings = Vec::new();
        self.persist(&record, &mut warnings);
        self.track(&record, &mut warnings).await;

        Ok(self.committed(TransitionKind::Claim, actor, record, warnings))
    }

    pub async fn resolve(
        &self,
        actor: &Actor,
        id: TicketId,
    ) -> Result<TransitionOutcome, TicketError> {
        let _guard = self.locks.acquire(id).await;
        let mut record = self.load(id).await?;
        let now = Utc::now();
        self.check(record.resolve(actor.id, now))?;

        let notification = Notification::Resolved {
            title: record.title.clone(),
            at: now,
        };
        self.finish(TransitionKind::Resolve, actor, record, notification)
            .await
    }

    /// First step of closing: check the preconditions and hand back the
    /// reason form bound to this ticket.
    pub async fn begin_close(&self, actor: &Actor, id: TicketId) -> Result<Modal, TicketError> {
        let record = {
            let _guard = self.locks.acquire(id).await;
            self.load(id).await?
        };
        self.check(record.ensure_can_finish(actor.id, TransitionKind::Close))?;
        Ok(close_reason_form(CloseContext::new(id)))
    }

    /// Second step of closing, run with the submitted reason. Preconditions
    /// are checked again since the ticket may have moved in between.
    pub async fn close(
        &self,
        actor: &Actor,
        id: TicketId,
        reason: &str,
    ) -> Result<TransitionOutcome, TicketError> {
        let reason = self.check(validate_reason(reason))?;

        let _guard = self.locks.acquire(id).await;
        let mut record = self.load(id).await?;
        let now = Utc::now();
        self.check(record.close(actor.id, &reason, now))?;

        let notification = Notification::Closed {
            title: record.title.clone(),
            reason,
            at: now,
        };
        self.finish(TransitionKind::Close, actor, record, notification)
            .await
    }

    async fn finish(
        &self,
        kind: TransitionKind,
        actor: &Actor,
        record: TicketRecord,
        notification: Notification,
    ) -> Result<TransitionOutcome, TicketError> {
        self.publish(&record).await?;

        let mut warnings = Vec::new();
        self.persist(&record, &mut warnings);

        let link = record.reference_link(self.settings.guild_id);
        if let Err(e) = self.tracking.remove(&record.title, &link).await {
            warnings.push(TicketWarning::TrackingIndexUnavailable(e.to_string()));
        }

        if let Err(e) = self
            .notifier
            .notify(record.submitter_id, &notification)
            .await
        {
            warnings.push(TicketWarning::NotificationFailed(e.to_string()));
        }

        Ok(self.committed(kind, actor, record, warnings))
    }

    /// Rewrite the displayed message. This is the commit point.
    async fn publish(&self, record: &TicketRecord) -> Result<(), TicketError> {
        self.platform
            .edit_message(
                record.id.channel_id,
                record.id.message_id,
                render_ticket(record, &self.settings.brand),
            )
            .await?;
        Ok(())
    }

    fn persist(&self, record: &TicketRecord, warnings: &mut Vec<TicketWarning>) {
        if let Err(e) = self.store.update(record) {
            warnings.push(TicketWarning::StoreWriteFailed(e.to_string()));
        }
    }

    async fn track(&self, record: &TicketRecord, warnings: &mut Vec<TicketWarning>) {
        let link = record.reference_link(self.settings.guild_id);
        if let Err(e) = self.tracking.append(&record.title, &link).await {
            warnings.push(TicketWarning::TrackingIndexUnavailable(e.to_string()));
        }
    }

    fn check<T>(&self, result: Result<T, TicketError>) -> Result<T, TicketError> {
        if let Err(e) = &result {
            metrics::TRANSITION_REJECTIONS
                .with_label_values(&[e.reason()])
                .inc();
            debug!(error = %e, "Ticket transition rejected");
        }
        result
    }

    fn committed(
        &self,
        kind: TransitionKind,
        actor: &Actor,
        record: TicketRecord,
        warnings: Vec<TicketWarning>,
    ) -> TransitionOutcome {
        metrics::TICKET_TRANSITIONS
            .with_label_values(&[kind.as_str()])
            .inc();
        info!(
            ticket = %record.id,
            actor_id = actor.id,
            transition = kind.as_str(),
            status = %record.status,
            "Ticket transition committed"
        );
        self.report(record, warnings)
    }

    fn report(&self, record: TicketRecord, warnings: Vec<TicketWarning>) -> TransitionOutcome {
        for warning in &warnings {
            metrics::SIDE_EFFECT_WARNINGS
                .with_label_values(&[warning.kind()])
                .inc();
            warn!(ticket = %record.id, "{}", warning);
        }
        TransitionOutcome { record, warnings }
    }
}
