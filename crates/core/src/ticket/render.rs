//! Projection of a [`TicketRecord`] into a displayable message.

use chrono::{DateTime, Utc};

use crate::platform::{
    mention, Button, ButtonStyle, Embed, EmbedAuthor, EmbedField, OutgoingMessage,
};

use super::types::{TicketRecord, TicketStatus};

pub const TICKET_TITLE: &str = "Bug report";
pub const TICKET_DESCRIPTION: &str = "A bug report has been submitted";

pub const FIELD_SUBMISSION_INFO: &str = "Submission Info";
pub const FIELD_TITLE: &str = "Title";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_IMPACTED: &str = "Impacted Service(s)";
pub const FIELD_NOTES: &str = "Ticket Notes";
pub const FIELD_STATUS: &str = "Status";
pub const FIELD_CLOSE_REASON: &str = "Close Reason";

pub const NOTES_PLACEHOLDER: &str = "None";
pub const OPEN_STATUS_TEXT: &str = "Waiting to be claimed/closed";

pub const CLAIM_BUTTON: &str = "claim_btn";
pub const RESOLVED_BUTTON: &str = "resolved_btn";
pub const CLOSE_BUTTON: &str = "close_btn";

pub const COLOR_OPEN: u32 = 0xE74C3C;
pub const COLOR_CLAIMED: u32 = 0x3498DB;
pub const COLOR_RESOLVED: u32 = 0x2ECC71;
pub const COLOR_CLOSED: u32 = 0x9B59B6;

/// Relative timestamp markup (`<t:UNIX:R>`).
pub fn relative_timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

pub fn status_color(status: TicketStatus) -> u32 {
    match status {
        TicketStatus::Open => COLOR_OPEN,
        TicketStatus::Claimed => COLOR_CLAIMED,
        TicketStatus::Resolved => COLOR_RESOLVED,
        TicketStatus::Closed => COLOR_CLOSED,
    }
}

/// Text of the Status field.
pub fn status_text(record: &TicketRecord) -> String {
    let verb = match record.status {
        TicketStatus::Open => return OPEN_STATUS_TEXT.to_string(),
        TicketStatus::Claimed => "Claimed",
        TicketStatus::Resolved => "Resolved",
        TicketStatus::Closed => "Closed",
    };
    let by = record
        .claimant_id
        .map(mention)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} by {} at {}",
        verb,
        by,
        relative_timestamp(record.status_changed_at)
    )
}

/// Claim is live only while open; Resolved and Close only while claimed.
pub fn ticket_buttons(status: TicketStatus) -> Vec<Button> {
    vec![
        Button::new(CLAIM_BUTTON, "Claim", ButtonStyle::Primary)
            .disabled(status != TicketStatus::Open),
        Button::new(RESOLVED_BUTTON, "Resolved", ButtonStyle::Success)
            .disabled(status != TicketStatus::Claimed),
        Button::new(CLOSE_BUTTON, "Close", ButtonStyle::Danger)
            .disabled(status != TicketStatus::Claimed),
    ]
}

pub fn render_ticket(record: &TicketRecord, brand: &str) -> OutgoingMessage {
    let notes = record
        .notes
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(NOTES_PLACEHOLDER);

    let mut embed = Embed::new(TICKET_TITLE, TICKET_DESCRIPTION, status_color(record.status))
        .with_field(EmbedField::block(
            FIELD_SUBMISSION_INFO,
            format!(
                "Submitted by {} at {}",
                mention(record.submitter_id),
                relative_timestamp(record.created_at)
            ),
        ))
        .with_field(EmbedField::block(FIELD_TITLE, &record.title))
        .with_field(EmbedField::block(FIELD_DESCRIPTION, &record.description))
        .with_field(EmbedField::block(FIELD_IMPACTED, &record.impacted_service))
        .with_field(EmbedField::block(FIELD_NOTES, notes))
        .with_field(EmbedField::block(FIELD_STATUS, status_text(record)));

    if let Some(reason) = record.close_reason.as_deref() {
        embed = embed.with_field(EmbedField::block(FIELD_CLOSE_REASON, reason));
    }

    embed.timestamp = Some(record.created_at);
    embed.author = Some(EmbedAuthor {
        name: brand.to_string(),
        icon_url: None,
    });
    let embed = embed.with_footer(record.submitter_id.to_string());

    OutgoingMessage::embed(embed).with_buttons(ticket_buttons(record.status))
}
