//! Recovering a [`TicketRecord`] from a previously rendered message.
//!
//! Used for tickets whose message has no stored record. The Status field is
//! the only place the claimant appears, so the claimant id is taken to be
//! the longest run of decimal digits in that text (the first one on ties).
//! A Discord user id is always longer than the unix timestamp that follows
//! it, so this holds for every status text the desk renders.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::platform::{PostedMessage, UserId};

use super::error::TicketError;
use super::render::{
    FIELD_CLOSE_REASON, FIELD_DESCRIPTION, FIELD_IMPACTED, FIELD_NOTES, FIELD_STATUS,
    FIELD_SUBMISSION_INFO, FIELD_TITLE, NOTES_PLACEHOLDER,
};
use super::types::{TicketId, TicketRecord, TicketStatus};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<t:([0-9]+)(?::[a-zA-Z])?>").unwrap());

/// Longest contiguous run of decimal digits in `text`.
pub fn longest_digit_run(text: &str) -> Option<&str> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .fold(None, |best: Option<&str>, run| match best {
            Some(b) if b.len() >= run.len() => Some(b),
            _ => Some(run),
        })
}

/// First `<t:UNIX:...>` timestamp in `text`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = TIMESTAMP.captures(text)?.get(1)?.as_str().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Status and claimant encoded in a Status field.
pub fn parse_status(text: &str) -> Result<(TicketStatus, Option<UserId>), TicketError> {
    let text = text.trim_start();
    let status = if text.starts_with("Claimed by") {
        TicketStatus::Claimed
    } else if text.starts_with("Resolved by") {
        TicketStatus::Resolved
    } else if text.starts_with("Closed by") {
        TicketStatus::Closed
    } else {
        return Ok((TicketStatus::Open, None));
    };

    let claimant = longest_digit_run(text)
        .and_then(|run| run.parse::<UserId>().ok())
        .ok_or_else(|| TicketError::NotATicket(format!("no claimant in status '{}'", text)))?;

    Ok((status, Some(claimant)))
}

/// Rebuild a ticket record from its displaying message.
pub fn parse_ticket(message: &PostedMessage) -> Result<TicketRecord, TicketError> {
    let id = TicketId::new(message.channel_id, message.id);
    let not_a_ticket = |what: &str| TicketError::NotATicket(format!("{} ({})", id, what));

    let embed = message
        .first_embed()
        .ok_or_else(|| not_a_ticket("no embed"))?;

    let submitter_id: UserId = embed
        .footer
        .as_deref()
        .and_then(|footer| footer.trim().parse().ok())
        .ok_or_else(|| not_a_ticket("no submitter footer"))?;

    let field = |name: &str| {
        embed
            .field(name)
            .map(str::to_string)
            .ok_or_else(|| not_a_ticket(&format!("missing field '{}'", name)))
    };

    let status_field = field(FIELD_STATUS)?;
    let (status, claimant_id) = parse_status(&status_field)?;

    let created_at = embed
        .timestamp
        .or_else(|| embed.field(FIELD_SUBMISSION_INFO).and_then(parse_timestamp))
        .unwrap_or_else(Utc::now);
    let status_changed_at = match status {
        TicketStatus::Open => created_at,
        _ => parse_timestamp(&status_field).unwrap_or(created_at),
    };

    // Missing notes render as the placeholder, so notes that literally read
    // "None" cannot be told apart and come back as no notes.
    let notes = embed
        .field(FIELD_NOTES)
        .filter(|n| *n != NOTES_PLACEHOLDER && !n.trim().is_empty())
        .map(str::to_string);

    let close_reason = match status {
        TicketStatus::Closed => embed.field(FIELD_CLOSE_REASON).map(str::to_string),
        _ => None,
    };

    Ok(TicketRecord {
        id,
        title: field(FIELD_TITLE)?,
        description: field(FIELD_DESCRIPTION)?,
        impacted_service: field(FIELD_IMPACTED)?,
        notes,
        submitter_id,
        status,
        claimant_id,
        created_at,
        status_changed_at,
        close_reason,
    })
}
