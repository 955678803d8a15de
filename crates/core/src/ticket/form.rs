//! Ticket and close-reason forms.

use std::collections::HashMap;

use crate::platform::{Modal, TextInput, TextInputStyle};

use super::error::TicketError;
use super::types::TicketId;

pub const TICKET_FORM_ID: &str = "ticket_form";
pub const INPUT_TITLE: &str = "title";
pub const INPUT_DESCRIPTION: &str = "description";
pub const INPUT_IMPACTED: &str = "impacted";
pub const INPUT_NOTES: &str = "notes";

pub const CLOSE_REASON_PREFIX: &str = "close_reason";
pub const INPUT_REASON: &str = "reason";

pub const TITLE_MAX: usize = 45;
pub const DESCRIPTION_MAX: usize = 700;
pub const IMPACTED_MIN: usize = 2;
pub const IMPACTED_MAX: usize = 400;
pub const NOTES_MAX: usize = 400;
pub const REASON_MIN: usize = 2;
pub const REASON_MAX: usize = 500;

/// Validated content of a ticket form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSubmission {
    pub title: String,
    pub description: String,
    pub impacted_service: String,
    pub notes: Option<String>,
}

impl TicketSubmission {
    /// Build a submission from submitted form values keyed by input id.
    pub fn from_form(values: &HashMap<String, String>) -> Result<Self, TicketError> {
        let get = |key: &str| values.get(key).map(|v| v.trim()).unwrap_or("");

        let title = check_length("title", get(INPUT_TITLE), 1, TITLE_MAX)?;
        let description = check_length("description", get(INPUT_DESCRIPTION), 1, DESCRIPTION_MAX)?;
        let impacted_service =
            check_length("impacted service", get(INPUT_IMPACTED), IMPACTED_MIN, IMPACTED_MAX)?;
        let notes = match get(INPUT_NOTES) {
            "" => None,
            notes => Some(check_length("notes", notes, 0, NOTES_MAX)?),
        };

        Ok(Self {
            title,
            description,
            impacted_service,
            notes,
        })
    }
}

fn check_length(name: &str, value: &str, min: usize, max: usize) -> Result<String, TicketError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(TicketError::InvalidInput(if min > 0 && len == 0 {
            format!("{} is required", name)
        } else {
            format!("{} must be between {} and {} characters", name, min, max)
        }));
    }
    Ok(value.to_string())
}

/// Trimmed close reason, or an error if it is outside the allowed length.
pub fn validate_reason(reason: &str) -> Result<String, TicketError> {
    check_length("reason", reason.trim(), REASON_MIN, REASON_MAX)
}

fn input(
    custom_id: &str,
    label: &str,
    style: TextInputStyle,
    required: bool,
    min_length: Option<u16>,
    max_length: u16,
) -> TextInput {
    TextInput {
        custom_id: custom_id.to_string(),
        label: label.to_string(),
        style,
        required,
        min_length,
        max_length: Some(max_length),
        placeholder: None,
    }
}

/// Form opened by the `ticket` command.
pub fn ticket_form() -> Modal {
    let mut impacted = input(
        INPUT_IMPACTED,
        "What part of our/other service is impacted?",
        TextInputStyle::Short,
        true,
        Some(IMPACTED_MIN as u16),
        IMPACTED_MAX as u16,
    );
    impacted.placeholder = Some("website, bot, api, others...".to_string());

    Modal {
        custom_id: TICKET_FORM_ID.to_string(),
        title: "Bug report".to_string(),
        inputs: vec![
            input(
                INPUT_TITLE,
                "Please give a general title to your ticket:",
                TextInputStyle::Short,
                true,
                None,
                TITLE_MAX as u16,
            ),
            input(
                INPUT_DESCRIPTION,
                "Please describe what bug you've experienced:",
                TextInputStyle::Paragraph,
                true,
                None,
                DESCRIPTION_MAX as u16,
            ),
            impacted,
            input(
                INPUT_NOTES,
                "Notes for developers",
                TextInputStyle::Paragraph,
                false,
                None,
                NOTES_MAX as u16,
            ),
        ],
    }
}

/// Which ticket a close-reason form belongs to, carried in its custom id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseContext {
    pub ticket: TicketId,
}

impl CloseContext {
    pub fn new(ticket: TicketId) -> Self {
        Self { ticket }
    }

    pub fn custom_id(&self) -> String {
        format!(
            "{}:{}:{}",
            CLOSE_REASON_PREFIX, self.ticket.channel_id, self.ticket.message_id
        )
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.split(':');
        if parts.next()? != CLOSE_REASON_PREFIX {
            return None;
        }
        let channel_id = parts.next()?.parse().ok()?;
        let message_id = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(TicketId::new(channel_id, message_id)))
    }
}

/// Second step of closing a ticket.
pub fn close_reason_form(context: CloseContext) -> Modal {
    Modal {
        custom_id: context.custom_id(),
        title: "Reason".to_string(),
        inputs: vec![input(
            INPUT_REASON,
            "Enter the reason why the ticket was closed:",
            TextInputStyle::Short,
            true,
            Some(REASON_MIN as u16),
            REASON_MAX as u16,
        )],
    }
}
