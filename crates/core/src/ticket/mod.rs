//! Bug tickets: record, lifecycle, persistence and the desk running them.

mod desk;
mod error;
mod form;
mod locks;
mod parse;
mod render;
mod sqlite_store;
mod store;
mod types;

pub use desk::{DeskSettings, TicketDesk, TransitionOutcome, CREATED_REPLY};
pub use error::{TicketError, TicketWarning};
pub use form::{
    close_reason_form, ticket_form, validate_reason, CloseContext, TicketSubmission,
    CLOSE_REASON_PREFIX, INPUT_DESCRIPTION, INPUT_IMPACTED, INPUT_NOTES, INPUT_REASON,
    INPUT_TITLE, TICKET_FORM_ID,
};
pub use locks::TicketLocks;
pub use parse::{longest_digit_run, parse_status, parse_ticket};
pub use render::{
    render_ticket, status_text, ticket_buttons, CLAIM_BUTTON, CLOSE_BUTTON, RESOLVED_BUTTON,
};
pub use sqlite_store::SqliteTicketStore;
pub use store::{StoreError, TicketFilter, TicketStore};
pub use types::{TicketId, TicketRecord, TicketStatus, TransitionKind};
