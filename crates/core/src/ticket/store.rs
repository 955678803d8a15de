//! Ticket storage trait and types.

use thiserror::Error;

use super::types::{TicketId, TicketRecord, TicketStatus};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Ticket not found: {0}")]
    NotFound(TicketId),

    #[error("Ticket already stored: {0}")]
    AlreadyExists(TicketId),

    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for counting tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Structured ticket persistence, keyed by the displaying message.
pub trait TicketStore: Send + Sync {
    /// Store a new record. Fails if one already exists for the same id.
    fn insert(&self, record: &TicketRecord) -> Result<(), StoreError>;

    fn get(&self, id: &TicketId) -> Result<Option<TicketRecord>, StoreError>;

    /// Overwrite the lifecycle fields of an existing record.
    fn update(&self, record: &TicketRecord) -> Result<(), StoreError>;

    fn count(&self, filter: &TicketFilter) -> Result<i64, StoreError>;
}
