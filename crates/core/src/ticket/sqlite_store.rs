//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::store::{StoreError, TicketFilter, TicketStore};
use super::types::{TicketId, TicketRecord, TicketStatus};

const COLUMNS: &str = "channel_id, message_id, title, description, impacted_service, notes, \
     submitter_id, status, claimant_id, created_at, status_changed_at, close_reason";

/// SQLite-backed ticket store.
///
/// Snowflake ids are stored as TEXT since they do not fit SQLite's signed
/// integers.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                channel_id TEXT NOT NULL,
                message_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                impacted_service TEXT NOT NULL,
                notes TEXT,
                submitter_id TEXT NOT NULL,
                status TEXT NOT NULL,
                claimant_id TEXT,
                created_at TEXT NOT NULL,
                status_changed_at TEXT NOT NULL,
                close_reason TEXT,
                PRIMARY KEY (channel_id, message_id)
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);
            "#,
        )
        .map_err(db_error)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        match filter.status {
            Some(status) => (
                "WHERE status = ?".to_string(),
                vec![Box::new(status.as_str()) as Box<dyn rusqlite::ToSql>],
            ),
            None => (String::new(), Vec::new()),
        }
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TicketRecord> {
        let status_str: String = row.get(7)?;
        let status = TicketStatus::from_str_opt(&status_str).ok_or_else(|| {
            conversion_error(7, format!("unknown status '{}'", status_str))
        })?;

        Ok(TicketRecord {
            id: TicketId::new(snowflake(row, 0)?, snowflake(row, 1)?),
            title: row.get(2)?,
            description: row.get(3)?,
            impacted_service: row.get(4)?,
            notes: row.get(5)?,
            submitter_id: snowflake(row, 6)?,
            status,
            claimant_id: row
                .get::<_, Option<String>>(8)?
                .map(|s| s.parse().map_err(|e| conversion_error(8, e)))
                .transpose()?,
            created_at: timestamp(row, 9)?,
            status_changed_at: timestamp(row, 10)?,
            close_reason: row.get(11)?,
        })
    }
}

fn db_error(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

fn snowflake(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<u64> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, record: &TicketRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let result = conn.execute(
            &format!(
                "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                COLUMNS
            ),
            params![
                record.id.channel_id.to_string(),
                record.id.message_id.to_string(),
                record.title,
                record.description,
                record.impacted_service,
                record.notes,
                record.submitter_id.to_string(),
                record.status.as_str(),
                record.claimant_id.map(|id| id.to_string()),
                record.created_at.to_rfc3339(),
                record.status_changed_at.to_rfc3339(),
                record.close_reason,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::AlreadyExists(record.id))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    fn get(&self, id: &TicketId) -> Result<Option<TicketRecord>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE channel_id = ? AND message_id = ?",
                COLUMNS
            ),
            params![id.channel_id.to_string(), id.message_id.to_string()],
            Self::row_to_record,
        )
        .optional()
        .map_err(db_error)
    }

    fn update(&self, record: &TicketRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let rows = conn
            .execute(
                "UPDATE tickets SET status = ?, claimant_id = ?, status_changed_at = ?, close_reason = ? \
                 WHERE channel_id = ? AND message_id = ?",
                params![
                    record.status.as_str(),
                    record.claimant_id.map(|id| id.to_string()),
                    record.status_changed_at.to_rfc3339(),
                    record.close_reason,
                    record.id.channel_id.to_string(),
                    record.id.message_id.to_string(),
                ],
            )
            .map_err(db_error)?;

        if rows == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db_error)
    }
}
